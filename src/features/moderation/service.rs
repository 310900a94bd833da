//! Mute lifecycle
//!
//! A mute is two phases: [`Moderation::begin_mute`] persists the expiry and
//! mutes the member, [`Moderation::expire`] unmutes and clears the record. The
//! record is only cleared once the platform confirms the unmute, so a failed
//! expiry is retried by [`Moderation::reconcile`] on the member's next voice
//! join or by [`Moderation::resume_pending`] after a restart.
//!
//! Overlapping mutes of one member are not prevented. Each lifecycle is counted
//! in-flight and a warning is logged when they overlap; record writes are plain
//! read-modify-write with no locking.

use anyhow::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::record::{ModerationRecord, MuteState};
use super::store::RecordStore;
use crate::platform::{ChatPlatform, MemberRef};

type MemberKey = (u64, u64);

/// Longest mute that will be scheduled, ten years
pub const MAX_MUTE_SECS: u64 = 10 * 31_536_000;

/// What a voice-join reconciliation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing persisted, nothing to do
    NotMuted,
    /// The mute had expired and was lifted
    Unmuted,
    /// The member should still be muted and was muted again for the remaining seconds
    Remuted { remaining_secs: u64 },
    /// Persisted mute is active and the platform agrees
    StillMuted,
}

pub struct Moderation {
    pub(super) platform: Arc<dyn ChatPlatform>,
    pub(super) store: Arc<dyn RecordStore>,
    in_flight: DashMap<MemberKey, usize>,
    /// Guilds whose pending mutes were already scheduled by this process
    pub(super) resumed_guilds: DashMap<u64, ()>,
}

impl Moderation {
    pub fn new(platform: Arc<dyn ChatPlatform>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            platform,
            store,
            in_flight: DashMap::new(),
            resumed_guilds: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// The member's record, or a fresh unmuted one when none exists yet
    pub fn record_for(&self, member: &MemberRef) -> Result<ModerationRecord> {
        Ok(self
            .store
            .read(member.guild_id, member.user_id)?
            .unwrap_or_else(|| ModerationRecord::for_member(member)))
    }

    pub fn mute_state(&self, member: &MemberRef) -> Result<MuteState> {
        Ok(self.record_for(member)?.mute_state())
    }

    pub fn is_muted(&self, member: &MemberRef) -> Result<bool> {
        Ok(self.record_for(member)?.is_muted())
    }

    /// Number of mute lifecycles currently running for a member
    pub fn in_flight_mutes(&self, member: &MemberRef) -> usize {
        self.in_flight
            .get(&(member.guild_id, member.user_id))
            .map(|count| *count)
            .unwrap_or(0)
    }

    /// Mute a member for `secs` seconds, then lift the mute.
    ///
    /// Resolves once the mute has been lifted (or the lift failed and was left
    /// for reconciliation).
    pub async fn mute(&self, member: &MemberRef, secs: u64) -> Result<()> {
        let secs = secs.min(MAX_MUTE_SECS);
        let _in_flight = InFlight::enter(&self.in_flight, member);
        self.begin_mute(member, secs).await?;
        sleep(Duration::from_secs(secs)).await;
        self.expire(member).await?;
        Ok(())
    }

    /// Persist the expiry and apply the platform mute
    pub async fn begin_mute(&self, member: &MemberRef, secs: u64) -> Result<DateTime<Utc>> {
        info!("{} was muted for {secs} seconds.", member.display_name);
        let until = Utc::now() + ChronoDuration::seconds(secs.min(MAX_MUTE_SECS) as i64);

        let mut record = self.record_for(member)?;
        record.muted = until;
        self.store.write(member.guild_id, member.user_id, &record)?;

        self.apply_mute(member, true).await;
        Ok(until)
    }

    /// Lift a mute whose time is up.
    ///
    /// Returns whether the platform unmute succeeded; the record is only
    /// cleared when it did.
    pub async fn expire(&self, member: &MemberRef) -> Result<bool> {
        let unmuted = self.apply_mute(member, false).await;
        if unmuted {
            let mut record = self.record_for(member)?;
            record.clear_mute();
            self.store.write(member.guild_id, member.user_id, &record)?;
        } else {
            warn!(
                "Unmute of {} failed; keeping the pending mute for reconciliation",
                member.display_name
            );
        }
        Ok(unmuted)
    }

    /// Lift a mute right away, clearing the record whatever the platform says
    pub async fn unmute(&self, member: &MemberRef) -> Result<()> {
        info!("{} was unmuted.", member.display_name);
        if !self.apply_mute(member, false).await {
            warn!(
                "Platform unmute of {} failed; clearing the record anyway",
                member.display_name
            );
        }
        let mut record = self.record_for(member)?;
        record.clear_mute();
        self.store.write(member.guild_id, member.user_id, &record)
    }

    /// Bring the platform in line with the persisted mute when a member joins voice
    pub async fn reconcile(&self, member: &MemberRef, platform_muted: bool) -> Result<Reconciliation> {
        let MuteState::Muted { until } = self.mute_state(member)? else {
            return Ok(Reconciliation::NotMuted);
        };

        let now = Utc::now();
        if until <= now {
            self.unmute(member).await?;
            return Ok(Reconciliation::Unmuted);
        }
        if platform_muted {
            return Ok(Reconciliation::StillMuted);
        }

        let remaining_secs = remaining_secs(until, now);
        info!(
            "{} rejoined voice while still muted; muting again for {remaining_secs}s",
            member.display_name
        );
        self.mute(member, remaining_secs).await?;
        Ok(Reconciliation::Remuted { remaining_secs })
    }

    /// Schedule the expiry of every pending mute in a guild.
    ///
    /// Used at startup so mutes that were running when the process stopped
    /// still get lifted. Runs once per guild; later calls (gateway
    /// reconnects) schedule nothing. Returns how many expiries were scheduled.
    pub fn resume_pending(self: &Arc<Self>, guild_id: u64) -> Result<usize> {
        if self.resumed_guilds.insert(guild_id, ()).is_some() {
            debug!("Pending mutes of guild {guild_id} already resumed");
            return Ok(0);
        }
        let records = match self.store.list(guild_id) {
            Ok(records) => records,
            Err(e) => {
                self.resumed_guilds.remove(&guild_id);
                return Err(e);
            }
        };
        let pending: Vec<ModerationRecord> =
            records.into_iter().filter(ModerationRecord::is_muted).collect();

        for record in &pending {
            let member = record.member_ref(guild_id);
            let wait = remaining_secs(record.muted, Utc::now());
            let moderation = Arc::clone(self);
            info!(
                "Resuming pending mute of {} in guild {guild_id}, lifting in {wait}s",
                member.display_name
            );
            tokio::spawn(async move {
                let _in_flight = InFlight::enter(&moderation.in_flight, &member);
                sleep(Duration::from_secs(wait)).await;
                if let Err(e) = moderation.expire(&member).await {
                    warn!("Failed to lift resumed mute of {}: {e}", member.display_name);
                }
            });
        }
        Ok(pending.len())
    }

    /// Apply a platform mute or unmute, reporting success instead of failing
    async fn apply_mute(&self, member: &MemberRef, muted: bool) -> bool {
        match self.platform.set_voice_mute(member, muted).await {
            Ok(()) => true,
            Err(e) => {
                info!(
                    "Could not {} {}: {e}",
                    if muted { "mute" } else { "unmute" },
                    member.display_name
                );
                false
            }
        }
    }
}

/// Whole seconds from `now` until `until`, rounded up, zero when already past
fn remaining_secs(until: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = (until - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis as u64).div_ceil(1_000)
    }
}

/// Counts one running mute lifecycle for as long as it is alive
struct InFlight<'a> {
    map: &'a DashMap<MemberKey, usize>,
    key: MemberKey,
}

impl<'a> InFlight<'a> {
    fn enter(map: &'a DashMap<MemberKey, usize>, member: &MemberRef) -> Self {
        let key = (member.guild_id, member.user_id);
        let count = {
            let mut entry = map.entry(key).or_insert(0);
            *entry += 1;
            *entry
        };
        if count > 1 {
            warn!(
                "{count} overlapping mutes for {}; the first to expire lifts the mute",
                member.display_name
            );
        }
        Self { map, key }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(mut count) = self.map.get_mut(&self.key) {
            *count = count.saturating_sub(1);
        }
        self.map.remove_if(&self.key, |_, count| *count == 0);
    }
}
