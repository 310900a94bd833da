//! Per-member moderation record

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::MemberRef;

/// Unix timestamp of 2020-01-01T00:00:00Z, the "not active" placeholder
const NOT_ACTIVE_TIMESTAMP: i64 = 1_577_836_800;

/// Timestamp stored in place of a mute or deafen expiry when none is active
pub fn not_active() -> DateTime<Utc> {
    Utc.timestamp_opt(NOT_ACTIVE_TIMESTAMP, 0)
        .single()
        .unwrap_or_default()
}

/// Whether a member is muted according to their record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuteState {
    Unmuted,
    /// Muted until the given time; the pending unmute is still owed after it passes
    Muted { until: DateTime<Utc> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationRecord {
    pub name: String,
    pub uid: u64,
    pub muted: DateTime<Utc>,
    pub deafened: DateTime<Utc>,
}

impl ModerationRecord {
    pub fn new(name: impl Into<String>, uid: u64) -> Self {
        Self {
            name: name.into(),
            uid,
            muted: not_active(),
            deafened: not_active(),
        }
    }

    pub fn for_member(member: &MemberRef) -> Self {
        Self::new(member.name.clone(), member.user_id)
    }

    pub fn is_muted(&self) -> bool {
        self.muted != not_active()
    }

    pub fn is_deafened(&self) -> bool {
        self.deafened != not_active()
    }

    pub fn mute_state(&self) -> MuteState {
        if self.is_muted() {
            MuteState::Muted { until: self.muted }
        } else {
            MuteState::Unmuted
        }
    }

    pub fn clear_mute(&mut self) {
        self.muted = not_active();
    }

    /// Member handle rebuilt from the record, for acting on members not in hand
    pub fn member_ref(&self, guild_id: u64) -> MemberRef {
        MemberRef {
            guild_id,
            user_id: self.uid,
            name: self.name.clone(),
            display_name: self.name.clone(),
        }
    }
}
