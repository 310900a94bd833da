//! Guild member roster sync
//!
//! Keeps one moderation record per guild member on disk.

use anyhow::Result;
use log::info;

use super::record::ModerationRecord;
use super::service::Moderation;
use crate::platform::MemberRef;

impl Moderation {
    /// Rewrite a fresh record for every member of a guild.
    ///
    /// Clears any persisted mute or deafen. Returns the number of records written.
    pub async fn reload_guild(&self, guild_id: u64) -> Result<usize> {
        let members = self.platform.guild_members(guild_id).await?;
        for member in &members {
            self.store
                .write(guild_id, member.user_id, &ModerationRecord::for_member(member))?;
        }
        info!("Reloaded {} member records for guild {guild_id}", members.len());
        Ok(members.len())
    }

    /// Create records only for members that have none, e.g. after joining while the bot was offline.
    ///
    /// Returns the number of records created.
    pub async fn safe_reload_guild(&self, guild_id: u64) -> Result<usize> {
        let members = self.platform.guild_members(guild_id).await?;
        let mut created = 0;
        for member in &members {
            if self.store.read(guild_id, member.user_id)?.is_none() {
                self.add_member(member)?;
                created += 1;
            }
        }
        info!("Safe reload of guild {guild_id} created {created} member records");
        Ok(created)
    }

    /// Write a fresh record for a member who just joined
    pub fn add_member(&self, member: &MemberRef) -> Result<()> {
        self.store.write(
            member.guild_id,
            member.user_id,
            &ModerationRecord::for_member(member),
        )
    }

    /// Forget every record of a guild the bot was removed from
    pub fn remove_guild(&self, guild_id: u64) -> Result<()> {
        info!("Removing member records for guild {guild_id}");
        self.resumed_guilds.remove(&guild_id);
        self.store.delete_guild(guild_id)
    }
}
