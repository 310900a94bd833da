//! Member record maintenance
//!
//! Handles: users reload, users reload safe
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::TextCommand;
use crate::platform::IncomingMessage;

pub struct UsersCommand;

#[async_trait]
impl TextCommand for UsersCommand {
    fn id(&self) -> &'static str {
        "users"
    }

    fn summary(&self) -> &'static str {
        "Rebuild the member records of this server, unmuting everyone. \
         `reload safe` only adds members that have no record yet"
    }

    async fn execute(
        &self,
        ctx: Arc<CommandContext>,
        msg: &IncomingMessage,
        args: &str,
    ) -> Result<()> {
        let Some(guild_id) = msg.guild_id else {
            ctx.reply(msg, "This is not a valid command to run outside a server text channel.")
                .await?;
            return Ok(());
        };

        let words: Vec<&str> = args.split_whitespace().collect();
        let text = match words.as_slice() {
            ["reload"] => {
                let count = ctx.moderation.reload_guild(guild_id).await?;
                info!("{} reloaded member records of guild {guild_id}", msg.author.name);
                format!("Reloaded {count} member records.")
            }
            ["reload", "safe"] => {
                let count = ctx.moderation.safe_reload_guild(guild_id).await?;
                format!("Created {count} missing member records.")
            }
            _ => format!(
                "Usage: `{0} users reload` or `{0} users reload safe`",
                ctx.prefix()
            ),
        };
        ctx.reply(msg, &text).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::testing::test_bed;
    use crate::features::moderation::ModerationRecord;
    use crate::platform::mock::{member, message, GUILD};
    use crate::platform::ChannelKind;
    use chrono::Utc;

    #[tokio::test]
    async fn test_reload_and_safe_reload() {
        let bed = test_bed();
        bed.platform
            .set_members(GUILD, vec![member(1, "ann"), member(2, "ben")]);
        let mut muted = ModerationRecord::new("ann", 1);
        muted.muted = Utc::now();
        bed.ctx.moderation.store().write(GUILD, 1, &muted).unwrap();

        let msg = message("!cc users reload safe", vec![]);
        UsersCommand.execute(bed.ctx.clone(), &msg, "reload safe").await.unwrap();
        assert_eq!(bed.platform.last_sent().unwrap(), "Created 1 missing member records.");
        assert!(bed.ctx.moderation.store().read(GUILD, 1).unwrap().unwrap().is_muted());

        UsersCommand.execute(bed.ctx.clone(), &msg, "reload").await.unwrap();
        assert_eq!(bed.platform.last_sent().unwrap(), "Reloaded 2 member records.");
        assert!(!bed.ctx.moderation.store().read(GUILD, 1).unwrap().unwrap().is_muted());
    }

    #[tokio::test]
    async fn test_usage_and_direct_messages() {
        let bed = test_bed();
        let msg = message("!cc users", vec![]);
        UsersCommand.execute(bed.ctx.clone(), &msg, "").await.unwrap();
        assert!(bed.platform.last_sent().unwrap().starts_with("Usage:"));

        let mut dm = message("!cc users reload", vec![]);
        dm.guild_id = None;
        dm.channel_kind = ChannelKind::Direct;
        UsersCommand.execute(bed.ctx.clone(), &dm, "reload").await.unwrap();
        assert_eq!(
            bed.platform.last_sent().unwrap(),
            "This is not a valid command to run outside a server text channel."
        );
    }
}
