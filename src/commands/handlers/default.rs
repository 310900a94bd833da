//! Fallback for unknown commands
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::TextCommand;
use crate::commands::registry::DEFAULT_COMMAND;
use crate::platform::IncomingMessage;

/// Runs whenever the command word is missing or unknown
pub struct DefaultCommand;

#[async_trait]
impl TextCommand for DefaultCommand {
    fn id(&self) -> &'static str {
        DEFAULT_COMMAND
    }

    fn summary(&self) -> &'static str {
        "Fallback command for invalid commands"
    }

    async fn execute(
        &self,
        ctx: Arc<CommandContext>,
        msg: &IncomingMessage,
        _args: &str,
    ) -> Result<()> {
        let text = format!(
            "That is not a valid command. For a list of available commands use `{} help`",
            ctx.prefix()
        );
        ctx.reply(msg, &text).await?;
        Ok(())
    }
}
