//! Help listing
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::commands::context::CommandContext;
use crate::commands::handler::TextCommand;
use crate::platform::IncomingMessage;

pub const HELP_SUMMARY: &str = "List available commands";

const HELP_HEADER: &str = "Possible commands are listed below.\n\
For more information on each command please enter the command\n\n";

/// Lists every command; the lines are fixed when the registry is built
pub struct HelpCommand {
    lines: Vec<String>,
}

impl HelpCommand {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn text(&self) -> String {
        let mut text = String::from(HELP_HEADER);
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

#[async_trait]
impl TextCommand for HelpCommand {
    fn id(&self) -> &'static str {
        "help"
    }

    fn summary(&self) -> &'static str {
        HELP_SUMMARY
    }

    async fn execute(
        &self,
        ctx: Arc<CommandContext>,
        msg: &IncomingMessage,
        _args: &str,
    ) -> Result<()> {
        ctx.reply(msg, &self.text()).await?;
        Ok(())
    }
}
