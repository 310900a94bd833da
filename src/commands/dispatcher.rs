//! Prefix handling and command dispatch
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use log::{debug, error, info};
use std::sync::Arc;
use uuid::Uuid;

use super::context::CommandContext;
use super::handler::split_token;
use super::handlers::create_all_commands;
use super::registry::{CommandRegistry, DEFAULT_COMMAND};
use crate::platform::IncomingMessage;

const APOLOGY: &str = "Sorry, something went wrong while running that command.";

/// What the dispatcher did with a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Not addressed to the bot
    Ignored,
    /// Only the prefix was sent; a help hint was posted
    PrefixOnly,
    /// The named command ran (the default command for unknown ids)
    Ran(&'static str),
    /// The command failed and an apology was posted
    Failed(&'static str),
}

pub struct Dispatcher {
    registry: CommandRegistry,
    ctx: Arc<CommandContext>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<CommandContext>) -> Self {
        let registry = create_all_commands(ctx.prefix());
        Self { registry, ctx }
    }

    pub fn with_registry(ctx: Arc<CommandContext>, registry: CommandRegistry) -> Self {
        Self { registry, ctx }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Route one incoming message to its command.
    ///
    /// Never fails: handler errors are logged and answered with an apology.
    pub async fn dispatch(&self, msg: &IncomingMessage) -> Dispatch {
        let prefix = self.ctx.prefix();
        if msg.author.bot || !msg.content.starts_with(prefix) {
            return Dispatch::Ignored;
        }

        let request_id = Uuid::new_v4();
        info!(
            "[{request_id}] 📥 Command received | User: {} | Channel: {} | Guild: {:?} | Content: '{}'",
            msg.author.id, msg.channel_id, msg.guild_id, msg.content
        );

        if msg.content.trim() == prefix {
            let hint = format!("For help, please type `{prefix} help`");
            if let Err(e) = self.ctx.reply(msg, &hint).await {
                error!("[{request_id}] ❌ Failed to send help hint: {e}");
            }
            return Dispatch::PrefixOnly;
        }

        let (_, rest) = split_token(&msg.content);
        let (id, args) = split_token(rest);
        let (handler, args) = match self.registry.get(id) {
            Some(handler) => (handler, args),
            None => {
                error!("[{request_id}] ❓ Unknown command '{id}', running {DEFAULT_COMMAND}");
                match self.registry.get(DEFAULT_COMMAND) {
                    Some(handler) => (handler, rest),
                    None => return Dispatch::Ignored,
                }
            }
        };

        let command = handler.id();
        debug!("[{request_id}] 🎯 Running '{command}' with args '{args}'");
        match handler.execute(Arc::clone(&self.ctx), msg, args).await {
            Ok(()) => {
                info!("[{request_id}] ✅ Command '{command}' completed");
                Dispatch::Ran(command)
            }
            Err(e) => {
                error!("[{request_id}] ❌ Command '{command}' failed: {e:#}");
                if let Err(e) = self.ctx.reply(msg, APOLOGY).await {
                    error!("[{request_id}] ❌ Failed to send apology: {e}");
                }
                Dispatch::Failed(command)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::testing::test_bed;
    use crate::platform::mock::{member, message, GUILD};

    #[tokio::test]
    async fn test_non_prefixed_and_bot_messages_are_ignored() {
        let bed = test_bed();
        let dispatcher = Dispatcher::new(bed.ctx.clone());

        assert_eq!(dispatcher.dispatch(&message("hello there", vec![])).await, Dispatch::Ignored);

        let mut from_bot = message("!cc help", vec![]);
        from_bot.author.bot = true;
        assert_eq!(dispatcher.dispatch(&from_bot).await, Dispatch::Ignored);
        assert!(bed.platform.sent_texts().is_empty());
    }

    #[tokio::test]
    async fn test_prefix_only_gets_help_hint() {
        let bed = test_bed();
        let dispatcher = Dispatcher::new(bed.ctx.clone());

        assert_eq!(dispatcher.dispatch(&message("!cc ", vec![])).await, Dispatch::PrefixOnly);
        assert_eq!(
            bed.platform.last_sent().unwrap(),
            "For help, please type `!cc help`"
        );
    }

    #[tokio::test]
    async fn test_unknown_and_miscased_commands_fall_back_to_default() {
        let bed = test_bed();
        let dispatcher = Dispatcher::new(bed.ctx.clone());

        assert_eq!(
            dispatcher.dispatch(&message("!cc dance now", vec![])).await,
            Dispatch::Ran("default")
        );
        assert_eq!(
            dispatcher.dispatch(&message("!cc HELP", vec![])).await,
            Dispatch::Ran("default")
        );
        assert!(bed
            .platform
            .last_sent()
            .unwrap()
            .starts_with("That is not a valid command."));
    }

    #[tokio::test]
    async fn test_known_command_runs_with_its_arguments() {
        let bed = test_bed();
        bed.platform.set_members(GUILD, vec![member(1, "ann")]);
        let dispatcher = Dispatcher::new(bed.ctx.clone());

        assert_eq!(
            dispatcher.dispatch(&message("!cc users reload", vec![])).await,
            Dispatch::Ran("users")
        );
        assert_eq!(bed.platform.last_sent().unwrap(), "Reloaded 1 member records.");
    }

    struct FailingCommand;

    #[async_trait::async_trait]
    impl crate::commands::handler::TextCommand for FailingCommand {
        fn id(&self) -> &'static str {
            "boom"
        }

        fn summary(&self) -> &'static str {
            "Always fails"
        }

        async fn execute(
            &self,
            _ctx: Arc<CommandContext>,
            _msg: &IncomingMessage,
            _args: &str,
        ) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk on fire"))
        }
    }

    #[tokio::test]
    async fn test_handler_error_is_answered_with_apology() {
        let bed = test_bed();
        let mut registry = create_all_commands("!cc");
        registry.register(Arc::new(FailingCommand));
        let dispatcher = Dispatcher::with_registry(bed.ctx.clone(), registry);

        assert_eq!(
            dispatcher.dispatch(&message("!cc boom", vec![])).await,
            Dispatch::Failed("boom")
        );
        assert_eq!(bed.platform.last_sent().unwrap(), APOLOGY);
    }

    #[tokio::test]
    async fn test_send_failure_is_logged_not_raised() {
        let bed = test_bed();
        *bed.platform.fail_send.lock().unwrap() = true;
        let dispatcher = Dispatcher::new(bed.ctx.clone());

        assert_eq!(
            dispatcher.dispatch(&message("!cc dance", vec![])).await,
            Dispatch::Failed("default")
        );
        assert_eq!(dispatcher.dispatch(&message("!cc", vec![])).await, Dispatch::PrefixOnly);
        assert!(bed.platform.sent_texts().is_empty());
    }
}
