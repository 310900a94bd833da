//! Text command handler trait
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Prefixed text commands with an argument tail replace slash interactions
//! - 1.0.0: Initial implementation for modular command handling

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::context::CommandContext;
use crate::platform::IncomingMessage;

/// Trait for text command handlers
///
/// Each command handler implements this trait and is registered with a
/// [`CommandRegistry`](super::registry::CommandRegistry) under its id.
/// Commands with sub-commands own a child registry of their own.
///
/// # Example
///
/// ```ignore
/// pub struct PingCommand;
///
/// #[async_trait]
/// impl TextCommand for PingCommand {
///     fn id(&self) -> &'static str {
///         "ping"
///     }
///
///     fn summary(&self) -> &'static str {
///         "Check that the bot is alive"
///     }
///
///     async fn execute(
///         &self,
///         ctx: Arc<CommandContext>,
///         msg: &IncomingMessage,
///         _args: &str,
///     ) -> Result<()> {
///         ctx.reply(msg, "pong").await
///     }
/// }
/// ```
#[async_trait]
pub trait TextCommand: Send + Sync {
    /// Word that selects this command after the prefix (or after the parent command)
    fn id(&self) -> &'static str;

    /// One line shown by the help command
    fn summary(&self) -> &'static str;

    /// Run the command
    ///
    /// # Arguments
    ///
    /// * `ctx` - Shared services: config, platform, moderation and knowledge
    /// * `msg` - The message that triggered the command
    /// * `args` - Everything after this command's id, leading whitespace removed
    async fn execute(
        &self,
        ctx: Arc<CommandContext>,
        msg: &IncomingMessage,
        args: &str,
    ) -> Result<()>;
}

/// Split off the first whitespace-delimited token.
///
/// Returns the token and the rest with leading whitespace removed; both are
/// empty for blank input.
pub fn split_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim_start()),
        None => (text, ""),
    }
}
