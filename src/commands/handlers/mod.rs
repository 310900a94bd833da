//! Per-command handler implementations
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 3.0.0: Text command set: default, help, users, vote, av
//! - 1.0.0: Initial extraction from monolithic command handling

pub mod av;
pub mod default;
pub mod help;
pub mod users;
pub mod vote;

use std::sync::Arc;

use super::registry::CommandRegistry;

/// Build the top-level registry with every command
///
/// Help is registered last so its listing can be taken from the commands
/// registered before it; its own line comes first.
pub fn create_all_commands(prefix: &str) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    registry.register(Arc::new(default::DefaultCommand));
    registry.register(Arc::new(users::UsersCommand));
    registry.register(Arc::new(vote::VoteCommand::new()));
    registry.register(Arc::new(av::AvCommand::new()));

    let mut lines = vec![format!("{prefix} help: {}", help::HELP_SUMMARY)];
    lines.extend(registry.help_lines(prefix));
    registry.register(Arc::new(help::HelpCommand::new(lines)));
    registry
}
