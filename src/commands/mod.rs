//! # Command System
//!
//! Prefixed text commands: `<prefix> <command> [<args>]`.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Text commands with nested sub-command registries and a dispatcher
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod context;
pub mod dispatcher;
pub mod handler;
pub mod handlers;
pub mod registry;

// Re-export handler infrastructure
pub use context::CommandContext;
pub use dispatcher::{Dispatch, Dispatcher};
pub use handler::{split_token, TextCommand};
pub use handlers::create_all_commands;
pub use registry::{CommandRegistry, DEFAULT_COMMAND};
