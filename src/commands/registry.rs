//! Command handler registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Keep registration order, sub-command resolution with a default child
//! - 1.0.0: Initial implementation for handler dispatch

use std::collections::HashMap;
use std::sync::Arc;

use super::handler::{split_token, TextCommand};

/// Id of the command run when nothing else matches
pub const DEFAULT_COMMAND: &str = "default";

/// Registry mapping command ids to handlers
///
/// Lookups are case-sensitive. Registration order is kept so help output
/// lists commands in the order they were registered.
///
/// # Example
///
/// ```ignore
/// let mut registry = CommandRegistry::new();
/// registry.register(Arc::new(DefaultCommand::new("!cc")));
/// registry.register(Arc::new(UsersCommand));
///
/// let handler = registry.get("users").or_else(|| registry.get(DEFAULT_COMMAND));
/// ```
#[derive(Clone)]
pub struct CommandRegistry {
    handlers: HashMap<&'static str, Arc<dyn TextCommand>>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a handler under its id
    ///
    /// Registering an id twice replaces the handler but keeps its original position.
    pub fn register(&mut self, handler: Arc<dyn TextCommand>) {
        let id = handler.id();
        if self.handlers.insert(id, handler).is_none() {
            self.order.push(id);
        }
    }

    /// Get handler for a command id
    pub fn get(&self, id: &str) -> Option<Arc<dyn TextCommand>> {
        self.handlers.get(id).cloned()
    }

    /// Check if a command is registered
    pub fn contains(&self, id: &str) -> bool {
        self.handlers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered ids in registration order
    pub fn command_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }

    /// `"<prefix> <id>: <summary>"` for every command except the default one
    pub fn help_lines(&self, prefix: &str) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| **id != DEFAULT_COMMAND)
            .filter_map(|id| self.handlers.get(id))
            .map(|handler| format!("{prefix} {}: {}", handler.id(), handler.summary()))
            .collect()
    }

    /// Resolve a sub-command from the first token of `tail`.
    ///
    /// On a hit the token is stripped from the returned arguments. On a miss
    /// the `fallback` child gets the whole tail. `None` only when the fallback
    /// itself is not registered.
    pub fn resolve<'a>(
        &self,
        tail: &'a str,
        fallback: &str,
    ) -> Option<(Arc<dyn TextCommand>, &'a str)> {
        let (token, rest) = split_token(tail);
        match self.get(token) {
            Some(handler) => Some((handler, rest)),
            None => self.get(fallback).map(|handler| (handler, tail.trim_start())),
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
