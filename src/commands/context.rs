//! Shared context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Platform, moderation and knowledge services for text commands
//! - 1.0.0: Initial implementation with core shared state

use anyhow::Result;
use std::sync::Arc;

use crate::core::{chunk_for_message, Config};
use crate::features::knowledge::KnowledgeStore;
use crate::features::moderation::Moderation;
use crate::platform::{ChatPlatform, IncomingMessage, PostedMessage};

/// Shared context for all command handlers
///
/// Contains the services commands act through:
/// - Config for the prefix and knowledge access lists
/// - ChatPlatform for replies, reactions and direct messages
/// - Moderation for mute records and the mute lifecycle
/// - KnowledgeStore for the `av grdn` entries
#[derive(Clone)]
pub struct CommandContext {
    pub config: Arc<Config>,
    pub platform: Arc<dyn ChatPlatform>,
    pub moderation: Arc<Moderation>,
    pub knowledge: Arc<KnowledgeStore>,
}

impl CommandContext {
    pub fn new(
        config: Arc<Config>,
        platform: Arc<dyn ChatPlatform>,
        moderation: Arc<Moderation>,
        knowledge: Arc<KnowledgeStore>,
    ) -> Self {
        Self {
            config,
            platform,
            moderation,
            knowledge,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    /// Reply in the channel the message came from, split to fit the message limit.
    ///
    /// Returns the last message posted.
    pub async fn reply(&self, msg: &IncomingMessage, text: &str) -> Result<Option<PostedMessage>> {
        let mut last = None;
        for chunk in chunk_for_message(text) {
            last = Some(self.platform.send(msg.channel_id, &chunk).await?);
        }
        Ok(last)
    }
}
