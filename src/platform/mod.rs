//! # Chat Platform
//!
//! The narrow slice of the chat client the bot core talks to. Commands, polls and
//! moderation only ever see [`ChatPlatform`]; the serenity-backed implementation
//! lives in [`discord`].
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod discord;

#[cfg(test)]
pub(crate) mod mock;

use anyhow::Result;
use async_trait::async_trait;

pub use discord::DiscordPlatform;

/// Kind of channel a command message arrived in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Regular text channel inside a guild
    GuildText,
    /// Direct message with a single user
    Direct,
    /// Threads, voice text chats, announcement channels, ...
    Other,
}

/// A guild member as seen by commands and moderation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub guild_id: u64,
    pub user_id: u64,
    /// Account name
    pub name: String,
    /// Nickname in the guild, or the account name when none is set
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: u64,
    pub name: String,
    pub bot: bool,
}

/// An incoming text message, already resolved into what commands need
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: u64,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub channel_kind: ChannelKind,
    pub author: Author,
    pub content: String,
    /// Members @mentioned in the message, in mention order
    pub mentions: Vec<MemberRef>,
}

/// Handle to a message the bot posted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostedMessage {
    pub id: u64,
    pub channel_id: u64,
}

/// Current count for one reaction on a message, the bot's own reaction included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionCount {
    pub marker: String,
    pub count: u64,
}

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Post a text message to a channel
    async fn send(&self, channel_id: u64, text: &str) -> Result<PostedMessage>;

    /// React to a posted message with a unicode marker
    async fn add_reaction(&self, message: &PostedMessage, marker: &str) -> Result<()>;

    /// Fetch the message again and return its current reaction counts
    async fn fetch_reactions(&self, message: &PostedMessage) -> Result<Vec<ReactionCount>>;

    /// Server-mute or unmute a member in voice
    async fn set_voice_mute(&self, member: &MemberRef, muted: bool) -> Result<()>;

    /// Send a direct message to a user
    async fn send_direct(&self, user_id: u64, text: &str) -> Result<()>;

    /// All current members of a guild
    async fn guild_members(&self, guild_id: u64) -> Result<Vec<MemberRef>>;
}
