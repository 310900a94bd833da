// Core layer - shared types and configuration
pub mod core;

// Platform layer - chat client seam and its serenity implementation
pub mod platform;

// Features layer - polls, moderation, knowledge
pub mod features;

// Application layer
pub mod commands;

pub use crate::core::Config;

pub use commands::{CommandContext, Dispatcher};
pub use features::{
    // Knowledge
    HttpBlob, KnowledgeStore, RemoteBlob,
    // Moderation
    Moderation, RecordStore, YamlRecordStore,
    // Polls
    run_poll, PollOutcome, PollSpec,
};
pub use platform::{ChatPlatform, DiscordPlatform};
