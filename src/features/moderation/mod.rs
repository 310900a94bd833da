//! # Feature: Moderation
//!
//! Timed voice mutes backed by per-member records on disk, with roster sync
//! and reconciliation when members rejoin voice or the bot restarts.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Resume pending mutes at startup, count overlapping mutes
//! - 1.1.0: Voice-join reconciliation
//! - 1.0.0: Initial release with YAML member records and timed mutes

pub mod record;
pub mod roster;
pub mod service;
pub mod store;

pub use record::{not_active, ModerationRecord, MuteState};
pub use service::{Moderation, Reconciliation, MAX_MUTE_SECS};
pub use store::{RecordStore, YamlRecordStore};
