//! # Feature: Knowledge
//!
//! Key/value lore store shared by the curators of a campaign. Entries stay
//! hidden until revealed, and the whole store is mirrored to a remote copy.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: HTTP remote with hourly refresh
//! - 1.0.0: Initial release with a local JSON cache

pub mod remote;
pub mod store;

pub use remote::{HttpBlob, RemoteBlob};
pub use store::{normalize_key, AddOutcome, KnowledgeBase, KnowledgeStore, Lookup};
