//! # Core Module
//!
//! Configuration, duration parsing and reply formatting shared by every command.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add duration module for poll and mute lengths
//! - 1.0.0: Initial creation with config and response modules

pub mod config;
pub mod duration;
pub mod response;

pub use config::Config;
pub use duration::{interpret_time, DEFAULT_DURATION_SECS};
pub use response::{chunk_for_message, format_key_list, MESSAGE_LIMIT};
