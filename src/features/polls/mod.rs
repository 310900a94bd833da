//! # Feature: Polls
//!
//! Timed reaction polls. A poll posts its prompt, reacts with one marker per
//! answer, waits, re-reads the reaction counts and announces the winner.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Keycap ten marker for ten-answer polls
//! - 1.0.0: Initial release with numeric and yes/no markers

pub mod engine;

pub use engine::{run_poll, tally, PollOutcome, PollSpec, MAX_ANSWERS, MIN_ANSWERS};

/// Shortcodes shown next to each answer in the poll prompt
pub const NUMBER_LABELS: [&str; 10] = [
    ":one:",
    ":two:",
    ":three:",
    ":four:",
    ":five:",
    ":six:",
    ":seven:",
    ":eight:",
    ":nine:",
    ":keycap_ten:",
];

/// Reaction markers matching [`NUMBER_LABELS`]
pub const NUMBER_MARKERS: [&str; 10] = [
    "1\u{fe0f}\u{20e3}",
    "2\u{fe0f}\u{20e3}",
    "3\u{fe0f}\u{20e3}",
    "4\u{fe0f}\u{20e3}",
    "5\u{fe0f}\u{20e3}",
    "6\u{fe0f}\u{20e3}",
    "7\u{fe0f}\u{20e3}",
    "8\u{fe0f}\u{20e3}",
    "9\u{fe0f}\u{20e3}",
    "\u{1f51f}",
];

pub const YES_MARKER: &str = "\u{2705}";
pub const NO_MARKER: &str = "\u{274c}";
pub const YES_NO_MARKERS: [&str; 2] = [YES_MARKER, NO_MARKER];
