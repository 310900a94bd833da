//! Free-text duration parsing for polls and mutes
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Initial implementation with word units and 60 second fallback

/// Seconds used whenever a duration cannot be parsed into anything useful
pub const DEFAULT_DURATION_SECS: u64 = 60;

/// Unit names and their length in seconds.
///
/// Order matters: a token is assigned the first unit whose name it contains.
const UNITS: [(&str, u64); 7] = [
    ("year", 31_536_000),
    ("month", 2_628_288),
    ("week", 604_800),
    ("day", 86_400),
    ("hour", 3_600),
    ("minute", 60),
    ("second", 1),
];

/// Convert a duration such as `90`, `2 minutes` or `1 hour, 30 minutes` into seconds.
///
/// A lone integer is taken as seconds. Otherwise every unit word multiplies the
/// integer right before it; anything unrecognized is skipped. Parsing never
/// fails: when nothing adds up the result is [`DEFAULT_DURATION_SECS`].
pub fn interpret_time(text: &str) -> u64 {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    if let [single] = tokens.as_slice() {
        if is_integer(single) {
            return single.parse().unwrap_or(u64::MAX);
        }
    }

    let mut total: u64 = 0;
    for (i, token) in tokens.iter().enumerate() {
        if is_integer(token) || i == 0 {
            continue;
        }
        let Some(unit_secs) = unit_seconds(token) else {
            continue;
        };
        let previous = tokens[i - 1];
        if !is_integer(previous) {
            continue;
        }
        let amount: u64 = previous.parse().unwrap_or(u64::MAX);
        total = total.saturating_add(amount.saturating_mul(unit_secs));
    }

    if total == 0 {
        DEFAULT_DURATION_SECS
    } else {
        total
    }
}

fn is_integer(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

fn unit_seconds(token: &str) -> Option<u64> {
    let token = token.to_lowercase();
    UNITS
        .iter()
        .find(|(name, _)| token.contains(name))
        .map(|&(_, secs)| secs)
}
