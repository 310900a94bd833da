//! Reply formatting and Discord message size limits
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.0.0: Message splitting and inline-code list formatting

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;

/// Split text into messages no longer than `max_size` bytes.
///
/// Prefers newline boundaries and never splits inside a UTF-8 character.
pub fn split_message(text: &str, max_size: usize) -> Vec<String> {
    if text.len() <= max_size {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current = String::new();

    for line in text.split_inclusive('\n') {
        if current.len() + line.len() <= max_size {
            current.push_str(line);
            continue;
        }
        if !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        if line.len() <= max_size {
            current.push_str(line);
            continue;
        }
        for ch in line.chars() {
            if current.len() + ch.len_utf8() > max_size {
                parts.push(std::mem::take(&mut current));
            }
            current.push(ch);
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }

    parts
        .into_iter()
        .map(|p| p.trim_end_matches('\n').to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split text for plain message content (2000 byte limit)
pub fn chunk_for_message(text: &str) -> Vec<String> {
    split_message(text, MESSAGE_LIMIT)
}

/// Render keys as a comma separated list of inline code spans
pub fn format_key_list<I, S>(keys: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    keys.into_iter()
        .map(|k| format!("`{}`", k.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}
