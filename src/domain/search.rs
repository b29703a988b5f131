//! On-demand search over the messages resident in a store.
//!
//! Matching is case-insensitive substring containment; there is no
//! server-side search. Results keep encounter order, deduplicated by
//! identity and capped.

use std::collections::HashSet;

use chrono::{Local, NaiveDate, TimeZone};

use super::day_groups::{search_day_label, timestamp_to_local_date};
use super::message::{Direction, Message, MessageContent};

pub const MAX_RESULTS: usize = 50;
const SNIPPET_LIMIT: usize = 160;
const SNIPPET_RADIUS: usize = 32;
const ELLIPSIS: char = '\u{2026}';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub identity: String,
    pub snippet: String,
    /// `HH:MM` display time.
    pub time_label: String,
    /// Empty for today, "Yesterday", or `DD/MM/YYYY`.
    pub day_label: String,
    /// Contact name for incoming, the configured self label for outgoing.
    pub direction_label: String,
}

/// Extracts the text a message is searchable by, kind-specific. Empty or
/// absent fields are skipped.
pub fn searchable_text(message: &Message) -> String {
    match &message.content {
        MessageContent::Text => message.body.clone(),
        MessageContent::Template(template) => {
            if !message.body.is_empty() {
                message.body.clone()
            } else {
                template.resolved_body().unwrap_or_default()
            }
        }
        MessageContent::Location {
            latitude,
            longitude,
            name,
            address,
        } => join_fields(&[
            name,
            address,
            &latitude.to_string(),
            &longitude.to_string(),
        ]),
        MessageContent::Contact { name, phone, email } => {
            join_fields(&[name, phone, email, &message.body])
        }
        MessageContent::Media { name, .. } => join_fields(&[&message.body, name]),
    }
}

fn join_fields(fields: &[&str]) -> String {
    fields
        .iter()
        .filter(|f| !f.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs a substring search over `messages`, in encounter order.
pub fn search(
    messages: &[Message],
    query: &str,
    contact_name: &str,
    outgoing_label: &str,
    today: NaiveDate,
) -> Vec<SearchHit> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut hits = Vec::new();

    for message in messages {
        if hits.len() >= MAX_RESULTS {
            break;
        }

        let text = searchable_text(message);
        if text.is_empty() {
            continue;
        }

        let lowered = text.to_lowercase();
        let Some(byte_pos) = lowered.find(&needle) else {
            continue;
        };

        if !seen.insert(&message.identity) {
            continue;
        }

        let match_window = match_char_window(&text, &lowered, byte_pos, &needle);
        let date = timestamp_to_local_date(message.timestamp_ms);

        hits.push(SearchHit {
            identity: message.identity.clone(),
            snippet: snippet(&text, match_window),
            time_label: time_label(message.timestamp_ms),
            day_label: search_day_label(date, today),
            direction_label: match message.direction {
                Direction::Incoming => contact_name.to_owned(),
                Direction::Outgoing => outgoing_label.to_owned(),
            },
        });
    }

    hits
}

/// Character-index window of the first match, or None when lowercasing
/// changed the character layout and positions cannot be trusted.
fn match_char_window(
    text: &str,
    lowered: &str,
    byte_pos: usize,
    needle: &str,
) -> Option<(usize, usize)> {
    if text.chars().count() != lowered.chars().count() {
        return None;
    }
    let start = lowered[..byte_pos].chars().count();
    Some((start, needle.chars().count()))
}

/// Bounded excerpt: short text passes through whole; long text with a known
/// match gets a window around it, otherwise a plain head truncation.
fn snippet(text: &str, match_window: Option<(usize, usize)>) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= SNIPPET_LIMIT {
        return text.to_owned();
    }

    match match_window {
        Some((start, len)) => {
            let window_start = start.saturating_sub(SNIPPET_RADIUS);
            let window_end = (start + len + SNIPPET_RADIUS).min(chars.len());

            let mut out = String::new();
            if window_start > 0 {
                out.push(ELLIPSIS);
            }
            out.extend(&chars[window_start..window_end]);
            if window_end < chars.len() {
                out.push(ELLIPSIS);
            }
            out
        }
        None => {
            let mut out: String = chars[..SNIPPET_LIMIT].iter().collect();
            out.push(ELLIPSIS);
            out
        }
    }
}

fn time_label(timestamp_ms: i64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M").to_string(),
        chrono::LocalResult::Ambiguous(dt, _) => dt.format("%H:%M").to_string(),
        chrono::LocalResult::None => String::new(),
    }
}
