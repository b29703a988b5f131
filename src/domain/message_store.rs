//! Ordered, identity-deduplicated collection of messages for one chat.
//!
//! The store is the single source of truth the UI renders from. Every merge
//! path preserves two invariants: identities are unique, and the list stays
//! sorted ascending by timestamp.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::day_groups::{self, DayGroup};
use super::message::{DeliveryStatus, Message, MessageContent};

/// How a batch of records is merged into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Full snapshot: initial load and live-push refresh.
    Replace,
    /// Older page: records with known identities (or aliases) are dropped.
    Prepend,
    /// Newly created or newly arrived message.
    Append,
}

/// Field-wise update applied to a single record in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePatch {
    pub status: Option<DeliveryStatus>,
    pub failure_reason: Option<String>,
    /// Substituted into the record's media payload after upload.
    pub media_url: Option<String>,
    /// Renames the record; the old identity becomes an alias.
    pub new_identity: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageStore {
    messages: Vec<Message>,
    /// Retired identity -> current identity. Lookups by a retired identity
    /// fail, but dedupe still recognizes it.
    aliases: HashMap<String, String>,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Looks up a live record by its current identity.
    pub fn get(&self, identity: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.identity == identity)
    }

    /// True when the identity is live or was ever used by a live record.
    pub fn contains_identity(&self, identity: &str) -> bool {
        self.aliases.contains_key(identity) || self.get(identity).is_some()
    }

    /// Records a secondary identity (e.g. a platform id) for dedupe purposes.
    pub fn register_alias(&mut self, alias: &str, identity: &str) {
        if alias.is_empty() || alias == identity {
            return;
        }
        self.aliases.insert(alias.to_owned(), identity.to_owned());
    }

    /// Merges a batch of records. Returns the number of records added.
    pub fn upsert_many(&mut self, records: Vec<Message>, mode: MergeMode) -> usize {
        if mode == MergeMode::Replace {
            self.messages.clear();
        }

        let mut added = 0;
        for mut record in records {
            // Records keyed by a retired identity fold onto the current one.
            if let Some(current) = self.aliases.get(&record.identity) {
                record.identity = current.clone();
            }

            let position = self
                .messages
                .iter()
                .position(|m| m.identity == record.identity);

            match position {
                Some(index) => {
                    // Prepend never shrinks or rewrites what is already known.
                    if mode != MergeMode::Prepend {
                        merge_record(&mut self.messages[index], record);
                    }
                }
                None => {
                    self.messages.push(record);
                    added += 1;
                }
            }
        }

        self.messages.sort_by_key(|m| m.timestamp_ms);
        added
    }

    /// Applies a field-wise patch to the record with the given live identity.
    /// Backward status moves are ignored; everything else in the patch still
    /// applies. Returns false when no live record matches.
    pub fn mutate(&mut self, identity: &str, patch: MessagePatch) -> bool {
        let Some(index) = self.messages.iter().position(|m| m.identity == identity) else {
            return false;
        };

        if let Some(next) = patch.status {
            let allowed = match self.messages[index].status {
                None => true,
                Some(current) => current == next || current.can_advance_to(next),
            };
            if allowed {
                self.messages[index].status = Some(next);
            }
        }

        if let Some(reason) = patch.failure_reason {
            self.messages[index].failure_reason = Some(reason);
        }

        if let Some(url) = patch.media_url {
            if let MessageContent::Media { url: slot, .. } = &mut self.messages[index].content {
                *slot = url;
            }
        }

        if let Some(new_identity) = patch.new_identity {
            if new_identity != identity {
                self.rename(index, new_identity);
            }
        }

        true
    }

    /// Renames the record at `index`, merging any live record that already
    /// holds the new identity. Position of the renamed record is preserved.
    fn rename(&mut self, index: usize, new_identity: String) {
        let old_identity = self.messages[index].identity.clone();

        if let Some(existing) = self
            .messages
            .iter()
            .position(|m| m.identity == new_identity)
        {
            if existing != index {
                let other = self.messages.remove(existing);
                let index = if existing < index { index - 1 } else { index };
                merge_record(&mut self.messages[index], other);
                self.messages[index].identity = new_identity.clone();
            }
        } else {
            self.messages[index].identity = new_identity.clone();
        }

        for target in self.aliases.values_mut() {
            if *target == old_identity {
                *target = new_identity.clone();
            }
        }
        self.aliases.insert(old_identity, new_identity);
    }

    pub fn group_by_day(&self, today: NaiveDate) -> Vec<DayGroup<'_>> {
        day_groups::group_by_day(&self.messages, today)
    }
}

/// Field-wise merge of two records with the same logical identity. Status
/// only ever moves forward; empty incoming fields never erase known data.
fn merge_record(existing: &mut Message, incoming: Message) {
    if !incoming.body.is_empty() {
        existing.body = incoming.body;
    }
    if incoming.timestamp_ms != 0 {
        existing.timestamp_ms = incoming.timestamp_ms;
    }
    match (existing.status, incoming.status) {
        (None, Some(status)) => existing.status = Some(status),
        (Some(current), Some(next)) if current.can_advance_to(next) => {
            existing.status = Some(next)
        }
        _ => {}
    }
    if incoming.failure_reason.is_some() {
        existing.failure_reason = incoming.failure_reason;
    }
    if incoming.sent_by.is_some() {
        existing.sent_by = incoming.sent_by;
    }
    if incoming.read_by.is_some() {
        existing.read_by = incoming.read_by;
    }
    if !matches!(&incoming.content, MessageContent::Media { url, .. } if url.is_empty()) {
        existing.content = incoming.content;
    }
}
