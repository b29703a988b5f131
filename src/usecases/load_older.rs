//! Backward pagination: one guarded in-flight page at a time, merged above
//! the messages already known.

use crate::domain::chat_session::ChatSession;
use crate::domain::message_store::MergeMode;

use super::contracts::RemoteHistory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOlderOutcome {
    /// A load was already in flight, or the history is exhausted.
    Skipped,
    Applied {
        added: usize,
        exhausted: bool,
    },
    /// Cursor and exhaustion flag are untouched; a later trigger retries.
    Failed(String),
}

/// Fetches the page at the session cursor and prepends the unseen remainder.
/// Duplicates are filtered against both the canonical identity and any
/// secondary identity the remote populates.
pub fn load_older(session: &mut ChatSession, remote: &dyn RemoteHistory) -> LoadOlderOutcome {
    if !session.begin_load_older() {
        return LoadOlderOutcome::Skipped;
    }

    let page = match remote.fetch_page(session.chat_key(), session.cursor()) {
        Ok(page) => page,
        Err(error) => {
            tracing::warn!(
                chat_key = session.chat_key(),
                cursor = session.cursor(),
                reason = error.reason(),
                "older page fetch failed"
            );
            session.abort_load_older();
            return LoadOlderOutcome::Failed(error.reason().to_owned());
        }
    };

    let exhausted = page.items.is_empty();

    let mut records = Vec::new();
    let mut aliases = Vec::new();
    for item in &page.items {
        let record = item.normalize();
        let known_by_secondary = item
            .secondary_identity()
            .is_some_and(|id| session.store().contains_identity(id));
        if known_by_secondary || session.store().contains_identity(&record.identity) {
            continue;
        }
        if let Some(alias) = item.secondary_identity() {
            aliases.push((alias.to_owned(), record.identity.clone()));
        }
        records.push(record);
    }

    let added = session.store_mut().upsert_many(records, MergeMode::Prepend);
    for (alias, identity) in aliases {
        session.store_mut().register_alias(&alias, &identity);
    }
    session.complete_load_older(page.next_cursor, exhausted);

    LoadOlderOutcome::Applied { added, exhausted }
}
