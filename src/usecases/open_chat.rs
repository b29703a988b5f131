//! Initial load of a newly opened chat: local cache fast path, then remote
//! reconciliation at the newest-page cursor.

use crate::domain::chat_session::{ChatSession, INITIAL_CURSOR};
use crate::domain::message_store::MergeMode;

use super::contracts::{MessageCache, RemoteHistory};

#[derive(Debug)]
pub struct OpenChatOutcome {
    pub session: ChatSession,
    /// Reason of a failed remote fetch. Whatever the cache provided stays.
    pub remote_error: Option<String>,
}

/// Opens a chat: renders cached messages immediately, reconciles against the
/// remote newest page, and persists the merged set back to the cache.
/// Cache failures are logged, never surfaced.
pub fn open_chat(
    chat_key: &str,
    cache: &dyn MessageCache,
    remote: &dyn RemoteHistory,
) -> OpenChatOutcome {
    let mut session = ChatSession::open(chat_key);

    match cache.messages_for(chat_key) {
        Ok(cached) => {
            session.store_mut().upsert_many(cached, MergeMode::Replace);
        }
        Err(error) => {
            tracing::warn!(chat_key, reason = %error.0, "cache read failed during open");
        }
    }

    let remote_error = match remote.fetch_page(chat_key, INITIAL_CURSOR) {
        Ok(page) => {
            let records: Vec<_> = page.items.iter().map(|item| item.normalize()).collect();
            let aliases: Vec<_> = page
                .items
                .iter()
                .zip(&records)
                .filter_map(|(item, record)| {
                    item.secondary_identity()
                        .map(|alias| (alias.to_owned(), record.identity.clone()))
                })
                .collect();

            session.store_mut().upsert_many(records, MergeMode::Replace);
            for (alias, identity) in aliases {
                session.store_mut().register_alias(&alias, &identity);
            }
            session.set_cursor(page.next_cursor);

            if let Err(error) = cache.upsert_messages(chat_key, session.store().messages()) {
                tracing::warn!(chat_key, reason = %error.0, "cache write failed after open");
            }
            None
        }
        Err(error) => {
            tracing::warn!(
                chat_key,
                reason = error.reason(),
                "remote history fetch failed during open"
            );
            Some(error.reason().to_owned())
        }
    };

    OpenChatOutcome {
        session,
        remote_error,
    }
}
