//! Acceptance of push-delivered full snapshots for the active chat.

use crate::domain::chat_session::ChatSession;
use crate::domain::message_store::MergeMode;
use crate::wire::WireMessage;

/// Replaces the session's messages wholesale with a pushed snapshot. The
/// delivery is authoritative; pagination bookkeeping (cursor, exhaustion)
/// is deliberately untouched, so an in-flight older load stays coherent.
/// Deliveries for another chat are ignored.
pub fn accept_live_refresh(
    session: &mut ChatSession,
    chat_key: &str,
    items: &[WireMessage],
) -> bool {
    if session.chat_key() != chat_key {
        tracing::debug!(
            active = session.chat_key(),
            pushed = chat_key,
            "live refresh for inactive chat dropped"
        );
        return false;
    }

    let records: Vec<_> = items.iter().map(WireMessage::normalize).collect();
    let aliases: Vec<_> = items
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
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message_store::MergeMode;

    fn wire_item(id: &str, timestamp: i64) -> WireMessage {
        WireMessage {
            message_id: Some(id.to_owned()),
            body: Some(format!("body {id}")),
            timestamp: Some(timestamp),
            ..Default::default()
        }
    }

    #[test]
    fn replaces_contents_wholesale() {
        let mut session = ChatSession::open("chat");
        session
            .store_mut()
            .upsert_many(vec![wire_item("old", 100).normalize()], MergeMode::Replace);

        let applied = accept_live_refresh(
            &mut session,
            "chat",
            &[wire_item("m-1", 200), wire_item("m-2", 300)],
        );

        assert!(applied);
        assert_eq!(session.store().len(), 2);
        assert!(session.store().get("old").is_none());
    }

    #[test]
    fn pagination_bookkeeping_is_untouched() {
        let mut session = ChatSession::open("chat");
        session.set_cursor("37");
        session.begin_load_older();

        accept_live_refresh(&mut session, "chat", &[wire_item("m-1", 200)]);

        assert_eq!(session.cursor(), "37");
        assert!(session.has_more());
        assert!(session.is_loading_older());
    }

    #[test]
    fn deliveries_for_other_chats_are_dropped() {
        let mut session = ChatSession::open("chat-a");
        session
            .store_mut()
            .upsert_many(vec![wire_item("keep", 100).normalize()], MergeMode::Replace);

        let applied = accept_live_refresh(&mut session, "chat-b", &[wire_item("m-1", 200)]);

        assert!(!applied);
        assert_eq!(session.store().len(), 1);
        assert!(session.store().get("keep").is_some());
    }
}
