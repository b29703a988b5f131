//! Per-conversation session state: pagination cursor, exhaustion flag, and
//! the single in-flight guard for backward loads.

use super::message_store::MessageStore;

/// Cursor value meaning "start from the newest message".
pub const INITIAL_CURSOR: &str = "0";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSession {
    chat_key: String,
    cursor: String,
    has_more: bool,
    loading_older: bool,
    store: MessageStore,
}

impl ChatSession {
    /// Fresh session for a newly opened chat: cursor at newest, more assumed.
    pub fn open(chat_key: impl Into<String>) -> Self {
        Self {
            chat_key: chat_key.into(),
            cursor: INITIAL_CURSOR.to_owned(),
            has_more: true,
            loading_older: false,
            store: MessageStore::new(),
        }
    }

    pub fn chat_key(&self) -> &str {
        &self.chat_key
    }

    pub fn cursor(&self) -> &str {
        &self.cursor
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading_older(&self) -> bool {
        self.loading_older
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut MessageStore {
        &mut self.store
    }

    pub fn set_cursor(&mut self, cursor: impl Into<String>) {
        self.cursor = cursor.into();
    }

    /// Index of the newest message, the scroll target after an initial load.
    pub fn newest_index(&self) -> Option<usize> {
        self.store.len().checked_sub(1)
    }

    /// Claims the single pagination slot. Refused while a load is in flight
    /// or once the remote source reported exhaustion.
    pub fn begin_load_older(&mut self) -> bool {
        if self.loading_older || !self.has_more {
            return false;
        }
        self.loading_older = true;
        true
    }

    /// Releases the slot after a successful page, advancing the cursor.
    pub fn complete_load_older(&mut self, next_cursor: impl Into<String>, exhausted: bool) {
        self.cursor = next_cursor.into();
        if exhausted {
            self.has_more = false;
        }
        self.loading_older = false;
    }

    /// Releases the slot after a failed page, leaving cursor and exhaustion
    /// untouched so a later scroll-to-top retries.
    pub fn abort_load_older(&mut self) {
        self.loading_older = false;
    }
}

/// Scroll-offset correction after a prepend changed the content height above
/// the viewport: the visual anchor stays put when the offset grows by
/// exactly the height delta.
pub fn adjust_scroll_anchor(height_before: f64, height_after: f64, scroll_top_before: f64) -> f64 {
    scroll_top_before + (height_after - height_before)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_resets_cursor_and_exhaustion() {
        let session = ChatSession::open("5511999@c.us");

        assert_eq!(session.chat_key(), "5511999@c.us");
        assert_eq!(session.cursor(), INITIAL_CURSOR);
        assert!(session.has_more());
        assert!(!session.is_loading_older());
        assert!(session.store().is_empty());
    }

    #[test]
    fn only_one_load_older_may_be_in_flight() {
        let mut session = ChatSession::open("chat");

        assert!(session.begin_load_older());
        assert!(!session.begin_load_older());

        session.complete_load_older("37", false);
        assert!(session.begin_load_older());
    }

    #[test]
    fn complete_advances_cursor_and_records_exhaustion() {
        let mut session = ChatSession::open("chat");
        session.begin_load_older();

        session.complete_load_older("37", false);
        assert_eq!(session.cursor(), "37");
        assert!(session.has_more());

        session.begin_load_older();
        session.complete_load_older("37", true);
        assert!(!session.has_more());
        assert!(!session.begin_load_older());
    }

    #[test]
    fn abort_leaves_cursor_and_exhaustion_untouched() {
        let mut session = ChatSession::open("chat");
        session.begin_load_older();

        session.abort_load_older();

        assert_eq!(session.cursor(), INITIAL_CURSOR);
        assert!(session.has_more());
        assert!(session.begin_load_older());
    }

    #[test]
    fn scroll_anchor_grows_by_the_height_delta() {
        assert_eq!(adjust_scroll_anchor(1000.0, 1600.0, 120.0), 720.0);
        assert_eq!(adjust_scroll_anchor(1000.0, 1000.0, 120.0), 120.0);
    }
}
