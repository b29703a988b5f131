//! Collaborator contracts of the conversation controller.
//!
//! Transport failures and application-level error flags are mapped to the
//! same error shapes by the adapters, so every consumer downstream treats
//! them identically.

use crate::domain::message::{DeliveryStatus, MediaKind, Message, TemplateContent};
use crate::wire::WireMessage;

/// One backward page of remote history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryPage {
    pub items: Vec<WireMessage>,
    /// Cursor for the next older page. An empty `items` list signals
    /// exhaustion regardless of this value.
    pub next_cursor: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistorySourceError {
    /// Network failure or exception.
    Transport(String),
    /// Well-formed response carrying an error flag.
    Service(String),
}

impl HistorySourceError {
    pub fn reason(&self) -> &str {
        match self {
            Self::Transport(reason) | Self::Service(reason) => reason,
        }
    }
}

/// Remote history collaborator: cursor-based backward pagination.
pub trait RemoteHistory {
    fn fetch_page(&self, chat_key: &str, cursor: &str)
        -> Result<HistoryPage, HistorySourceError>;
}

impl<T: RemoteHistory + ?Sized> RemoteHistory for &T {
    fn fetch_page(
        &self,
        chat_key: &str,
        cursor: &str,
    ) -> Result<HistoryPage, HistorySourceError> {
        (*self).fetch_page(chat_key, cursor)
    }
}

/// Identifiers the outgoing collaborator returns on a successful transmit.
/// Some kinds return only a delivery handle and no separate id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub server_message_id: Option<String>,
    pub server_secondary_id: Option<String>,
    pub server_record_id: Option<String>,
}

impl SendReceipt {
    /// The permanent identity to adopt, when the server assigned one.
    pub fn assigned_identity(&self) -> Option<&str> {
        self.server_message_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or_else(|| {
                self.server_secondary_id
                    .as_deref()
                    .filter(|id| !id.is_empty())
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundError {
    Transport(String),
    Service(String),
}

impl OutboundError {
    pub fn reason(&self) -> &str {
        match self {
            Self::Transport(reason) | Self::Service(reason) => reason,
        }
    }
}

/// Outgoing-message collaborator, one operation per payload shape.
pub trait OutboundGateway {
    fn send_text(&self, chat_key: &str, body: &str) -> Result<SendReceipt, OutboundError>;

    fn send_media(
        &self,
        chat_key: &str,
        kind: MediaKind,
        url: &str,
        caption: &str,
    ) -> Result<SendReceipt, OutboundError>;

    fn send_template(
        &self,
        chat_key: &str,
        template: &TemplateContent,
    ) -> Result<SendReceipt, OutboundError>;
}

impl<T: OutboundGateway + ?Sized> OutboundGateway for &T {
    fn send_text(&self, chat_key: &str, body: &str) -> Result<SendReceipt, OutboundError> {
        (*self).send_text(chat_key, body)
    }

    fn send_media(
        &self,
        chat_key: &str,
        kind: MediaKind,
        url: &str,
        caption: &str,
    ) -> Result<SendReceipt, OutboundError> {
        (*self).send_media(chat_key, kind, url, caption)
    }

    fn send_template(
        &self,
        chat_key: &str,
        template: &TemplateContent,
    ) -> Result<SendReceipt, OutboundError> {
        (*self).send_template(chat_key, template)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadError(pub String);

/// Media-upload collaborator: raw binary in, remote URL out.
pub trait MediaUploader {
    fn upload(&self, bytes: &[u8], file_name: &str) -> Result<String, UploadError>;
}

impl<T: MediaUploader + ?Sized> MediaUploader for &T {
    fn upload(&self, bytes: &[u8], file_name: &str) -> Result<String, UploadError> {
        (*self).upload(bytes, file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheError(pub String);

/// New identifiers adopted by a message after the server acknowledged it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIdentifiers {
    pub identity: String,
    pub secondary: Option<String>,
    pub record_id: Option<String>,
}

/// Local cache collaborator. All operations are idempotent upserts keyed by
/// identity; failures are logged by callers and never surfaced to the user.
pub trait MessageCache {
    fn messages_for(&self, chat_key: &str) -> Result<Vec<Message>, CacheError>;

    fn upsert_messages(&self, chat_key: &str, messages: &[Message]) -> Result<(), CacheError>;

    fn update_status(
        &self,
        identity: &str,
        status: DeliveryStatus,
        failure_reason: Option<&str>,
    ) -> Result<(), CacheError>;

    fn rename_identity(&self, old: &str, new: &NewIdentifiers) -> Result<(), CacheError>;
}

impl<T: MessageCache + ?Sized> MessageCache for &T {
    fn messages_for(&self, chat_key: &str) -> Result<Vec<Message>, CacheError> {
        (*self).messages_for(chat_key)
    }

    fn upsert_messages(&self, chat_key: &str, messages: &[Message]) -> Result<(), CacheError> {
        (*self).upsert_messages(chat_key, messages)
    }

    fn update_status(
        &self,
        identity: &str,
        status: DeliveryStatus,
        failure_reason: Option<&str>,
    ) -> Result<(), CacheError> {
        (*self).update_status(identity, status, failure_reason)
    }

    fn rename_identity(&self, old: &str, new: &NewIdentifiers) -> Result<(), CacheError> {
        (*self).rename_identity(old, new)
    }
}

/// One-way status notification consumed by the sibling chat-list view.
/// Fire-and-forget, no acknowledgment expected.
pub trait StatusNotifier {
    fn notify(&self, chat_key: &str, identity: &str, status: DeliveryStatus);
}

impl<T: StatusNotifier + ?Sized> StatusNotifier for &T {
    fn notify(&self, chat_key: &str, identity: &str, status: DeliveryStatus) {
        (*self).notify(chat_key, identity, status)
    }
}
