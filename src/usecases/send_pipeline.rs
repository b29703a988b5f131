//! Optimistic send pipeline.
//!
//! Each outgoing message moves through `Composing -> Pending -> {Sent,
//! Failed}`. Pending and the terminal states are durable; Composing lives
//! only inside this module. The optimistic record is appended and persisted
//! before any network work, then mutated in place as the pipeline advances:
//! upload (when an attachment exists), transmit, identity reconciliation.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

use crate::domain::chat_session::ChatSession;
use crate::domain::message::{
    DeliveryStatus, Direction, MediaKind, Message, MessageContent, TemplateContent,
};
use crate::domain::message_store::{MergeMode, MessagePatch};

use super::contracts::{
    MediaUploader, MessageCache, NewIdentifiers, OutboundGateway, SendReceipt, StatusNotifier,
};

const TEMP_IDENTITY_PREFIX: &str = "temp_";

static LAST_TEMP_MS: AtomicI64 = AtomicI64::new(0);

/// Temporary identity for an optimistic record. Strictly increasing even
/// when two sends land on the same millisecond.
fn next_temp_identity() -> String {
    let now = Utc::now().timestamp_millis();
    let previous = LAST_TEMP_MS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(0);
    format!("{TEMP_IDENTITY_PREFIX}{}", now.max(previous + 1))
}

/// In-memory capture buffer for a voice message. Stopping yields the
/// attachment fed into the pipeline; cancelling discards the audio.
#[derive(Debug, Default)]
pub struct VoiceRecorder {
    buffer: Vec<u8>,
}

impl VoiceRecorder {
    pub fn start() -> Self {
        Self::default()
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Ends the capture. Returns nothing when no audio was buffered.
    pub fn stop(self) -> Option<OutgoingAttachment> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(OutgoingAttachment {
            kind: MediaKind::Audio,
            file_name: format!("voice-{}.ogg", Utc::now().timestamp_millis()),
            bytes: self.buffer,
        })
    }

    pub fn cancel(self) {
        drop(self);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingAttachment {
    pub kind: MediaKind,
    pub bytes: Vec<u8>,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingDraft {
    Text {
        body: String,
    },
    Media {
        attachment: OutgoingAttachment,
        caption: String,
    },
    Template {
        template: TemplateContent,
    },
}

/// Validation failures; nothing enters the pipeline when submit errs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    EmptyMessage,
}

pub struct SendContext<'a> {
    pub cache: &'a dyn MessageCache,
    pub uploader: &'a dyn MediaUploader,
    pub gateway: &'a dyn OutboundGateway,
    pub notifier: &'a dyn StatusNotifier,
}

/// Runs the pipeline for one draft. Returns the identity of the message as
/// it stands when the pipeline ends: the server identity on an acknowledged
/// send, otherwise the temporary one. Send failures do not err here; they
/// resolve the record to Failed with a human-readable reason.
pub fn submit(
    session: &mut ChatSession,
    draft: OutgoingDraft,
    ctx: &SendContext,
) -> Result<String, SubmitError> {
    let (body, content, attachment) = match draft {
        OutgoingDraft::Text { body } => {
            let body = body.trim().to_owned();
            if body.is_empty() {
                return Err(SubmitError::EmptyMessage);
            }
            (body, MessageContent::Text, None)
        }
        OutgoingDraft::Media {
            attachment,
            caption,
        } => (
            caption,
            MessageContent::Media {
                kind: attachment.kind,
                url: String::new(),
                name: attachment.file_name.clone(),
            },
            Some(attachment),
        ),
        OutgoingDraft::Template { template } => {
            let body = template.resolved_body().unwrap_or_default();
            (body, MessageContent::Template(template), None)
        }
    };

    let identity = next_temp_identity();
    let message = Message {
        identity: identity.clone(),
        direction: Direction::Outgoing,
        status: Some(DeliveryStatus::Pending),
        failure_reason: None,
        timestamp_ms: Utc::now().timestamp_millis(),
        body: body.clone(),
        content: content.clone(),
        sent_by: None,
        read_by: None,
    };

    session
        .store_mut()
        .upsert_many(vec![message], MergeMode::Append);
    persist_upsert(session, ctx, &identity);
    ctx.notifier
        .notify(session.chat_key(), &identity, DeliveryStatus::Pending);

    // Upload precedes transmit; a failed upload short-circuits the pipeline.
    let uploaded_url = match attachment {
        Some(attachment) => {
            match ctx.uploader.upload(&attachment.bytes, &attachment.file_name) {
                Ok(url) => {
                    session.store_mut().mutate(
                        &identity,
                        MessagePatch {
                            media_url: Some(url.clone()),
                            ..Default::default()
                        },
                    );
                    Some(url)
                }
                Err(error) => {
                    let reason = format!("media upload failed: {}", error.0);
                    resolve_failed(session, ctx, &identity, &reason);
                    return Ok(identity);
                }
            }
        }
        None => None,
    };

    let receipt = match &content {
        MessageContent::Text => ctx.gateway.send_text(session.chat_key(), &body),
        MessageContent::Media { kind, .. } => ctx.gateway.send_media(
            session.chat_key(),
            *kind,
            uploaded_url.as_deref().unwrap_or(""),
            &body,
        ),
        MessageContent::Template(template) => {
            ctx.gateway.send_template(session.chat_key(), template)
        }
        // Location and contact sends are not composed locally.
        _ => Ok(SendReceipt::default()),
    };

    match receipt {
        Ok(receipt) => Ok(resolve_sent(session, ctx, identity, &receipt)),
        Err(error) => {
            resolve_failed(session, ctx, &identity, error.reason());
            Ok(identity)
        }
    }
}

/// Reconciles the temporary identity with the server-assigned one, marks
/// the record Sent, and persists both facts.
fn resolve_sent(
    session: &mut ChatSession,
    ctx: &SendContext,
    identity: String,
    receipt: &SendReceipt,
) -> String {
    let final_identity = receipt
        .assigned_identity()
        .map(str::to_owned)
        .unwrap_or_else(|| identity.clone());

    session.store_mut().mutate(
        &identity,
        MessagePatch {
            status: Some(DeliveryStatus::Sent),
            new_identity: (final_identity != identity).then(|| final_identity.clone()),
            ..Default::default()
        },
    );

    if final_identity != identity {
        if let Some(secondary) = receipt.server_secondary_id.as_deref() {
            session.store_mut().register_alias(secondary, &final_identity);
        }
        let new = NewIdentifiers {
            identity: final_identity.clone(),
            secondary: receipt.server_secondary_id.clone(),
            record_id: receipt.server_record_id.clone(),
        };
        if let Err(error) = ctx.cache.rename_identity(&identity, &new) {
            tracing::warn!(
                %identity,
                new_identity = %final_identity,
                reason = %error.0,
                "cache rename failed"
            );
        }
    }

    if let Err(error) = ctx
        .cache
        .update_status(&final_identity, DeliveryStatus::Sent, None)
    {
        tracing::warn!(identity = %final_identity, reason = %error.0, "cache status write failed");
    }

    ctx.notifier
        .notify(session.chat_key(), &final_identity, DeliveryStatus::Sent);
    final_identity
}

fn resolve_failed(session: &mut ChatSession, ctx: &SendContext, identity: &str, reason: &str) {
    session.store_mut().mutate(
        identity,
        MessagePatch {
            status: Some(DeliveryStatus::Failed),
            failure_reason: Some(reason.to_owned()),
            ..Default::default()
        },
    );

    if let Err(error) = ctx
        .cache
        .update_status(identity, DeliveryStatus::Failed, Some(reason))
    {
        tracing::warn!(identity, reason = %error.0, "cache status write failed");
    }

    ctx.notifier
        .notify(session.chat_key(), identity, DeliveryStatus::Failed);
}

fn persist_upsert(session: &ChatSession, ctx: &SendContext, identity: &str) {
    let Some(message) = session.store().get(identity) else {
        return;
    };
    if let Err(error) = ctx
        .cache
        .upsert_messages(session.chat_key(), std::slice::from_ref(message))
    {
        tracing::warn!(identity, reason = %error.0, "cache write failed for pending send");
    }
}
