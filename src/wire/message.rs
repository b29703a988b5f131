use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::identity::{derive_identity, CanonicalPayload, IdentityCandidates};
use crate::domain::message::{
    ComponentKind, DeliveryStatus, Direction, MediaKind, MediaParameter, Message,
    MessageContent, PartyMeta, TemplateComponent, TemplateContent, TemplateParameter,
};

/// Message as delivered by the remote history endpoint and the live-push
/// channel, before normalization. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireMessage {
    /// Server message id.
    pub message_id: Option<String>,
    /// Platform message id.
    pub wamid: Option<String>,
    pub id: Option<String>,
    /// Locally generated id of an optimistic send, echoed back by some paths.
    pub local_id: Option<String>,
    /// Epoch millis.
    pub timestamp: Option<i64>,
    /// Server-supplied creation date string, used when `timestamp` is absent.
    pub created_at: Option<String>,
    pub from_me: Option<bool>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub body: Option<String>,
    pub caption: Option<String>,
    pub media_url: Option<String>,
    pub media_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub location_name: Option<String>,
    pub address: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub status: Option<String>,
    pub failure_reason: Option<String>,
    pub template: Option<WireTemplate>,
    pub sent_by: Option<WireParty>,
    pub read_by: Option<WireParty>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireTemplate {
    pub name: Option<String>,
    pub body: Option<String>,
    pub components: Vec<WireComponent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireComponent {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub text: Option<String>,
    pub parameters: Vec<WireParameter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireParameter {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub text: Option<String>,
    /// Fallback value provided by the template definition.
    pub example: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireParty {
    pub name: Option<String>,
    pub handle: Option<String>,
    pub contact: Option<String>,
}

impl WireMessage {
    /// Secondary identity the remote may also key this record by, when it
    /// differs from whatever `normalize` derives as the canonical identity.
    pub fn secondary_identity(&self) -> Option<&str> {
        self.wamid.as_deref().filter(|w| !w.is_empty())
    }

    /// Normalizes the wire record into a domain message. Identity derivation
    /// never fails: in the worst case it hashes the canonical payload.
    pub fn normalize(&self) -> Message {
        let kind_label = self.kind.as_deref().unwrap_or("text");
        let timestamp_ms = self
            .timestamp
            .or_else(|| self.created_at.as_deref().and_then(parse_creation_date))
            .unwrap_or(0);

        let content = self.content(kind_label);
        let body = self.body_for(&content);

        let payload_name = match &content {
            MessageContent::Media { name, .. } => name.clone(),
            MessageContent::Location { name, .. } => name.clone(),
            MessageContent::Contact { name, .. } => name.clone(),
            MessageContent::Template(template) => template.name.clone(),
            MessageContent::Text => String::new(),
        };

        let identity = derive_identity(
            &IdentityCandidates {
                server_id: self.message_id.as_deref(),
                platform_id: self.wamid.as_deref(),
                generic_id: self.id.as_deref(),
                local_id: self.local_id.as_deref(),
                timestamp_ms: self.timestamp,
                created_at: self.created_at.as_deref(),
            },
            &CanonicalPayload {
                kind: kind_label,
                body: &body,
                media_ref: self.media_url.as_deref().unwrap_or(""),
                name: &payload_name,
                timestamp_ms,
            },
        );

        let direction = if self.from_me.unwrap_or(false) {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };

        Message {
            identity,
            direction,
            status: match direction {
                Direction::Outgoing => {
                    self.status.as_deref().and_then(DeliveryStatus::parse)
                }
                Direction::Incoming => None,
            },
            failure_reason: self.failure_reason.clone().filter(|r| !r.is_empty()),
            timestamp_ms,
            body,
            content,
            sent_by: self.sent_by.as_ref().map(WireParty::to_meta),
            read_by: self.read_by.as_ref().map(WireParty::to_meta),
        }
    }

    fn content(&self, kind_label: &str) -> MessageContent {
        if let Some(kind) = MediaKind::parse(kind_label) {
            return MessageContent::Media {
                kind,
                url: self.media_url.clone().unwrap_or_default(),
                name: self.media_name.clone().unwrap_or_default(),
            };
        }

        match kind_label {
            "location" => MessageContent::Location {
                latitude: self.latitude.unwrap_or(0.0),
                longitude: self.longitude.unwrap_or(0.0),
                name: self.location_name.clone().unwrap_or_default(),
                address: self.address.clone().unwrap_or_default(),
            },
            "contact" => MessageContent::Contact {
                name: self.contact_name.clone().unwrap_or_default(),
                phone: self.contact_phone.clone().unwrap_or_default(),
                email: self.contact_email.clone().unwrap_or_default(),
            },
            "template" => MessageContent::Template(
                self.template
                    .as_ref()
                    .map(WireTemplate::to_content)
                    .unwrap_or_default(),
            ),
            _ => MessageContent::Text,
        }
    }

    fn body_for(&self, content: &MessageContent) -> String {
        match content {
            MessageContent::Media { .. } => self
                .caption
                .clone()
                .or_else(|| self.body.clone())
                .unwrap_or_default(),
            MessageContent::Template(template) => self
                .body
                .clone()
                .filter(|b| !b.is_empty())
                .or_else(|| template.resolved_body())
                .unwrap_or_default(),
            _ => self.body.clone().unwrap_or_default(),
        }
    }
}

impl WireParty {
    fn to_meta(&self) -> PartyMeta {
        PartyMeta {
            display_name: self.name.clone().unwrap_or_default(),
            handle: self.handle.clone().unwrap_or_default(),
            contact: self.contact.clone().unwrap_or_default(),
        }
    }
}

impl WireTemplate {
    fn to_content(&self) -> TemplateContent {
        TemplateContent {
            name: self.name.clone().unwrap_or_default(),
            body_text: self.body.clone().filter(|b| !b.is_empty()),
            components: self.components.iter().map(WireComponent::to_component).collect(),
        }
    }
}

impl WireComponent {
    fn to_component(&self) -> TemplateComponent {
        let kind = match self
            .kind
            .as_deref()
            .unwrap_or("")
            .to_ascii_uppercase()
            .as_str()
        {
            "HEADER" => ComponentKind::Header,
            "BODY" => ComponentKind::Body,
            "FOOTER" => ComponentKind::Footer,
            "BUTTON" | "BUTTONS" => ComponentKind::Button,
            _ => ComponentKind::Other,
        };

        TemplateComponent {
            kind,
            text: self.text.clone(),
            parameters: self.parameters.iter().map(WireParameter::to_parameter).collect(),
        }
    }
}

impl WireParameter {
    fn to_parameter(&self) -> TemplateParameter {
        let media = self
            .kind
            .as_deref()
            .and_then(MediaKind::parse)
            .zip(self.url.clone())
            .map(|(kind, url)| MediaParameter { kind, url });

        TemplateParameter {
            value: self.text.clone().or_else(|| self.example.clone()),
            media,
        }
    }
}

fn parse_creation_date(raw: &str) -> Option<i64> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp_millis());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::HASHED_IDENTITY_TAG;
    use crate::domain::message::MessageKind;

    #[test]
    fn normalizes_plain_incoming_text() {
        let wire = WireMessage {
            message_id: Some("m-1".to_owned()),
            body: Some("Hello".to_owned()),
            timestamp: Some(1000),
            ..Default::default()
        };

        let message = wire.normalize();

        assert_eq!(message.identity, "m-1");
        assert_eq!(message.direction, Direction::Incoming);
        assert_eq!(message.status, None);
        assert_eq!(message.body, "Hello");
        assert_eq!(message.kind(), MessageKind::Text);
    }

    #[test]
    fn identity_prefers_server_id_then_wamid() {
        let wire = WireMessage {
            wamid: Some("wamid.X".to_owned()),
            id: Some("g-1".to_owned()),
            timestamp: Some(1000),
            ..Default::default()
        };

        assert_eq!(wire.normalize().identity, "wamid.X");
        assert_eq!(wire.secondary_identity(), Some("wamid.X"));
    }

    #[test]
    fn identity_falls_back_to_payload_hash() {
        let wire = WireMessage {
            body: Some("no ids at all".to_owned()),
            ..Default::default()
        };

        assert!(wire.normalize().identity.starts_with(HASHED_IDENTITY_TAG));
    }

    #[test]
    fn timestamp_derives_from_creation_date_string() {
        let wire = WireMessage {
            message_id: Some("m-1".to_owned()),
            created_at: Some("2026-02-14T12:00:00+00:00".to_owned()),
            ..Default::default()
        };

        let message = wire.normalize();

        assert!(message.timestamp_ms > 0);
    }

    #[test]
    fn media_caption_becomes_the_body() {
        let wire = WireMessage {
            message_id: Some("m-2".to_owned()),
            kind: Some("image".to_owned()),
            caption: Some("the beach".to_owned()),
            media_url: Some("https://cdn/1.jpg".to_owned()),
            media_name: Some("1.jpg".to_owned()),
            timestamp: Some(1000),
            ..Default::default()
        };

        let message = wire.normalize();

        assert_eq!(message.kind(), MessageKind::Image);
        assert_eq!(message.body, "the beach");
        assert_eq!(message.media_url(), Some("https://cdn/1.jpg"));
    }

    #[test]
    fn outgoing_status_is_parsed_and_incoming_status_dropped() {
        let outgoing = WireMessage {
            message_id: Some("m-3".to_owned()),
            from_me: Some(true),
            status: Some("delivered".to_owned()),
            timestamp: Some(1000),
            ..Default::default()
        };
        let incoming = WireMessage {
            status: Some("delivered".to_owned()),
            ..outgoing.clone()
        };
        let incoming = WireMessage {
            from_me: Some(false),
            ..incoming
        };

        assert_eq!(
            outgoing.normalize().status,
            Some(DeliveryStatus::Delivered)
        );
        assert_eq!(incoming.normalize().status, None);
    }

    #[test]
    fn template_body_resolves_placeholders_during_normalization() {
        let wire = WireMessage {
            message_id: Some("m-4".to_owned()),
            kind: Some("template".to_owned()),
            timestamp: Some(1000),
            template: Some(WireTemplate {
                name: Some("greeting".to_owned()),
                body: Some("Hi {{1}}!".to_owned()),
                components: vec![WireComponent {
                    kind: Some("BODY".to_owned()),
                    text: None,
                    parameters: vec![WireParameter {
                        kind: Some("text".to_owned()),
                        text: Some("Ana".to_owned()),
                        example: None,
                        url: None,
                    }],
                }],
            }),
            ..Default::default()
        };

        let message = wire.normalize();

        assert_eq!(message.body, "Hi Ana!");
        assert_eq!(message.kind(), MessageKind::Template);
    }

    #[test]
    fn template_header_media_parameter_maps_through() {
        let wire = WireMessage {
            message_id: Some("m-5".to_owned()),
            kind: Some("template".to_owned()),
            timestamp: Some(1000),
            template: Some(WireTemplate {
                name: Some("offer".to_owned()),
                body: Some("Offer".to_owned()),
                components: vec![WireComponent {
                    kind: Some("HEADER".to_owned()),
                    text: None,
                    parameters: vec![WireParameter {
                        kind: Some("image".to_owned()),
                        text: None,
                        example: None,
                        url: Some("https://cdn/h.jpg".to_owned()),
                    }],
                }],
            }),
            ..Default::default()
        };

        assert_eq!(wire.normalize().display_kind(), MessageKind::Image);
    }

    #[test]
    fn wire_shape_deserializes_from_camel_case_json() {
        let raw = r#"{
            "messageId": "m-6",
            "wamid": "wamid.Z",
            "fromMe": true,
            "type": "text",
            "body": "hey",
            "timestamp": 1700000000000,
            "status": "sent",
            "sentBy": { "name": "Agent", "handle": "@agent", "contact": "+55 11" }
        }"#;

        let wire: WireMessage = serde_json::from_str(raw).expect("wire json should parse");
        let message = wire.normalize();

        assert_eq!(message.identity, "m-6");
        assert_eq!(message.status, Some(DeliveryStatus::Sent));
        assert_eq!(
            message.sent_by.map(|p| p.display_name),
            Some("Agent".to_owned())
        );
    }
}
