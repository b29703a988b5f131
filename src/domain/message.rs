use serde::{Deserialize, Serialize};

/// Direction of a message relative to the local user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// Delivery status of an outgoing message. Incoming messages carry no status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl DeliveryStatus {
    /// Returns true when moving from `self` to `next` is a forward transition.
    ///
    /// Pending may resolve to Sent or Failed; Sent advances through Delivered
    /// and Read. Failed and Read are terminal. No transition moves backward.
    pub fn can_advance_to(self, next: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, next),
            (Pending, Sent)
                | (Pending, Failed)
                | (Sent, Delivered)
                | (Sent, Read)
                | (Delivered, Read)
        )
    }

    pub fn as_label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
            Self::Failed => "failed",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            "read" => Some(Self::Read),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Kind of binary attachment a media message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaKind {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

/// Resolved display kind of a message, used for list rendering and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Image,
    Video,
    Audio,
    Document,
    Location,
    Contact,
    Template,
}

impl MessageKind {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Location => "location",
            Self::Contact => "contact",
            Self::Template => "template",
        }
    }
}

impl From<MediaKind> for MessageKind {
    fn from(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => Self::Image,
            MediaKind::Video => Self::Video,
            MediaKind::Audio => Self::Audio,
            MediaKind::Document => Self::Document,
        }
    }
}

/// Component slot inside a template definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    Header,
    Body,
    Footer,
    Button,
    Other,
}

/// Media payload carried by a template parameter (header attachments).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaParameter {
    pub kind: MediaKind,
    pub url: String,
}

/// One positional template parameter: either a text value or a media slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateParameter {
    pub value: Option<String>,
    pub media: Option<MediaParameter>,
}

impl TemplateParameter {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            media: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateComponent {
    pub kind: ComponentKind,
    pub text: Option<String>,
    pub parameters: Vec<TemplateParameter>,
}

/// Template descriptor with its resolved component parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateContent {
    pub name: String,
    pub body_text: Option<String>,
    pub components: Vec<TemplateComponent>,
}

impl TemplateContent {
    fn component(&self, kind: ComponentKind) -> Option<&TemplateComponent> {
        self.components.iter().find(|c| c.kind == kind)
    }

    /// Positional parameters of the BODY component.
    pub fn body_parameters(&self) -> &[TemplateParameter] {
        self.component(ComponentKind::Body)
            .map(|c| c.parameters.as_slice())
            .unwrap_or(&[])
    }

    /// Media attachment carried by the HEADER component, if any.
    pub fn header_media(&self) -> Option<&MediaParameter> {
        self.component(ComponentKind::Header)?
            .parameters
            .iter()
            .find_map(|p| p.media.as_ref())
    }

    /// Raw body text before substitution: the template body field, falling
    /// back to the BODY component's text.
    pub fn raw_body(&self) -> Option<&str> {
        self.body_text
            .as_deref()
            .filter(|t| !t.is_empty())
            .or_else(|| {
                self.component(ComponentKind::Body)
                    .and_then(|c| c.text.as_deref())
                    .filter(|t| !t.is_empty())
            })
    }

    /// Body text with `{{n}}` placeholders substituted positionally.
    pub fn resolved_body(&self) -> Option<String> {
        self.raw_body()
            .map(|text| substitute_placeholders(text, self.body_parameters()))
    }
}

/// Substitutes `{{n}}` placeholders with the n-th parameter's value (1-based),
/// or the literal `Variable n` when no value exists. Malformed placeholders
/// are copied through unchanged.
pub fn substitute_placeholders(text: &str, parameters: &[TemplateParameter]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];

        match after_open.find("}}") {
            Some(close) if !after_open[..close].is_empty()
                && after_open[..close].chars().all(|c| c.is_ascii_digit()) =>
            {
                match after_open[..close].parse::<usize>() {
                    Ok(n) if n > 0 => {
                        let value = parameters
                            .get(n - 1)
                            .and_then(|p| p.value.clone())
                            .unwrap_or_else(|| format!("Variable {n}"));
                        out.push_str(&value);
                    }
                    _ => {
                        out.push_str("{{");
                        out.push_str(&after_open[..close]);
                        out.push_str("}}");
                    }
                }
                rest = &after_open[close + 2..];
            }
            _ => {
                out.push_str("{{");
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Kind-specific payload of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageContent {
    Text,
    Media {
        kind: MediaKind,
        url: String,
        name: String,
    },
    Location {
        latitude: f64,
        longitude: f64,
        name: String,
        address: String,
    },
    Contact {
        name: String,
        phone: String,
        email: String,
    },
    Template(TemplateContent),
}

/// Display metadata of the party that sent or read a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartyMeta {
    pub display_name: String,
    pub handle: String,
    pub contact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub identity: String,
    pub direction: Direction,
    /// Meaningful only for outgoing messages; `None` for incoming.
    pub status: Option<DeliveryStatus>,
    pub failure_reason: Option<String>,
    pub timestamp_ms: i64,
    /// Caption, text content, or template body with placeholders substituted.
    pub body: String,
    pub content: MessageContent,
    pub sent_by: Option<PartyMeta>,
    pub read_by: Option<PartyMeta>,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match &self.content {
            MessageContent::Text => MessageKind::Text,
            MessageContent::Media { kind, .. } => MessageKind::from(*kind),
            MessageContent::Location { .. } => MessageKind::Location,
            MessageContent::Contact { .. } => MessageKind::Contact,
            MessageContent::Template(_) => MessageKind::Template,
        }
    }

    /// Display kind: templates carrying header media surface as that media
    /// kind, everything else reports its own kind.
    pub fn display_kind(&self) -> MessageKind {
        match &self.content {
            MessageContent::Template(template) => template
                .header_media()
                .map(|media| MessageKind::from(media.kind))
                .unwrap_or(MessageKind::Template),
            _ => self.kind(),
        }
    }

    pub fn media_url(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Media { url, .. } => Some(url.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template_with_params(body: &str, values: &[&str]) -> TemplateContent {
        TemplateContent {
            name: "greeting".to_owned(),
            body_text: Some(body.to_owned()),
            components: vec![TemplateComponent {
                kind: ComponentKind::Body,
                text: None,
                parameters: values.iter().map(|v| TemplateParameter::text(*v)).collect(),
            }],
        }
    }

    #[test]
    fn pending_advances_to_sent_and_failed_only() {
        assert!(DeliveryStatus::Pending.can_advance_to(DeliveryStatus::Sent));
        assert!(DeliveryStatus::Pending.can_advance_to(DeliveryStatus::Failed));
        assert!(!DeliveryStatus::Pending.can_advance_to(DeliveryStatus::Read));
    }

    #[test]
    fn sent_advances_to_delivered_and_read() {
        assert!(DeliveryStatus::Sent.can_advance_to(DeliveryStatus::Delivered));
        assert!(DeliveryStatus::Sent.can_advance_to(DeliveryStatus::Read));
        assert!(DeliveryStatus::Delivered.can_advance_to(DeliveryStatus::Read));
    }

    #[test]
    fn no_status_moves_backward() {
        assert!(!DeliveryStatus::Failed.can_advance_to(DeliveryStatus::Pending));
        assert!(!DeliveryStatus::Sent.can_advance_to(DeliveryStatus::Pending));
        assert!(!DeliveryStatus::Read.can_advance_to(DeliveryStatus::Delivered));
        assert!(!DeliveryStatus::Failed.can_advance_to(DeliveryStatus::Sent));
    }

    #[test]
    fn status_labels_round_trip() {
        for status in [
            DeliveryStatus::Pending,
            DeliveryStatus::Sent,
            DeliveryStatus::Delivered,
            DeliveryStatus::Read,
            DeliveryStatus::Failed,
        ] {
            assert_eq!(DeliveryStatus::parse(status.as_label()), Some(status));
        }
        assert_eq!(DeliveryStatus::parse("unknown"), None);
    }

    #[test]
    fn substitutes_placeholders_in_order() {
        let template = template_with_params("Hi {{1}}, your code is {{2}}.", &["Ana", "42"]);

        assert_eq!(
            template.resolved_body().as_deref(),
            Some("Hi Ana, your code is 42.")
        );
    }

    #[test]
    fn missing_parameter_becomes_variable_literal() {
        let template = template_with_params("Hi {{1}}, see {{3}}.", &["Ana"]);

        assert_eq!(
            template.resolved_body().as_deref(),
            Some("Hi Ana, see Variable 3.")
        );
    }

    #[test]
    fn malformed_placeholders_are_left_intact() {
        let params = [TemplateParameter::text("x")];

        assert_eq!(
            substitute_placeholders("a {{ b }} c", &params),
            "a {{ b }} c"
        );
        assert_eq!(substitute_placeholders("open {{1", &params), "open {{1");
        assert_eq!(substitute_placeholders("zero {{0}}", &params), "zero {{0}}");
    }

    #[test]
    fn raw_body_falls_back_to_body_component_text() {
        let template = TemplateContent {
            name: "promo".to_owned(),
            body_text: None,
            components: vec![TemplateComponent {
                kind: ComponentKind::Body,
                text: Some("Deal for {{1}}".to_owned()),
                parameters: vec![TemplateParameter::text("you")],
            }],
        };

        assert_eq!(template.resolved_body().as_deref(), Some("Deal for you"));
    }

    #[test]
    fn template_with_header_media_displays_as_media_kind() {
        let message = Message {
            identity: "m-1".to_owned(),
            direction: Direction::Outgoing,
            status: Some(DeliveryStatus::Sent),
            failure_reason: None,
            timestamp_ms: 1000,
            body: "Offer".to_owned(),
            content: MessageContent::Template(TemplateContent {
                name: "offer".to_owned(),
                body_text: Some("Offer".to_owned()),
                components: vec![TemplateComponent {
                    kind: ComponentKind::Header,
                    text: None,
                    parameters: vec![TemplateParameter {
                        value: None,
                        media: Some(MediaParameter {
                            kind: MediaKind::Video,
                            url: "https://cdn/x.mp4".to_owned(),
                        }),
                    }],
                }],
            }),
            sent_by: None,
            read_by: None,
        };

        assert_eq!(message.kind(), MessageKind::Template);
        assert_eq!(message.display_kind(), MessageKind::Video);
    }

    #[test]
    fn plain_template_displays_as_template() {
        let message = Message {
            identity: "m-2".to_owned(),
            direction: Direction::Outgoing,
            status: Some(DeliveryStatus::Sent),
            failure_reason: None,
            timestamp_ms: 1000,
            body: "Hello".to_owned(),
            content: MessageContent::Template(template_with_params("Hello", &[])),
            sent_by: None,
            read_by: None,
        };

        assert_eq!(message.display_kind(), MessageKind::Template);
    }
}
