use sha2::{Digest, Sha256};

/// Tag prefixed to identities derived by hashing a canonical payload, so
/// they can never collide with server- or locally-assigned ids.
pub const HASHED_IDENTITY_TAG: &str = "gen-";

/// Candidate identity fields of a wire message, in precedence order.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCandidates<'a> {
    /// Server-assigned message id.
    pub server_id: Option<&'a str>,
    /// Platform message id (wamid).
    pub platform_id: Option<&'a str>,
    /// Generic id field some sources populate instead.
    pub generic_id: Option<&'a str>,
    /// Locally generated unique id (optimistic sends).
    pub local_id: Option<&'a str>,
    pub timestamp_ms: Option<i64>,
    /// Server-supplied creation date string.
    pub created_at: Option<&'a str>,
}

/// Fields hashed into a fallback identity when no candidate id exists.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalPayload<'a> {
    pub kind: &'a str,
    pub body: &'a str,
    pub media_ref: &'a str,
    pub name: &'a str,
    pub timestamp_ms: i64,
}

/// Derives a message identity by trying each candidate field in order and
/// falling back to a tagged hash of the canonical payload. Never empty.
pub fn derive_identity(candidates: &IdentityCandidates, payload: &CanonicalPayload) -> String {
    let fields = [
        candidates.server_id,
        candidates.platform_id,
        candidates.generic_id,
        candidates.local_id,
    ];
    for field in fields.into_iter().flatten() {
        if !field.is_empty() {
            return field.to_owned();
        }
    }

    if let Some(timestamp) = candidates.timestamp_ms {
        return timestamp.to_string();
    }

    if let Some(created_at) = candidates.created_at {
        if !created_at.is_empty() {
            return created_at.to_owned();
        }
    }

    hash_payload(payload)
}

fn hash_payload(payload: &CanonicalPayload) -> String {
    let canonical = format!(
        "{}|{}|{}|{}|{}",
        payload.kind, payload.body, payload.media_ref, payload.name, payload.timestamp_ms
    );
    let digest = Sha256::digest(canonical.as_bytes());
    format!("{HASHED_IDENTITY_TAG}{}", hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> CanonicalPayload<'static> {
        CanonicalPayload {
            kind: "text",
            body: "Hello",
            media_ref: "",
            name: "",
            timestamp_ms: 1000,
        }
    }

    #[test]
    fn prefers_server_id_over_everything() {
        let candidates = IdentityCandidates {
            server_id: Some("srv-1"),
            platform_id: Some("wamid.X"),
            generic_id: Some("g-1"),
            local_id: Some("temp_1"),
            timestamp_ms: Some(1000),
            created_at: Some("2026-01-01"),
        };

        assert_eq!(derive_identity(&candidates, &payload()), "srv-1");
    }

    #[test]
    fn falls_through_empty_fields_in_order() {
        let candidates = IdentityCandidates {
            server_id: Some(""),
            platform_id: Some("wamid.X"),
            ..Default::default()
        };

        assert_eq!(derive_identity(&candidates, &payload()), "wamid.X");
    }

    #[test]
    fn uses_timestamp_before_created_at() {
        let candidates = IdentityCandidates {
            timestamp_ms: Some(1234),
            created_at: Some("2026-01-01"),
            ..Default::default()
        };

        assert_eq!(derive_identity(&candidates, &payload()), "1234");
    }

    #[test]
    fn hashes_canonical_payload_when_no_field_exists() {
        let candidates = IdentityCandidates::default();

        let identity = derive_identity(&candidates, &payload());

        assert!(identity.starts_with(HASHED_IDENTITY_TAG));
        assert!(identity.len() > HASHED_IDENTITY_TAG.len());
    }

    #[test]
    fn hashed_identity_is_deterministic_and_payload_sensitive() {
        let candidates = IdentityCandidates::default();
        let first = derive_identity(&candidates, &payload());
        let second = derive_identity(&candidates, &payload());

        let other = derive_identity(
            &candidates,
            &CanonicalPayload {
                body: "Different",
                ..payload()
            },
        );

        assert_eq!(first, second);
        assert_ne!(first, other);
    }
}
