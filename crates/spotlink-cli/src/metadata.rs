use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request identifier (UUID v4) attached to every command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Command metadata printed next to the data.
///
/// Field order is fixed to keep serialization deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub request_id: RequestId,
    pub command: String,
    pub latency_ms: u64,
    pub cache_hit: bool,
}

impl Metadata {
    pub fn new(
        request_id: RequestId,
        command: impl Into<String>,
        latency_ms: u64,
        cache_hit: bool,
    ) -> Self {
        Self {
            request_id,
            command: command.into(),
            latency_ms,
            cache_hit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_is_uuid_v4() {
        let request_id = RequestId::new_v4();
        assert_eq!(request_id.0.get_version_num(), 4);
    }

    #[test]
    fn metadata_serializes_in_declaration_order() {
        let uuid = Uuid::parse_str("123e4567-e89b-42d3-a456-426614174000").expect("valid uuid");
        let metadata = Metadata::new(RequestId(uuid), "price", 42, true);

        let rendered = serde_json::to_string(&metadata).expect("serializes");

        assert_eq!(
            rendered,
            "{\"request_id\":\"123e4567-e89b-42d3-a456-426614174000\",\"command\":\"price\",\"latency_ms\":42,\"cache_hit\":true}"
        );
    }
}
