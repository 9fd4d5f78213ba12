//! Admin API payloads shared by menu-server and menu-client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::error::ApiResponse;

/// `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// `GET /api/products?action=version_check`
///
/// `hash` is the SHA-256 hex digest of the serialized document;
/// `version` counts writes since the server started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionCheck {
    pub hash: String,
    pub last_modified: DateTime<Utc>,
    pub version: u64,
}

/// `POST /api/auth/login` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /api/auth/login` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub username: String,
}

/// Body returned by delete endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_check_uses_camel_case() {
        let check = VersionCheck {
            hash: "abc".to_string(),
            last_modified: DateTime::parse_from_rfc3339("2025-01-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            version: 3,
        };
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["hash"], "abc");
        assert_eq!(json["lastModified"], "2025-01-01T10:00:00Z");
        assert_eq!(json["version"], 3);
    }
}
