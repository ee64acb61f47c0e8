//! Pending access requests awaiting super-admin action.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the requester is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    /// Provision a new account
    #[serde(rename = "NEW_ACCOUNT")]
    NewAccount,
    /// Reset an existing account's password
    #[serde(rename = "PASSWORD_RESET")]
    PasswordReset,
}

/// A pending request. Removed from storage once approved or rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    /// Generated id
    pub id: String,
    /// Requested (or existing) display name
    pub username: String,
    /// Normalized email
    pub email: String,
    /// When the request was filed
    pub request_date: DateTime<Utc>,
    /// Request type
    #[serde(rename = "type")]
    pub kind: RequestKind,
}

impl AccessRequest {
    /// Creates a request with a fresh id. `email` must already be normalized.
    #[must_use]
    pub fn new(kind: RequestKind, username: String, email: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            email,
            request_date: now,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_request_type_field_name() {
        let req = AccessRequest::new(
            RequestKind::PasswordReset,
            "Ana".to_string(),
            "ana@x.com".to_string(),
            Utc::now(),
        );
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"type\":\"PASSWORD_RESET\""));
        assert!(json.contains("\"requestDate\""));
    }
}
