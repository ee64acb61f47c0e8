//! The logged-in user and the acting-user context derived from it.

use super::user::{Role, UserAccount};
use serde::{Deserialize, Serialize};

/// Session copy of an account. Has no password field, so credentials never
/// reach the session document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// Display name
    pub username: String,
    /// Login email
    pub email: String,
    /// Access level at login time
    pub role: Role,
    /// Active flag at login time
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    /// Whether a password change is still pending
    #[serde(default)]
    pub is_first_login: bool,
}

const fn active_by_default() -> bool {
    true
}

impl From<&UserAccount> for SessionUser {
    fn from(account: &UserAccount) -> Self {
        Self {
            username: account.username.clone(),
            email: account.email.clone(),
            role: account.role,
            is_active: account.is_active,
            is_first_login: account.is_first_login,
        }
    }
}

impl SessionUser {
    /// Acting-user context for mutating operations.
    #[must_use]
    pub fn actor(&self) -> Actor {
        Actor {
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Identity and role of whoever invokes an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Recorded in history entries and change stamps
    pub username: String,
    /// Account email
    pub email: String,
    /// Consulted by the authorization check
    pub role: Role,
}

impl Actor {
    /// Builds an actor directly.
    pub fn new(username: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            role,
        }
    }

    /// Name used in change stamps; blank names become `"Unknown"`.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = self.username.trim();
        if name.is_empty() {
            "Unknown".to_string()
        } else {
            name.to_string()
        }
    }
}
