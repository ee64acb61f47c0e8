//! User accounts and roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known email of the protected super-admin account.
pub const SUPER_ADMIN_EMAIL: &str = "master@master.com";
/// Canonical super-admin password, restored by the repair pass.
pub const SUPER_ADMIN_PASSWORD: &str = "Master@01";
/// Canonical super-admin display name.
pub const SUPER_ADMIN_USERNAME: &str = "Administrador Master";
/// Password given to approved and reset accounts; must be changed on first login.
pub const DEFAULT_PASSWORD: &str = "123456";

/// Access level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Full control plus user administration
    #[serde(rename = "MASTER")]
    SuperAdmin,
    /// May change region records
    #[serde(rename = "EDITOR")]
    Editor,
    /// Read-only
    #[serde(rename = "VIEWER")]
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SuperAdmin => "super-admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        })
    }
}

/// Trims and lowercases an email for comparison and storage.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A stored user account. The password is kept in plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Display name
    pub username: String,
    /// Login email; unique case-insensitively
    pub email: String,
    /// Access level
    pub role: Role,
    /// Inactive accounts cannot log in
    pub is_active: bool,
    /// Forces a password change on the next login
    pub is_first_login: bool,
    /// Plaintext password
    pub password: String,
}

impl UserAccount {
    /// The canonical super-admin account.
    #[must_use]
    pub fn super_admin() -> Self {
        Self {
            username: SUPER_ADMIN_USERNAME.to_string(),
            email: SUPER_ADMIN_EMAIL.to_string(),
            role: Role::SuperAdmin,
            is_active: true,
            is_first_login: false,
            password: SUPER_ADMIN_PASSWORD.to_string(),
        }
    }

    /// A freshly approved account holding the default password.
    #[must_use]
    pub fn provisioned(username: String, email: String, role: Role) -> Self {
        Self {
            username,
            email,
            role,
            is_active: true,
            is_first_login: true,
            password: DEFAULT_PASSWORD.to_string(),
        }
    }

    /// Case-insensitive email comparison.
    #[must_use]
    pub fn has_email(&self, email: &str) -> bool {
        normalize_email(&self.email) == normalize_email(email)
    }

    /// The protected account is recognised by its well-known email or its role.
    #[must_use]
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin || self.has_email(SUPER_ADMIN_EMAIL)
    }

    /// Whether the stored super-admin differs from the canonical one.
    #[must_use]
    pub(crate) fn super_admin_drifted(&self) -> bool {
        self.password != SUPER_ADMIN_PASSWORD || !self.is_active || self.role != Role::SuperAdmin
    }
}

/// Account as it may appear in older documents, with optional flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredAccount {
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_first_login: Option<bool>,
    #[serde(default)]
    pub password: Option<String>,
}

impl StoredAccount {
    /// Fills missing flags. Returns the account and whether anything was patched.
    pub(crate) fn upgrade(self) -> (UserAccount, bool) {
        let patched = self.is_active.is_none() || self.is_first_login.is_none();
        let account = UserAccount {
            username: self.username,
            email: self.email,
            role: self.role,
            is_active: self.is_active.unwrap_or(true),
            is_first_login: self.is_first_login.unwrap_or(false),
            password: self.password.unwrap_or_default(),
        };
        (account, patched)
    }
}
