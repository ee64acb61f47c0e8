//! Role-based authorization.
//!
//! Every mutating entry point calls [`require`] with the acting user and the
//! action it is about to perform; the role matrix lives only in [`authorize`].

use crate::{
    errors::{Error, Result},
    models::{Actor, Role},
};
use tracing::warn;

/// Operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read region records and dashboards
    ViewRegions,
    /// Change status, notes, documents, deadlines, or contacts
    EditRegion,
    /// Produce the spreadsheet export of a region
    ExportRegion,
    /// Approve/reject requests and administer accounts
    ManageUsers,
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The action may proceed
    Allow,
    /// The action is refused, with a reason for the acting user
    Deny(String),
}

impl Decision {
    /// Whether the action may proceed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Decides whether `role` may perform `action`.
#[must_use]
pub fn authorize(role: Role, action: Action) -> Decision {
    match (role, action) {
        (Role::SuperAdmin, _)
        | (Role::Editor, Action::ViewRegions | Action::EditRegion | Action::ExportRegion)
        | (Role::Viewer, Action::ViewRegions | Action::ExportRegion) => Decision::Allow,
        (Role::Editor | Role::Viewer, Action::ManageUsers) => {
            Decision::Deny("Only the super-admin can manage users.".to_string())
        }
        (Role::Viewer, Action::EditRegion) => {
            Decision::Deny("Viewers have read-only access.".to_string())
        }
    }
}

/// Fails with [`Error::Forbidden`] unless the actor may perform `action`.
pub fn require(actor: &Actor, action: Action) -> Result<()> {
    match authorize(actor.role, action) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            warn!(
                "Denied {:?} for {} ({}): {}",
                action,
                actor.email,
                actor.role,
                reason
            );
            Err(Error::Forbidden { reason })
        }
    }
}
