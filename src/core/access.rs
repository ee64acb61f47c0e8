//! Access request workflow.
//!
//! Anyone may file a new-account or password-reset request. The super-admin
//! approves or rejects it, and either way the request leaves the pending
//! table.

use crate::{
    core::{
        authz::{Action, require},
        store::Store,
    },
    errors::{Error, Result},
    models::{
        AccessRequest, Actor, DEFAULT_PASSWORD, RequestKind, Role, UserAccount, normalize_email,
    },
};
use chrono::Utc;
use tracing::info;

/// What approving a request did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// A new account was provisioned
    AccountCreated(UserAccount),
    /// An existing account's password was reset to the default
    PasswordReset(UserAccount),
    /// Nothing to do (account already existed or no longer exists); the
    /// request was dropped
    Discarded,
}

impl ApprovalOutcome {
    const fn label(&self) -> &'static str {
        match self {
            Self::AccountCreated(_) => "account created",
            Self::PasswordReset(_) => "password reset",
            Self::Discarded => "discarded",
        }
    }
}

/// Files a new-account request. Returns `None` when a new-account request is
/// already pending for this email.
pub async fn create_access_request(
    store: &Store,
    username: &str,
    email: &str,
) -> Result<Option<AccessRequest>> {
    let email = normalize_email(email);
    if username.trim().is_empty() || email.is_empty() {
        return Err(Error::validation("Name and email are required."));
    }

    let mut requests = store.list_requests().await?;
    if requests
        .iter()
        .any(|r| r.kind == RequestKind::NewAccount && normalize_email(&r.email) == email)
    {
        info!("Ignoring duplicate access request for {}", email);
        return Ok(None);
    }

    let request = AccessRequest::new(
        RequestKind::NewAccount,
        username.trim().to_string(),
        email,
        Utc::now(),
    );
    requests.push(request.clone());
    store.put_requests(&requests).await?;

    info!("Access request filed for {}", request.email);
    Ok(Some(request))
}

/// Files a password-reset request for an existing, non-protected account.
///
/// # Errors
/// - [`Error::NotFound`] when no account has this email
/// - [`Error::Forbidden`] when the account is the super-admin
/// - [`Error::DuplicatePending`] when any request is pending for this email
pub async fn create_password_reset_request(store: &Store, email: &str) -> Result<AccessRequest> {
    let email = normalize_email(email);
    let account = store
        .find_user(&email)
        .await?
        .ok_or_else(|| Error::not_found("User", email.clone()))?;

    if account.is_super_admin() {
        return Err(Error::forbidden(
            "The super-admin password must be reset through technical support.",
        ));
    }

    let mut requests = store.list_requests().await?;
    if requests.iter().any(|r| normalize_email(&r.email) == email) {
        return Err(Error::DuplicatePending { email });
    }

    let request = AccessRequest::new(RequestKind::PasswordReset, account.username, email, Utc::now());
    requests.push(request.clone());
    store.put_requests(&requests).await?;

    info!("Password reset requested for {}", request.email);
    Ok(request)
}

/// Pending requests, oldest first.
pub async fn list_pending_requests(store: &Store, actor: &Actor) -> Result<Vec<AccessRequest>> {
    require(actor, Action::ManageUsers)?;
    store.list_requests().await
}

/// Looks up a pending request by id.
async fn find_request(store: &Store, request_id: &str) -> Result<AccessRequest> {
    store
        .list_requests()
        .await?
        .into_iter()
        .find(|r| r.id == request_id)
        .ok_or_else(|| Error::not_found("Request", request_id))
}

/// Removes a request by id from the pending table.
async fn drop_request(store: &Store, request_id: &str) -> Result<()> {
    let mut requests = store.list_requests().await?;
    let before = requests.len();
    requests.retain(|r| r.id != request_id);
    if requests.len() == before {
        return Err(Error::not_found("Request", request_id));
    }
    store.put_requests(&requests).await
}

/// Approves a pending request.
///
/// New-account requests create an account with `role` (viewer by default)
/// and the default password. Reset requests restore the default password.
/// Both force a password change at next login.
///
/// The super-admin calls this from the user administration screen. The
/// account change is written before the request leaves the pending table,
/// so a failed write leaves the request in place to approve again.
pub async fn approve_request(
    store: &Store,
    actor: &Actor,
    request_id: &str,
    role: Option<Role>,
) -> Result<ApprovalOutcome> {
    require(actor, Action::ManageUsers)?;
    if role == Some(Role::SuperAdmin) {
        return Err(Error::forbidden("The super-admin role cannot be granted."));
    }

    let request = find_request(store, request_id).await?;
    let mut users = store.list_users().await?;
    let existing = users.iter().position(|u| u.has_email(&request.email));

    let outcome = match (request.kind, existing) {
        (RequestKind::NewAccount, Some(_)) => ApprovalOutcome::Discarded,
        (RequestKind::NewAccount, None) => {
            let account = UserAccount::provisioned(
                request.username.clone(),
                request.email.clone(),
                role.unwrap_or(Role::Viewer),
            );
            users.push(account.clone());
            store.put_users(&users).await?;
            ApprovalOutcome::AccountCreated(account)
        }
        (RequestKind::PasswordReset, Some(idx)) if !users[idx].is_super_admin() => {
            let account = &mut users[idx];
            account.password = DEFAULT_PASSWORD.to_string();
            account.is_first_login = true;
            let account = account.clone();
            store.put_users(&users).await?;
            ApprovalOutcome::PasswordReset(account)
        }
        (RequestKind::PasswordReset, _) => ApprovalOutcome::Discarded,
    };
    drop_request(store, &request.id).await?;

    info!(
        "{} approved {:?} request for {}: {}",
        actor.username,
        request.kind,
        request.email,
        outcome.label()
    );
    Ok(outcome)
}

/// Drops a pending request without touching any account.
pub async fn reject_request(store: &Store, actor: &Actor, request_id: &str) -> Result<()> {
    require(actor, Action::ManageUsers)?;
    let request = find_request(store, request_id).await?;
    drop_request(store, &request.id).await?;
    info!("{} rejected request for {}", actor.username, request.email);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use crate::core::user::{delete_account, validate_login};
    use crate::models::SUPER_ADMIN_EMAIL;
    use crate::test_utils::*;
    use sea_orm::ConnectionTrait;

    #[tokio::test]
    async fn test_create_access_request_normalizes_email() -> Result<()> {
        let store = setup_test_store().await?;
        let request = create_access_request(&store, "Ana", "  Ana@X.com ").await?.unwrap();

        assert_eq!(request.email, "ana@x.com");
        assert_eq!(request.kind, RequestKind::NewAccount);
        assert_eq!(store.list_requests().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_access_request_is_ignored() -> Result<()> {
        let store = setup_test_store().await?;
        create_access_request(&store, "Ana", "ana@x.com").await?;
        let second = create_access_request(&store, "Ana B", "ANA@x.com").await?;

        assert!(second.is_none());
        assert_eq!(store.list_requests().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_access_request_requires_fields() -> Result<()> {
        let store = setup_test_store().await?;
        let result = create_access_request(&store, " ", "a@x.com").await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        let result = create_access_request(&store, "Ana", "   ").await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_end_to_end_approval() -> Result<()> {
        let store = setup_test_store().await?;
        let admin = admin_actor();

        let request = create_access_request(&store, "Ana", "ana@x.com").await?.unwrap();
        let outcome = approve_request(&store, &admin, &request.id, Some(Role::Editor)).await?;

        let ApprovalOutcome::AccountCreated(account) = outcome else {
            panic!("expected a new account, got {outcome:?}");
        };
        assert_eq!(account.role, Role::Editor);
        assert_eq!(account.password, DEFAULT_PASSWORD);
        assert!(account.is_first_login);
        assert!(account.is_active);
        assert!(store.list_requests().await?.is_empty());

        let logged_in = validate_login(&store, "ana@x.com", DEFAULT_PASSWORD).await?;
        assert!(logged_in.is_first_login);
        Ok(())
    }

    #[tokio::test]
    async fn test_approval_defaults_to_viewer() -> Result<()> {
        let store = setup_test_store().await?;
        let request = create_access_request(&store, "Vera", "vera@x.com").await?.unwrap();
        let outcome = approve_request(&store, &admin_actor(), &request.id, None).await?;

        assert!(matches!(
            outcome,
            ApprovalOutcome::AccountCreated(UserAccount { role: Role::Viewer, .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_approval_for_existing_account_is_discarded() -> Result<()> {
        let store = setup_test_store().await?;
        let admin = admin_actor();
        let request = create_access_request(&store, "Ana", "ana@x.com").await?.unwrap();
        store
            .put_users(&[
                UserAccount::super_admin(),
                create_test_user("Ana", "ana@x.com", Role::Editor),
            ])
            .await?;

        let outcome = approve_request(&store, &admin, &request.id, Some(Role::Viewer)).await?;
        assert_eq!(outcome, ApprovalOutcome::Discarded);

        let users = store.list_users().await?;
        assert_eq!(users.iter().filter(|u| u.has_email("ana@x.com")).count(), 1);
        assert_eq!(users.iter().find(|u| u.has_email("ana@x.com")).unwrap().role, Role::Editor);
        assert!(store.list_requests().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_approval_cannot_grant_super_admin() -> Result<()> {
        let store = setup_test_store().await?;
        let request = create_access_request(&store, "Eve", "eve@x.com").await?.unwrap();

        let result = approve_request(&store, &admin_actor(), &request.id, Some(Role::SuperAdmin)).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));
        assert_eq!(store.list_requests().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_only_super_admin_may_approve() -> Result<()> {
        let store = setup_test_store().await?;
        let request = create_access_request(&store, "Eve", "eve@x.com").await?.unwrap();

        let result = approve_request(&store, &editor_actor(), &request.id, None).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));
        let result = reject_request(&store, &viewer_actor(), &request.id).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));
        assert_eq!(store.list_requests().await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_request_errors() -> Result<()> {
        let store = setup_test_store().await?;

        let missing = create_password_reset_request(&store, "ghost@x.com").await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
        assert!(store.list_requests().await?.is_empty());

        let protected = create_password_reset_request(&store, SUPER_ADMIN_EMAIL).await;
        assert!(matches!(protected, Err(Error::Forbidden { .. })));

        seed_user(&store, create_test_user("Ana", "ana@x.com", Role::Editor)).await?;
        create_password_reset_request(&store, "ana@x.com").await?;
        let duplicate = create_password_reset_request(&store, " ANA@x.com").await;
        assert!(matches!(duplicate, Err(Error::DuplicatePending { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_blocked_by_pending_new_account_request() -> Result<()> {
        let store = setup_test_store().await?;
        seed_user(&store, create_test_user("Ana", "ana@x.com", Role::Editor)).await?;
        create_access_request(&store, "Ana", "ana@x.com").await?;

        let result = create_password_reset_request(&store, "ana@x.com").await;
        assert!(matches!(result, Err(Error::DuplicatePending { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_approval_restores_default_password() -> Result<()> {
        let store = setup_test_store().await?;
        let mut ana = create_test_user("Ana", "ana@x.com", Role::Editor);
        ana.password = "Secret@1".to_string();
        ana.is_first_login = false;
        seed_user(&store, ana).await?;

        let request = create_password_reset_request(&store, "ana@x.com").await?;
        assert_eq!(request.username, "Ana");
        assert_eq!(request.kind, RequestKind::PasswordReset);

        let outcome = approve_request(&store, &admin_actor(), &request.id, None).await?;
        let ApprovalOutcome::PasswordReset(account) = outcome else {
            panic!("expected a password reset, got {outcome:?}");
        };
        assert_eq!(account.password, DEFAULT_PASSWORD);
        assert!(account.is_first_login);
        assert_eq!(account.role, Role::Editor);
        assert!(store.list_requests().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_for_deleted_account_is_discarded() -> Result<()> {
        let store = setup_test_store().await?;
        seed_user(&store, create_test_user("Ana", "ana@x.com", Role::Editor)).await?;
        let request = create_password_reset_request(&store, "ana@x.com").await?;
        delete_account(&store, &admin_actor(), "ana@x.com").await?;

        let outcome = approve_request(&store, &admin_actor(), &request.id, None).await?;
        assert_eq!(outcome, ApprovalOutcome::Discarded);
        assert!(store.find_user("ana@x.com").await?.is_none());
        assert!(store.list_requests().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_approve_unknown_request_is_not_found() -> Result<()> {
        let store = setup_test_store().await?;
        create_access_request(&store, "Ana", "ana@x.com").await?;

        let result = approve_request(&store, &admin_actor(), "no-such-id", None).await;
        assert!(matches!(result, Err(Error::NotFound { kind: "Request", .. })));
        assert_eq!(store.list_requests().await?.len(), 1);
        assert!(store.find_user("ana@x.com").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_account_write_keeps_request_pending() -> Result<()> {
        let store = setup_test_store().await?;
        let request = create_access_request(&store, "Ana", "ana@x.com").await?.unwrap();
        store.list_users().await?;

        let users_key = store.key(crate::core::store::Table::Users);
        store
            .connection()
            .execute_unprepared(&format!(
                "CREATE TRIGGER lock_users BEFORE UPDATE ON documents \
                 WHEN OLD.key = '{users_key}' \
                 BEGIN SELECT RAISE(ABORT, 'user table locked'); END;"
            ))
            .await?;

        let result = approve_request(&store, &admin_actor(), &request.id, Some(Role::Editor)).await;
        assert!(matches!(result, Err(Error::Database(_))));

        let pending = store.list_requests().await?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, request.id);

        store
            .connection()
            .execute_unprepared("DROP TRIGGER lock_users;")
            .await?;
        let outcome = approve_request(&store, &admin_actor(), &request.id, Some(Role::Editor)).await?;
        assert!(matches!(outcome, ApprovalOutcome::AccountCreated(_)));
        assert!(store.list_requests().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reject_request() -> Result<()> {
        let store = setup_test_store().await?;
        let request = create_access_request(&store, "Ana", "ana@x.com").await?.unwrap();

        reject_request(&store, &admin_actor(), &request.id).await?;
        assert!(store.list_requests().await?.is_empty());
        assert!(store.find_user("ana@x.com").await?.is_none());

        let again = reject_request(&store, &admin_actor(), &request.id).await;
        assert!(matches!(again, Err(Error::NotFound { .. })));
        Ok(())
    }
}
