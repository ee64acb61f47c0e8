//! User account lifecycle.
//!
//! The super-admin account is protected: no operation here changes its
//! role or active flag, or removes it. History entries keep a plain username,
//! so deleting an account never rewrites a region's timeline.

use crate::{
    core::{
        authz::{Action, require},
        store::Store,
    },
    errors::{Error, Result},
    models::{Actor, Role, SessionUser, UserAccount, normalize_email},
};
use tracing::{info, warn};

/// Checks credentials. Email matching ignores case, the password must match exactly.
///
/// # Errors
/// - [`Error::InvalidCredentials`] when no account matches
/// - [`Error::AccountInactive`] when the matching account is deactivated
pub async fn validate_login(store: &Store, email: &str, password: &str) -> Result<SessionUser> {
    let account = store
        .list_users()
        .await?
        .into_iter()
        .find(|u| u.has_email(email) && u.password == password)
        .ok_or(Error::InvalidCredentials)?;

    if !account.is_active {
        warn!("Login refused for inactive account {}", account.email);
        return Err(Error::AccountInactive {
            email: account.email,
        });
    }

    Ok(SessionUser::from(&account))
}

/// Sets a new password and clears the first-login flag, in the account and
/// in the stored session when it belongs to the same user. Strength rules
/// are enforced by the caller.
pub async fn change_password(store: &Store, email: &str, new_password: &str) -> Result<()> {
    let mut users = store.list_users().await?;
    let account = users
        .iter_mut()
        .find(|u| u.has_email(email))
        .ok_or_else(|| Error::not_found("User", normalize_email(email)))?;

    account.password = new_password.to_string();
    account.is_first_login = false;
    store.put_users(&users).await?;

    if let Some(mut session) = store.load_session().await? {
        if normalize_email(&session.email) == normalize_email(email) {
            session.is_first_login = false;
            store.save_session(&session).await?;
        }
    }

    info!("Password changed for {}", normalize_email(email));
    Ok(())
}

/// All accounts, for user administration.
pub async fn list_users(store: &Store, actor: &Actor) -> Result<Vec<UserAccount>> {
    require(actor, Action::ManageUsers)?;
    store.list_users().await
}

/// Applies `edit` to a non-protected account and stores the table.
async fn edit_account<F>(store: &Store, actor: &Actor, email: &str, edit: F) -> Result<UserAccount>
where
    F: FnOnce(&mut UserAccount),
{
    require(actor, Action::ManageUsers)?;
    let mut users = store.list_users().await?;
    let account = users
        .iter_mut()
        .find(|u| u.has_email(email))
        .ok_or_else(|| Error::not_found("User", normalize_email(email)))?;

    if account.is_super_admin() {
        return Err(Error::forbidden("The super-admin account cannot be modified."));
    }

    edit(account);
    let updated = account.clone();
    store.put_users(&users).await?;
    Ok(updated)
}

/// Activates or deactivates an account.
pub async fn set_active(
    store: &Store,
    actor: &Actor,
    email: &str,
    active: bool,
) -> Result<UserAccount> {
    let account = edit_account(store, actor, email, |u| u.is_active = active).await?;
    info!(
        "{} {} {}",
        actor.username,
        if active { "activated" } else { "deactivated" },
        account.email
    );
    Ok(account)
}

/// Changes an account's role. The super-admin role can never be granted here.
pub async fn set_role(store: &Store, actor: &Actor, email: &str, role: Role) -> Result<UserAccount> {
    if role == Role::SuperAdmin {
        return Err(Error::forbidden("The super-admin role cannot be granted."));
    }
    let account = edit_account(store, actor, email, |u| u.role = role).await?;
    info!("{} set role of {} to {}", actor.username, account.email, role);
    Ok(account)
}

/// Removes an account.
pub async fn delete_account(store: &Store, actor: &Actor, email: &str) -> Result<()> {
    require(actor, Action::ManageUsers)?;
    let mut users = store.list_users().await?;
    let idx = users
        .iter()
        .position(|u| u.has_email(email))
        .ok_or_else(|| Error::not_found("User", normalize_email(email)))?;

    if users[idx].is_super_admin() {
        return Err(Error::forbidden("The super-admin account cannot be deleted."));
    }

    let removed = users.remove(idx);
    store.put_users(&users).await?;
    info!("{} deleted account {}", actor.username, removed.email);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::region::append_history_note;
    use crate::models::{DEFAULT_PASSWORD, SUPER_ADMIN_EMAIL, SUPER_ADMIN_PASSWORD};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_super_admin_can_log_in() -> Result<()> {
        let store = setup_test_store().await?;
        let session = validate_login(&store, "MASTER@master.com", SUPER_ADMIN_PASSWORD).await?;
        assert_eq!(session.role, Role::SuperAdmin);
        assert!(!session.is_first_login);
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid() -> Result<()> {
        let store = setup_test_store().await?;
        let result = validate_login(&store, SUPER_ADMIN_EMAIL, "master@01").await;
        assert!(matches!(result, Err(Error::InvalidCredentials)));
        let result = validate_login(&store, "nobody@x.com", "x").await;
        assert!(matches!(result, Err(Error::InvalidCredentials)));
        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_account_cannot_log_in() -> Result<()> {
        let store = setup_test_store().await?;
        seed_user(&store, create_test_user("Ana", "ana@x.com", Role::Editor)).await?;
        set_active(&store, &admin_actor(), "ana@x.com", false).await?;

        let result = validate_login(&store, "ana@x.com", DEFAULT_PASSWORD).await;
        assert!(matches!(result, Err(Error::AccountInactive { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_change_password_clears_first_login() -> Result<()> {
        let store = setup_test_store().await?;
        seed_user(&store, create_test_user("Ana", "ana@x.com", Role::Editor)).await?;
        let session = validate_login(&store, "ana@x.com", DEFAULT_PASSWORD).await?;
        store.save_session(&session).await?;

        change_password(&store, "ANA@x.com", "Better@1").await?;

        let account = store.find_user("ana@x.com").await?.unwrap();
        assert_eq!(account.password, "Better@1");
        assert!(!account.is_first_login);
        assert!(!store.load_session().await?.unwrap().is_first_login);
        assert!(validate_login(&store, "ana@x.com", DEFAULT_PASSWORD).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_super_admin_is_untouchable() -> Result<()> {
        let store = setup_test_store().await?;
        let admin = admin_actor();
        let before = store.find_user(SUPER_ADMIN_EMAIL).await?.unwrap();

        for active in [true, false] {
            let result = set_active(&store, &admin, SUPER_ADMIN_EMAIL, active).await;
            assert!(matches!(result, Err(Error::Forbidden { .. })));
        }
        for role in [Role::Editor, Role::Viewer, Role::SuperAdmin] {
            let result = set_role(&store, &admin, SUPER_ADMIN_EMAIL, role).await;
            assert!(matches!(result, Err(Error::Forbidden { .. })));
        }
        let result = delete_account(&store, &admin, SUPER_ADMIN_EMAIL).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));

        assert_eq!(store.find_user(SUPER_ADMIN_EMAIL).await?.unwrap(), before);
        Ok(())
    }

    #[tokio::test]
    async fn test_role_escalation_refused() -> Result<()> {
        let store = setup_test_store().await?;
        seed_user(&store, create_test_user("Ana", "ana@x.com", Role::Editor)).await?;

        let result = set_role(&store, &admin_actor(), "ana@x.com", Role::SuperAdmin).await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));
        assert_eq!(store.find_user("ana@x.com").await?.unwrap().role, Role::Editor);

        let updated = set_role(&store, &admin_actor(), "ana@x.com", Role::Viewer).await?;
        assert_eq!(updated.role, Role::Viewer);
        Ok(())
    }

    #[tokio::test]
    async fn test_editor_cannot_administer_users() -> Result<()> {
        let store = setup_test_store().await?;
        seed_user(&store, create_test_user("Vera", "vera@x.com", Role::Viewer)).await?;
        let editor = editor_actor();

        assert!(matches!(
            set_role(&store, &editor, "vera@x.com", Role::Editor).await,
            Err(Error::Forbidden { .. })
        ));
        assert!(matches!(
            delete_account(&store, &editor, "vera@x.com").await,
            Err(Error::Forbidden { .. })
        ));
        assert!(matches!(list_users(&store, &editor).await, Err(Error::Forbidden { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_keeps_history_intact() -> Result<()> {
        let store = setup_test_store().await?;
        let ana = create_test_user("Ana", "ana@x.com", Role::Editor);
        seed_user(&store, ana.clone()).await?;

        let ana_actor = Actor::new(ana.username.clone(), ana.email.clone(), ana.role);
        append_history_note(&store, &ana_actor, "AL", "Called the office").await?;

        delete_account(&store, &admin_actor(), "ana@x.com").await?;
        assert!(store.find_user("ana@x.com").await?.is_none());

        let region = store.get_region("AL").await?;
        assert_eq!(region.status_history[0].author(), "Ana");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() -> Result<()> {
        let store = setup_test_store().await?;
        let admin = admin_actor();
        assert!(matches!(
            set_active(&store, &admin, "ghost@x.com", false).await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            delete_account(&store, &admin, "ghost@x.com").await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            change_password(&store, "ghost@x.com", "x").await,
            Err(Error::NotFound { .. })
        ));
        Ok(())
    }
}
