//! Shared test utilities for the tracker.
//!
//! Every test gets its own in-memory `SQLite` store, seeded lazily on first
//! read like a fresh installation.

use crate::{
    config::{AppConfig, database::create_tables},
    core::store::Store,
    errors::Result,
    models::{Actor, Role, SUPER_ADMIN_EMAIL, SUPER_ADMIN_USERNAME, UserAccount},
};

/// Creates an in-memory store with default configuration.
pub async fn setup_test_store() -> Result<Store> {
    setup_store_with_config(&AppConfig::default()).await
}

/// Creates an in-memory store with a custom configuration.
pub async fn setup_store_with_config(config: &AppConfig) -> Result<Store> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    create_tables(&db).await?;
    Ok(Store::new(db, config))
}

/// Builds an active account that still has the default password.
///
/// # Defaults
/// * `password`: the default password
/// * `is_first_login`: true
pub fn create_test_user(username: &str, email: &str, role: Role) -> UserAccount {
    UserAccount::provisioned(username.to_string(), email.to_string(), role)
}

/// Appends an account to the stored user table.
pub async fn seed_user(store: &Store, account: UserAccount) -> Result<()> {
    let mut users = store.list_users().await?;
    users.push(account);
    store.put_users(&users).await
}

/// The protected administrator acting.
pub fn admin_actor() -> Actor {
    Actor::new(SUPER_ADMIN_USERNAME, SUPER_ADMIN_EMAIL, Role::SuperAdmin)
}

/// An editor acting.
pub fn editor_actor() -> Actor {
    Actor::new("Edna", "edna@x.com", Role::Editor)
}

/// A read-only user acting.
pub fn viewer_actor() -> Actor {
    Actor::new("Victor", "victor@x.com", Role::Viewer)
}
