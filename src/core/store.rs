//! Keyed document store.
//!
//! Each logical table (session, regions, users, requests) is one row in the
//! `documents` table holding the whole collection as JSON. Reads return full
//! copies and writes overwrite the full document: there is no field-level
//! update and no locking, so the last writer wins.
//!
//! Loading the region or user table seeds it when missing. The user table
//! also runs a repair pass on every load that patches legacy accounts and
//! keeps the super-admin canonical.

use crate::{
    config::AppConfig,
    entities::{Document, document},
    errors::{Error, Result},
    models::{
        AccessRequest, REGION_CATALOG, Region, SessionUser, UserAccount, normalize_email,
        user::StoredAccount,
    },
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, instrument, warn};

/// The four logical tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Currently logged-in user
    Session,
    /// Region records
    Regions,
    /// User accounts
    Users,
    /// Pending access and reset requests
    Requests,
}

impl Table {
    const fn suffix(self) -> &'static str {
        match self {
            Self::Session => "current_user",
            Self::Regions => "data",
            Self::Users => "users_db",
            Self::Requests => "requests",
        }
    }
}

/// Handle to the document store. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct Store {
    db: DatabaseConnection,
    namespace: String,
    default_alert_days: i64,
}

impl Store {
    /// Wraps a connection whose schema has already been created.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: &AppConfig) -> Self {
        Self {
            db,
            namespace: config.storage.namespace.clone(),
            default_alert_days: config.policy.default_alert_days,
        }
    }

    /// Underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Storage key of a table, e.g. `detran_app_users_db`.
    #[must_use]
    pub fn key(&self, table: Table) -> String {
        format!("{}_{}", self.namespace, table.suffix())
    }

    /// Raw JSON stored for a table, if any.
    pub async fn load_document(&self, table: Table) -> Result<Option<String>> {
        let row = Document::find_by_id(self.key(table)).one(&self.db).await?;
        Ok(row.map(|r| r.value))
    }

    /// Serializes `value` and overwrites the table's document.
    #[instrument(skip(self, value))]
    pub async fn save_document<T>(&self, table: Table, value: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let key = self.key(table);
        let json = serde_json::to_string(value)?;
        let now = Utc::now();

        let existing = Document::find_by_id(key.clone()).one(&self.db).await?;

        if let Some(row) = existing {
            let mut active_model: document::ActiveModel = row.into();
            active_model.value = Set(json);
            active_model.updated_at = Set(now);
            active_model.update(&self.db).await?;
        } else {
            let new_row = document::ActiveModel {
                key: Set(key.clone()),
                value: Set(json),
                updated_at: Set(now),
            };
            new_row.insert(&self.db).await?;
        }

        debug!("Wrote document {}", key);
        Ok(())
    }

    /// Removes a table's document entirely.
    pub async fn delete_document(&self, table: Table) -> Result<()> {
        Document::delete_by_id(self.key(table)).exec(&self.db).await?;
        Ok(())
    }

    /// Parses a table's document, treating unparsable content as absent.
    async fn load_parsed<T>(&self, table: Table) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.load_document(table).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Discarding unreadable {:?} document: {}", table, e);
                Ok(None)
            }
        }
    }

    // --- Regions ---

    /// All region records, seeding the 27 defaults on first use.
    pub async fn list_regions(&self) -> Result<Vec<Region>> {
        if let Some(regions) = self.load_parsed::<Vec<Region>>(Table::Regions).await? {
            return Ok(regions);
        }
        self.seed_regions().await
    }

    async fn seed_regions(&self) -> Result<Vec<Region>> {
        let now = Utc::now();
        let regions: Vec<Region> = REGION_CATALOG
            .iter()
            .map(|(code, name)| Region::seeded(code, name, self.default_alert_days, now))
            .collect();

        self.save_document(Table::Regions, &regions).await?;
        info!("Seeded {} region records", regions.len());
        Ok(regions)
    }

    /// One region by code (case-insensitive).
    pub async fn get_region(&self, code: &str) -> Result<Region> {
        self.list_regions()
            .await?
            .into_iter()
            .find(|r| r.code.eq_ignore_ascii_case(code.trim()))
            .ok_or_else(|| Error::not_found("Region", code))
    }

    /// Replaces the stored copy of a region and rewrites the whole table.
    pub async fn put_region(&self, region: &Region) -> Result<()> {
        let mut regions = self.list_regions().await?;
        let slot = regions
            .iter_mut()
            .find(|r| r.code == region.code)
            .ok_or_else(|| Error::not_found("Region", region.code.clone()))?;
        *slot = region.clone();
        self.save_document(Table::Regions, &regions).await
    }

    // --- Users ---

    /// All accounts, after the repair pass. Writes back only when something changed.
    pub async fn list_users(&self) -> Result<Vec<UserAccount>> {
        let Some(stored) = self.load_parsed::<Vec<StoredAccount>>(Table::Users).await? else {
            let seeded = vec![UserAccount::super_admin()];
            self.save_document(Table::Users, &seeded).await?;
            info!("Seeded user table with the super-admin account");
            return Ok(seeded);
        };

        let (accounts, changed) = repair_accounts(stored);
        if changed {
            info!("Repaired user table");
            self.save_document(Table::Users, &accounts).await?;
        }
        Ok(accounts)
    }

    /// Account with the given email, compared case-insensitively.
    pub async fn find_user(&self, email: &str) -> Result<Option<UserAccount>> {
        let email = normalize_email(email);
        Ok(self
            .list_users()
            .await?
            .into_iter()
            .find(|u| u.has_email(&email)))
    }

    /// Overwrites the user table.
    pub async fn put_users(&self, users: &[UserAccount]) -> Result<()> {
        self.save_document(Table::Users, users).await
    }

    // --- Requests ---

    /// Pending requests; an unreadable table reads as empty.
    pub async fn list_requests(&self) -> Result<Vec<AccessRequest>> {
        Ok(self
            .load_parsed::<Vec<AccessRequest>>(Table::Requests)
            .await?
            .unwrap_or_default())
    }

    /// Overwrites the request table.
    pub async fn put_requests(&self, requests: &[AccessRequest]) -> Result<()> {
        self.save_document(Table::Requests, requests).await
    }

    // --- Session ---

    /// The stored session user, if any. Unreadable sessions are cleared.
    pub async fn load_session(&self) -> Result<Option<SessionUser>> {
        if self.load_document(Table::Session).await?.is_none() {
            return Ok(None);
        }
        let session = self.load_parsed::<SessionUser>(Table::Session).await?;
        if session.is_none() {
            self.clear_session().await?;
        }
        Ok(session)
    }

    /// Stores the session user.
    pub async fn save_session(&self, user: &SessionUser) -> Result<()> {
        self.save_document(Table::Session, user).await
    }

    /// Ends the session.
    pub async fn clear_session(&self) -> Result<()> {
        self.delete_document(Table::Session).await
    }
}

/// Patches legacy accounts and restores the canonical super-admin.
/// Returns the repaired list and whether anything changed.
fn repair_accounts(stored: Vec<StoredAccount>) -> (Vec<UserAccount>, bool) {
    let mut changed = false;
    let mut accounts: Vec<UserAccount> = stored
        .into_iter()
        .map(|s| {
            let (account, patched) = s.upgrade();
            changed |= patched;
            account
        })
        .collect();

    let canonical = UserAccount::super_admin();
    match accounts.iter().position(|u| u.has_email(&canonical.email)) {
        Some(idx) if accounts[idx].super_admin_drifted() => {
            warn!("Super-admin account drifted from canonical values; restoring");
            accounts[idx] = canonical;
            changed = true;
        }
        Some(_) => {}
        None => {
            accounts.push(canonical);
            changed = true;
        }
    }

    (accounts, changed)
}
