//! Document entity - One row per logical table of the tracker.
//!
//! Each row holds a whole collection (regions, users, requests, or the
//! current session) serialized as JSON under a namespaced key. Rows are
//! always rewritten in full.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Keyed document model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    /// Namespaced storage key (e.g., `"detran_app_users_db"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// JSON serialization of the whole collection
    #[sea_orm(column_type = "Text")]
    pub value: String,
    /// When this document was last written
    pub updated_at: DateTimeUtc,
}

/// Documents have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
