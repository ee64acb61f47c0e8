//! Database configuration module.
//!
//! Handles the `SQLite` connection and creation of the `documents` table using `SeaORM`.
//! The table is generated from the entity definition with `Schema::create_table_from_entity`,
//! so the stored shape always matches the Rust model without hand-written SQL.

use crate::entities::Document;
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/renova.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns the
/// default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the given database URL.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates the `documents` table if it does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut document_table = schema.create_table_from_entity(Document);
    document_table.if_not_exists();

    db.execute(builder.build(&document_table)).await?;
    info!("Document table ensured");

    Ok(())
}

/// Connects and ensures the schema in one step.
pub async fn init_database(database_url: &str) -> Result<DatabaseConnection> {
    let db = create_connection(database_url).await?;
    create_tables(&db).await?;
    Ok(db)
}
