//! Entity module - Contains the SeaORM entity definitions for the database.
//! The tracker keeps each logical table as a single keyed JSON document,
//! so one entity covers all of storage.

pub mod document;

pub use document::{Column as DocumentColumn, Entity as Document, Model as DocumentModel};
