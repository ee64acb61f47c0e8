//! Domain types persisted in the document store.
//!
//! Field names and enum values serialize to the same JSON shape the browser
//! dashboard wrote, so existing documents load unchanged.

pub mod region;
pub mod request;
pub mod session;
pub mod user;

pub use region::{
    ChangeStamp, Contact, DocumentItem, HistoryEntry, REGION_CATALOG, Region, RegistrationStatus,
};
pub use request::{AccessRequest, RequestKind};
pub use session::{Actor, SessionUser};
pub use user::{
    DEFAULT_PASSWORD, Role, SUPER_ADMIN_EMAIL, SUPER_ADMIN_PASSWORD, SUPER_ADMIN_USERNAME,
    UserAccount, normalize_email,
};
