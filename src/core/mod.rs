//! Framework-independent tracker logic.
//!
//! Every operation takes a [`store::Store`] and, where permissions apply, the
//! acting [`crate::models::Actor`]. Nothing here knows about a user interface.

pub mod access;
pub mod authz;
pub mod expiration;
pub mod export;
pub mod region;
pub mod report;
pub mod session;
pub mod store;
pub mod user;
