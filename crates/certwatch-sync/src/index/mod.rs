//! SQLite-backed certificate index.
//!
//! One row per certificate entry. Rows are written only through
//! [`IndexStore::reconcile`] and [`IndexStore::remove`], each of which
//! replaces or deletes an archive's whole record set in a single transaction.

mod convert;
mod queries;
mod schema;
mod store;

pub use schema::SCHEMA_VERSION;
pub use store::{IndexStore, ReconcileReport};
