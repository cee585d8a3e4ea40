//! # Postgres
//!
//! Connection management, schema migrations and the Postgres-backed
//! repositories of the campspot marketplace.

/// Connection pool and migrations
pub mod database;
/// Repository implementations over sqlx
pub mod store;

pub use store::PgStore;
