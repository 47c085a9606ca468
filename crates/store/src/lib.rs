//! `orderdesk-store` — SQLite persistence for order aggregates.
//!
//! Layout:
//! - `schema.rs`: table DDL and the startup migration
//! - `rows.rs`: storage-shaped row types and their domain mapping
//! - `repository.rs`: the [`SqliteOrderRepository`] implementation

pub mod repository;
pub mod rows;
pub mod schema;

#[cfg(test)]
mod integration_tests;

pub use repository::SqliteOrderRepository;
pub use schema::Store;
