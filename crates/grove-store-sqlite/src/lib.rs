//! SQLite backend for the Grove post store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every write runs in an immediate
//! transaction, which serialises writers and makes the find-or-create paths
//! race-free.

mod changes;
mod encode;
mod groups;
mod locations;
mod posts;
mod predicate;
mod readmarks;
mod schema;
mod store;
mod writes;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
