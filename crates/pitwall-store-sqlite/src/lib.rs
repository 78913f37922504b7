//! SQLite backend for the pitwall vote store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Votes live in a table unique on
//! `(subject_key, identity)`; per-subject tallies come from a view.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
