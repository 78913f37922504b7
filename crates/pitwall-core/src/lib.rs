//! Core types and trait definitions for the pitwall prediction engine.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! It holds the canonical vote model, the [`VoteStore`](store::VoteStore)
//! abstraction with its process-local backends, the aggregation rules, and
//! the submission service that ties them together.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod error;
pub mod identity;
pub mod memory;
pub mod seeded;
pub mod service;
pub mod store;
pub mod subject;
pub mod vote;

#[cfg(any(test, feature = "conformance"))]
pub mod conformance;

pub use error::{Error, Result};
