//! Core types and trait definitions for the paper evaluation league.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Every other crate depends on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod agent;
pub mod error;
pub mod evaluation;
pub mod feedback;
pub mod lifecycle;
pub mod matches;
pub mod paper;
pub mod review;
pub mod standings;
pub mod store;
pub mod upstream;

pub use error::{Error, Result};
