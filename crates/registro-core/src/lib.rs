//! Core types and trait definitions for the Registro records store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod compose;
pub mod error;
pub mod facility;
pub mod offender;
pub mod person;
pub mod session;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
