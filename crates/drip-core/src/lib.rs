//! Core types and trait definitions for the drip campaign tool.
//!
//! This crate is deliberately free of HTTP, SMTP, and database dependencies.
//! All other crates depend on it; it performs no I/O of its own.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod address;
pub mod contact;
pub mod error;
pub mod mail;
pub mod sequence;
pub mod sheet;

pub use error::{Error, Result};
