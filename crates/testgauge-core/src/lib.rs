//! testgauge core: test outcome model, metric naming, label parsing and the
//! session summary shared by the pusher and its adapters.
//!
//! This crate carries no transport or runtime dependencies so the aggregation
//! rules can be reused by any host that observes test outcomes.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! A metrics reporter must never be the reason a test run aborts.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod labels;
pub mod naming;
pub mod outcome;
pub mod summary;

/// Shared result type.
pub use error::{Result, TestGaugeError};
pub use labels::Labels;
