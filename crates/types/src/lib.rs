// Path: crates/types/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # Donation DAO Driver Types
//!
//! Shared data structures for the deployment driver: the identities and
//! deployment handle, the governance proposal model the driver expects the
//! remote contract to follow, the driver configuration, and the error
//! taxonomy every component reports through.

/// Identities, deployments, proposals and the beneficiary ledger.
pub mod app;
/// Driver configuration loaded from TOML.
pub mod config;
/// The driver error taxonomy.
pub mod error;

pub use error::{DriverError, ErrorCode};
