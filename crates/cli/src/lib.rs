// Path: crates/cli/src/lib.rs
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

//! # Donation DAO Driver
//!
//! Drives the donation-dao contract end to end against testnet: it builds
//! the release artifact, deploys it to a throw-away dev account, runs the
//! governance and donation scenario against it, and deletes the account
//! again however the scenario ends.
//!
//! The driver never implements the contract's logic. It sequences calls,
//! checks them against the lifecycle it expects the contract to follow, and
//! cleans up.
//!
//! All external tooling (`yarn`, `near`) is reached through the
//! [`driver::ProcessRunner`] trait, so the whole flow can be exercised in
//! tests with a scripted runner.

pub mod driver;

// Re-export the primary entry points for ergonomic top-level access.
pub use driver::{
    drive, Clock, CommandExecutor, DeploymentSession, ExercisePlan, ExerciseSequencer, SystemClock,
};
