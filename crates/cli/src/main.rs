// Path: crates/cli/src/main.rs
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

//! # Donation DAO Driver CLI
//!
//! Deploys the donation-dao contract to an ephemeral testnet account, runs the
//! exercise sequence, and deletes the account again.

use anyhow::{Context, Result};
use clap::Parser;
use dao_cli::{drive, CommandExecutor, SystemClock};
use dao_types::app::AccountId;
use dao_types::config::DriverConfig;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[clap(
    name = "dao-cli",
    version,
    about = "Builds, deploys and exercises the donation-dao contract on an ephemeral testnet account."
)]
struct Cli {
    /// Account that signs the calls and receives the instance's balance on teardown.
    owner: String,

    /// Account proposed as a new beneficiary.
    user: String,

    /// Optional TOML file overriding the toolchain and scenario defaults.
    #[clap(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DriverConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DriverConfig::default(),
    };
    dao_telemetry::init_tracing(config.log_format)?;

    let report = drive(
        CommandExecutor::system(),
        config,
        AccountId::new(cli.owner),
        AccountId::new(cli.user),
        Arc::new(SystemClock),
    )
    .await?;

    tracing::info!(
        steps = report.outcomes.len(),
        beneficiaries = report.expected.ledger.members().len(),
        "exercise sequence completed and instance deleted"
    );
    Ok(())
}
