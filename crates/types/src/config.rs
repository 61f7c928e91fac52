// Path: crates/types/src/config.rs

//! Configuration for the deployment driver.
use crate::error::DriverError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Output format of the diagnostic log written to stderr.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum LogFormat {
    /// Human readable, one event per line.
    #[default]
    Pretty,
    /// Structured JSON, one object per line.
    Json,
}

/// Unit the contract expects proposal deadlines in.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "PascalCase")]
pub enum TimestampUnit {
    /// Seconds since the Unix epoch.
    Seconds,
    /// Milliseconds since the Unix epoch.
    Milliseconds,
    /// Nanoseconds since the Unix epoch (NEAR block timestamps).
    #[default]
    Nanoseconds,
}

impl TimestampUnit {
    /// Expresses a duration since the epoch in this unit, saturating at `u64::MAX`.
    pub fn express(&self, since_epoch: Duration) -> u64 {
        let value = match self {
            Self::Seconds => u128::from(since_epoch.as_secs()),
            Self::Milliseconds => since_epoch.as_millis(),
            Self::Nanoseconds => since_epoch.as_nanos(),
        };
        u64::try_from(value).unwrap_or(u64::MAX)
    }
}

/// Everything the driver needs to know about the toolchain and the scenario.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    /// Directory the build and deploy commands run in.
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,
    /// Deployment metadata directory written by `dev-deploy`, relative to `project_dir`.
    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: PathBuf,
    /// Command tokens that produce the release artifact.
    #[serde(default = "default_build_command")]
    pub build_command: Vec<String>,
    /// The built artifact, relative to `project_dir`.
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
    /// The ledger CLI used for deploy, delete and call.
    #[serde(default = "default_near_program")]
    pub near_program: String,
    /// How far in the future a new proposal's deadline is set.
    #[serde(default = "default_deadline_offset_secs")]
    pub deadline_offset_secs: u64,
    #[serde(default)]
    pub deadline_unit: TimestampUnit,
    /// Amount attached to each `donate` call.
    #[serde(default = "default_donation_amount")]
    pub donation_amount: String,
    /// Share assigned to the proposed beneficiary.
    #[serde(default = "default_proposed_share")]
    pub proposed_share: u64,
    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_metadata_dir() -> PathBuf {
    PathBuf::from("neardev")
}
fn default_build_command() -> Vec<String> {
    vec!["yarn".into(), "build:release".into()]
}
fn default_artifact_path() -> PathBuf {
    PathBuf::from("build/release/donation-dao.wasm")
}
fn default_near_program() -> String {
    "near".into()
}
fn default_deadline_offset_secs() -> u64 {
    600
}
fn default_donation_amount() -> String {
    "1".into()
}
fn default_proposed_share() -> u64 {
    50
}

/// Plain decimal notation only (`1`, `0.5`): no sign, exponent or `inf`.
fn is_positive_decimal(raw: &str) -> bool {
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    !(whole.is_empty() && fraction.is_empty())
        && digits_only(whole)
        && digits_only(fraction)
        && raw.bytes().any(|b| matches!(b, b'1'..=b'9'))
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            project_dir: default_project_dir(),
            metadata_dir: default_metadata_dir(),
            build_command: default_build_command(),
            artifact_path: default_artifact_path(),
            near_program: default_near_program(),
            deadline_offset_secs: default_deadline_offset_secs(),
            deadline_unit: TimestampUnit::default(),
            donation_amount: default_donation_amount(),
            proposed_share: default_proposed_share(),
            log_format: LogFormat::default(),
        }
    }
}

impl DriverConfig {
    /// Parses a TOML document; missing keys fall back to their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, DriverError> {
        let config: Self = toml::from_str(raw).map_err(|e| DriverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DriverError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), DriverError> {
        if self.build_command.first().map_or(true, |p| p.trim().is_empty()) {
            return Err(DriverError::Config("build_command must name a program".into()));
        }
        if self.near_program.trim().is_empty() {
            return Err(DriverError::Config("near_program must not be empty".into()));
        }
        // A zero offset would submit a proposal that is already expired.
        if self.deadline_offset_secs == 0 {
            return Err(DriverError::Config(
                "deadline_offset_secs must be greater than zero".into(),
            ));
        }
        if !is_positive_decimal(&self.donation_amount) {
            return Err(DriverError::Config(format!(
                "donation_amount must be a positive number, got {:?}",
                self.donation_amount
            )));
        }
        Ok(())
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.project_dir.join(&self.metadata_dir)
    }

    pub fn artifact(&self) -> PathBuf {
        self.project_dir.join(&self.artifact_path)
    }

    pub fn deadline_offset(&self) -> Duration {
        Duration::from_secs(self.deadline_offset_secs)
    }
}
