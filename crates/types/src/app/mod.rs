// Path: crates/types/src/app/mod.rs

//! Identities, deployments and the governance model exercised by the driver.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub mod beneficiary;
pub mod proposal;

pub use beneficiary::{Beneficiary, ExpectedLedger};
pub use proposal::{Proposal, ProposalId, ProposalKind, ProposalStatus, ProposalTracker};

/// A named account on the remote ledger (e.g. `alice.testnet`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The generated identity of an ephemeral instance, of the form `dev-<digits>-<digits>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Accepts only identifiers shaped like `dev-<digits>-<digits>`.
    pub fn parse(raw: &str) -> Option<Self> {
        let rest = raw.strip_prefix("dev-")?;
        let (left, right) = rest.split_once('-')?;
        let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if all_digits(left) && all_digits(right) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The instance acts as its own account on the ledger.
    pub fn as_account(&self) -> AccountId {
        AccountId(self.0.clone())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A live, deployed copy of the contract artifact.
///
/// Deliberately not `Clone`: a deployment is owned by exactly one session and
/// is consumed when it is destroyed.
#[derive(Debug, PartialEq, Eq)]
pub struct Deployment {
    pub instance_id: InstanceId,
    pub artifact_path: PathBuf,
    /// Receives the residual balance when the instance is deleted.
    pub owner: AccountId,
}
