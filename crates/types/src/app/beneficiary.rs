// Path: crates/types/src/app/beneficiary.rs

use super::AccountId;
use crate::error::DriverError;
use serde::{Deserialize, Serialize};

/// Share weight the initialising owner is seeded with.
pub const OWNER_SEED_SHARE: u64 = 100;

/// An account entitled to a weighted share of every donation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beneficiary {
    pub account: AccountId,
    pub share: u64,
    /// Whether this account's approval counts towards proposal thresholds.
    pub is_authoriser: bool,
}

/// The beneficiary set the driver expects the contract to hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedLedger {
    members: Vec<Beneficiary>,
    initialised: bool,
}

impl ExpectedLedger {
    /// Mirrors contract initialisation: the owner becomes the sole authorising beneficiary.
    pub fn initialise(&mut self, owner: &AccountId) -> Result<(), DriverError> {
        if self.initialised {
            return Err(DriverError::InvalidTransition(
                "contract is already initialised".into(),
            ));
        }
        self.members = vec![Beneficiary {
            account: owner.clone(),
            share: OWNER_SEED_SHARE,
            is_authoriser: true,
        }];
        self.initialised = true;
        Ok(())
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn members(&self) -> &[Beneficiary] {
        &self.members
    }

    pub fn get(&self, account: &AccountId) -> Option<&Beneficiary> {
        self.members.iter().find(|m| &m.account == account)
    }

    pub fn is_authoriser(&self, account: &AccountId) -> bool {
        self.get(account).map_or(false, |m| m.is_authoriser)
    }

    /// Appends a member. The contract keeps a plain vector, so an account
    /// that is already present gets a second entry rather than an error.
    ///
    /// Returns `true` if the account was already a member.
    pub fn add(&mut self, beneficiary: Beneficiary) -> Result<bool, DriverError> {
        if !self.initialised {
            return Err(DriverError::InvalidTransition(
                "cannot add a beneficiary before the contract is initialised".into(),
            ));
        }
        let existing = self.get(&beneficiary.account).is_some();
        self.members.push(beneficiary);
        Ok(existing)
    }
}
