// Path: crates/types/src/app/proposal.rs

//! The proposal lifecycle the driver assumes of the remote contract.
//!
//! ```text
//! create ──► Pending ──approve──► Approved ──finalise──► Finalized
//!               │                     │
//!               └──── deadline ───────┴──────────────► Expired
//! ```
//!
//! Proposal ids are assigned sequentially from zero, matching the contract's
//! numbering on a freshly deployed instance.

use super::{AccountId, Beneficiary, ExpectedLedger};
use crate::error::DriverError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A contract-assigned, sequential proposal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(pub u64);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The ledger mutation a proposal applies once finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProposalKind {
    AddBeneficiary(Beneficiary),
}

/// The status of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStatus {
    /// Created, waiting for approval.
    Pending,
    /// Approval threshold reached, waiting for finalization.
    Approved,
    /// Applied to the ledger.
    Finalized,
    /// The deadline passed before finalization.
    Expired,
}

impl ProposalStatus {
    /// Active proposals are the ones `get_proposals {activeOnly: true}` lists.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub id: ProposalId,
    /// Absolute deadline, in the unit the contract compares block timestamps in.
    pub deadline: u64,
    pub kind: ProposalKind,
    pub approvals: BTreeSet<AccountId>,
    pub status: ProposalStatus,
}

/// Tracks the proposals the driver has submitted and the status each should be in.
#[derive(Debug, Clone, Default)]
pub struct ProposalTracker {
    proposals: Vec<Proposal>,
}

impl ProposalTracker {
    /// Records a new pending proposal and returns the id the contract will assign it.
    pub fn create(
        &mut self,
        kind: ProposalKind,
        deadline: u64,
        now: u64,
    ) -> Result<ProposalId, DriverError> {
        if deadline <= now {
            return Err(DriverError::InvalidTransition(format!(
                "proposal deadline {} is not after submission time {}",
                deadline, now
            )));
        }
        let id = ProposalId(self.proposals.len() as u64);
        self.proposals.push(Proposal {
            id,
            deadline,
            kind,
            approvals: BTreeSet::new(),
            status: ProposalStatus::Pending,
        });
        Ok(id)
    }

    /// Records an approval. A single authoriser approval is assumed to reach the threshold.
    pub fn approve(
        &mut self,
        id: ProposalId,
        approver: &AccountId,
        ledger: &ExpectedLedger,
    ) -> Result<(), DriverError> {
        if !ledger.is_authoriser(approver) {
            return Err(DriverError::InvalidTransition(format!(
                "{} is not an authoriser and cannot approve proposal {}",
                approver, id
            )));
        }
        let proposal = self.get_mut(id)?;
        match proposal.status {
            ProposalStatus::Pending | ProposalStatus::Approved => {
                proposal.approvals.insert(approver.clone());
                proposal.status = ProposalStatus::Approved;
                Ok(())
            }
            status => Err(DriverError::InvalidTransition(format!(
                "proposal {} is {:?} and can no longer be approved",
                id, status
            ))),
        }
    }

    /// Applies every approved proposal to the ledger. Pending proposals are left untouched.
    pub fn finalise(&mut self, ledger: &mut ExpectedLedger) -> Result<Vec<ProposalId>, DriverError> {
        let mut finalised = Vec::new();
        for proposal in self
            .proposals
            .iter_mut()
            .filter(|p| p.status == ProposalStatus::Approved)
        {
            match &proposal.kind {
                ProposalKind::AddBeneficiary(beneficiary) => {
                    ledger.add(beneficiary.clone())?;
                }
            }
            proposal.status = ProposalStatus::Finalized;
            finalised.push(proposal.id);
        }
        Ok(finalised)
    }

    /// Moves every active proposal whose deadline has passed to `Expired`.
    pub fn expire_overdue(&mut self, now: u64) -> Vec<ProposalId> {
        let mut expired = Vec::new();
        for proposal in self.proposals.iter_mut() {
            if proposal.status.is_active() && proposal.deadline <= now {
                proposal.status = ProposalStatus::Expired;
                expired.push(proposal.id);
            }
        }
        expired
    }

    pub fn get(&self, id: ProposalId) -> Option<&Proposal> {
        usize::try_from(id.0).ok().and_then(|i| self.proposals.get(i))
    }

    fn get_mut(&mut self, id: ProposalId) -> Result<&mut Proposal, DriverError> {
        usize::try_from(id.0)
            .ok()
            .and_then(|i| self.proposals.get_mut(i))
            .ok_or_else(|| {
                DriverError::InvalidTransition(format!("proposal {} was never created", id))
            })
    }

    pub fn active(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.iter().filter(|p| p.status.is_active())
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> AccountId {
        AccountId::from("alice.testnet")
    }

    fn ledger() -> ExpectedLedger {
        let mut ledger = ExpectedLedger::default();
        ledger.initialise(&owner()).unwrap();
        ledger
    }

    fn add_bob() -> ProposalKind {
        ProposalKind::AddBeneficiary(Beneficiary {
            account: "bob.alice.testnet".into(),
            share: 50,
            is_authoriser: false,
        })
    }

    #[test]
    fn test_full_lifecycle_adds_beneficiary() {
        let mut ledger = ledger();
        let mut tracker = ProposalTracker::default();

        let id = tracker.create(add_bob(), 1_600, 1_000).unwrap();
        assert_eq!(id, ProposalId(0));
        assert_eq!(tracker.active().count(), 1);

        tracker.approve(id, &owner(), &ledger).unwrap();
        assert_eq!(tracker.get(id).unwrap().status, ProposalStatus::Approved);

        let finalised = tracker.finalise(&mut ledger).unwrap();
        assert_eq!(finalised, vec![id]);
        assert_eq!(tracker.active().count(), 0);

        let bob = ledger.get(&"bob.alice.testnet".into()).unwrap();
        assert_eq!(bob.share, 50);
        assert!(!bob.is_authoriser);
    }

    #[test]
    fn test_deadline_must_be_in_the_future() {
        let mut tracker = ProposalTracker::default();
        assert!(tracker.create(add_bob(), 1_000, 1_000).is_err());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_approve_unknown_proposal_fails() {
        let ledger = ledger();
        let mut tracker = ProposalTracker::default();
        let err = tracker.approve(ProposalId(0), &owner(), &ledger).unwrap_err();
        assert!(matches!(err, DriverError::InvalidTransition(_)));
    }

    #[test]
    fn test_non_authoriser_cannot_approve() {
        let ledger = ledger();
        let mut tracker = ProposalTracker::default();
        let id = tracker.create(add_bob(), 2, 1).unwrap();
        assert!(tracker
            .approve(id, &"mallory.testnet".into(), &ledger)
            .is_err());
        assert_eq!(tracker.get(id).unwrap().status, ProposalStatus::Pending);
    }

    #[test]
    fn test_finalise_skips_pending_proposals() {
        let mut ledger = ledger();
        let mut tracker = ProposalTracker::default();
        let id = tracker.create(add_bob(), 2, 1).unwrap();

        assert!(tracker.finalise(&mut ledger).unwrap().is_empty());
        assert_eq!(tracker.get(id).unwrap().status, ProposalStatus::Pending);
        assert_eq!(ledger.members().len(), 1);
    }

    #[test]
    fn test_finalise_resolves_several_proposals_at_once() {
        let mut ledger = ledger();
        let mut tracker = ProposalTracker::default();
        let first = tracker.create(add_bob(), 10, 1).unwrap();
        let second = tracker
            .create(
                ProposalKind::AddBeneficiary(Beneficiary {
                    account: "carol.testnet".into(),
                    share: 25,
                    is_authoriser: true,
                }),
                10,
                1,
            )
            .unwrap();
        tracker.approve(first, &owner(), &ledger).unwrap();
        tracker.approve(second, &owner(), &ledger).unwrap();

        assert_eq!(tracker.finalise(&mut ledger).unwrap(), vec![first, second]);
        assert_eq!(ledger.members().len(), 3);
    }

    #[test]
    fn test_expired_proposal_cannot_be_approved() {
        let ledger = ledger();
        let mut tracker = ProposalTracker::default();
        let id = tracker.create(add_bob(), 5, 1).unwrap();

        assert!(tracker.expire_overdue(4).is_empty());
        assert_eq!(tracker.expire_overdue(5), vec![id]);
        assert_eq!(tracker.get(id).unwrap().status, ProposalStatus::Expired);
        assert!(tracker.approve(id, &owner(), &ledger).is_err());
    }

    #[test]
    fn test_finalized_proposal_is_not_refinalised() {
        let mut ledger = ledger();
        let mut tracker = ProposalTracker::default();
        let id = tracker.create(add_bob(), 5, 1).unwrap();
        tracker.approve(id, &owner(), &ledger).unwrap();
        tracker.finalise(&mut ledger).unwrap();

        assert!(tracker.finalise(&mut ledger).unwrap().is_empty());
        assert!(tracker.approve(id, &owner(), &ledger).is_err());
    }
}
