// Path: crates/cli/src/driver/sequence.rs

//! The donation-dao exercise sequence, as an explicit list of typed steps.
//!
//! Each step names the remote function, who calls it, its payload, and the
//! effect it is expected to have on the proposal lifecycle. The sequencer
//! checks that effect against an [`ExpectationModel`] *before* issuing the
//! call, so a step that would break the lifecycle (approving a proposal that
//! was never created, say) is refused without touching the network.

use super::clock::Clock;
use super::gateway::RemoteCall;
use super::session::SessionScope;
use dao_telemetry::StepTimer;
use dao_types::app::{
    AccountId, Beneficiary, ExpectedLedger, ProposalId, ProposalKind, ProposalTracker,
};
use dao_types::config::{DriverConfig, TimestampUnit};
use dao_types::DriverError;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Who signs a step's call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// The session owner.
    Owner,
    /// The deployed instance's own account (self-initialisation).
    Instance,
}

/// What a step does to the contract, as far as the driver is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedEffect {
    Initialise,
    ObserveBeneficiaries,
    Donate,
    /// Submits `kind` with a deadline `window` after the moment the call is issued.
    CreateProposal { kind: ProposalKind, window: Duration },
    ObserveActiveProposals,
    Approve(ProposalId),
    Finalise,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseStep {
    pub function: String,
    pub caller: Caller,
    /// Fixed arguments. Proposal steps leave this empty and build theirs in
    /// [`ExerciseStep::payload_at`].
    pub payload: Option<Value>,
    pub amount: Option<String>,
    pub effect: ExpectedEffect,
}

impl ExerciseStep {
    fn new(function: &str, caller: Caller, effect: ExpectedEffect) -> Self {
        Self {
            function: function.to_string(),
            caller,
            payload: None,
            amount: None,
            effect,
        }
    }

    fn payload<P: Serialize>(mut self, payload: &P) -> Result<Self, DriverError> {
        self.payload = Some(to_payload(payload)?);
        Ok(self)
    }

    fn amount(mut self, amount: &str) -> Self {
        self.amount = Some(amount.to_string());
        self
    }

    /// The arguments to send when the step is issued at `at` (since the epoch).
    pub fn payload_at(
        &self,
        unit: TimestampUnit,
        at: Duration,
    ) -> Result<Option<Value>, DriverError> {
        match &self.effect {
            ExpectedEffect::CreateProposal {
                kind: ProposalKind::AddBeneficiary(beneficiary),
                window,
            } => to_payload(&AddBeneficiaryProposalArgs {
                deadline: unit.express(at.saturating_add(*window)),
                account: &beneficiary.account,
                share: beneficiary.share,
                is_authoriser: beneficiary.is_authoriser,
            })
            .map(Some),
            _ => Ok(self.payload.clone()),
        }
    }

    fn to_call(&self, caller: AccountId, payload: Option<Value>) -> RemoteCall {
        RemoteCall {
            function: self.function.clone(),
            caller,
            payload,
            amount: self.amount.clone(),
        }
    }
}

fn to_payload<P: Serialize>(payload: &P) -> Result<Value, DriverError> {
    serde_json::to_value(payload)
        .map_err(|e| DriverError::Config(format!("unserialisable payload: {e}")))
}

// --- Contract method arguments ---

#[derive(Serialize)]
struct InitArgs<'a> {
    owner: &'a AccountId,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddBeneficiaryProposalArgs<'a> {
    // Nanosecond deadlines are above 2^53, so a reader that parses JSON
    // numbers as doubles rounds them by a few hundred nanoseconds.
    deadline: u64,
    account: &'a AccountId,
    share: u64,
    is_authoriser: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetProposalsArgs {
    active_only: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApproveProposalArgs {
    proposal_id: ProposalId,
}

/// An ordered list of steps plus the context needed to check them.
#[derive(Debug, Clone)]
pub struct ExercisePlan {
    owner: AccountId,
    /// Unit the contract expects deadlines in.
    unit: TimestampUnit,
    steps: Vec<ExerciseStep>,
}

impl ExercisePlan {
    pub fn from_steps(owner: AccountId, unit: TimestampUnit, steps: Vec<ExerciseStep>) -> Self {
        Self { owner, unit, steps }
    }

    /// The ten-step governance and donation scenario.
    ///
    /// The proposal is approved as id 0: every session deploys a fresh
    /// instance, so the first proposal it creates is always the contract's
    /// proposal 0.
    pub fn donation_dao(
        config: &DriverConfig,
        owner: &AccountId,
        user: &AccountId,
    ) -> Result<Self, DriverError> {
        config.validate()?;

        let beneficiary = Beneficiary {
            account: user.clone(),
            share: config.proposed_share,
            is_authoriser: false,
        };
        let first_proposal = ProposalId(0);
        let amount = config.donation_amount.as_str();

        let steps = vec![
            ExerciseStep::new("init", Caller::Instance, ExpectedEffect::Initialise)
                .payload(&InitArgs { owner })?,
            ExerciseStep::new(
                "get_beneficiaries",
                Caller::Owner,
                ExpectedEffect::ObserveBeneficiaries,
            ),
            ExerciseStep::new("donate", Caller::Owner, ExpectedEffect::Donate).amount(amount),
            ExerciseStep::new(
                "create_add_beneficiary_proposal",
                Caller::Owner,
                ExpectedEffect::CreateProposal {
                    kind: ProposalKind::AddBeneficiary(beneficiary),
                    window: config.deadline_offset(),
                },
            ),
            ExerciseStep::new(
                "get_proposals",
                Caller::Owner,
                ExpectedEffect::ObserveActiveProposals,
            )
            .payload(&GetProposalsArgs { active_only: true })?,
            ExerciseStep::new(
                "approve_proposal",
                Caller::Owner,
                ExpectedEffect::Approve(first_proposal),
            )
            .payload(&ApproveProposalArgs {
                proposal_id: first_proposal,
            })?,
            ExerciseStep::new("finalise_proposals", Caller::Owner, ExpectedEffect::Finalise),
            ExerciseStep::new(
                "get_proposals",
                Caller::Owner,
                ExpectedEffect::ObserveActiveProposals,
            )
            .payload(&GetProposalsArgs { active_only: true })?,
            ExerciseStep::new(
                "get_beneficiaries",
                Caller::Owner,
                ExpectedEffect::ObserveBeneficiaries,
            ),
            ExerciseStep::new("donate", Caller::Owner, ExpectedEffect::Donate).amount(amount),
        ];

        Ok(Self::from_steps(owner.clone(), config.deadline_unit, steps))
    }

    pub fn steps(&self) -> &[ExerciseStep] {
        &self.steps
    }

    /// Walks every step through a fresh model, as if all were issued at `at`,
    /// without issuing any call.
    pub fn rehearse(&self, at: Duration) -> Result<ExpectationModel, DriverError> {
        let mut model = ExpectationModel::new(self.owner.clone(), self.unit);
        for (index, step) in self.steps.iter().enumerate() {
            model
                .apply(step, at)
                .map_err(|e| abort(index + 1, &step.function, e))?;
        }
        Ok(model)
    }
}

/// The contract state the driver expects after the steps run so far.
#[derive(Debug, Clone)]
pub struct ExpectationModel {
    owner: AccountId,
    unit: TimestampUnit,
    pub ledger: ExpectedLedger,
    pub proposals: ProposalTracker,
    pub donations: usize,
}

impl ExpectationModel {
    pub fn new(owner: AccountId, unit: TimestampUnit) -> Self {
        Self {
            owner,
            unit,
            ledger: ExpectedLedger::default(),
            proposals: ProposalTracker::default(),
            donations: 0,
        }
    }

    /// Advances the model by one step issued at `at`, refusing transitions
    /// the lifecycle forbids. Proposals whose deadline has passed by `at`
    /// expire first.
    pub fn apply(&mut self, step: &ExerciseStep, at: Duration) -> Result<(), DriverError> {
        let now = self.unit.express(at);
        let expired = self.proposals.expire_overdue(now);
        if !expired.is_empty() {
            tracing::warn!(target: "sequence", ?expired, "proposals expected to have passed their deadline");
        }

        let initialised = self.ledger.is_initialised();
        match &step.effect {
            ExpectedEffect::Initialise => self.ledger.initialise(&self.owner),
            _ if !initialised => Err(DriverError::InvalidTransition(format!(
                "`{}` issued before `init`",
                step.function
            ))),
            ExpectedEffect::ObserveBeneficiaries | ExpectedEffect::ObserveActiveProposals => {
                Ok(())
            }
            ExpectedEffect::Donate => {
                if step.amount.is_none() {
                    return Err(DriverError::InvalidTransition(
                        "a donation must attach an amount".into(),
                    ));
                }
                self.donations += 1;
                Ok(())
            }
            ExpectedEffect::CreateProposal { kind, window } => self
                .proposals
                .create(kind.clone(), self.unit.express(at.saturating_add(*window)), now)
                .map(|_| ()),
            ExpectedEffect::Approve(id) => match step.caller {
                Caller::Owner => self.proposals.approve(*id, &self.owner, &self.ledger),
                Caller::Instance => Err(DriverError::InvalidTransition(format!(
                    "proposal {id} cannot be approved by the contract instance"
                ))),
            },
            ExpectedEffect::Finalise => {
                let finalised = self.proposals.finalise(&mut self.ledger)?;
                tracing::debug!(target: "sequence", ?finalised, "proposals expected to finalise");
                Ok(())
            }
        }
    }

    /// Compares an observation step's raw output with the expected state.
    ///
    /// Mismatches are reported, never fatal: the output format belongs to the
    /// remote tooling and the run only fails on stderr.
    pub fn discrepancies(&self, effect: &ExpectedEffect, output: &str) -> Vec<String> {
        match effect {
            ExpectedEffect::ObserveBeneficiaries => self
                .ledger
                .members()
                .iter()
                .filter(|m| !output.contains(m.account.as_str()))
                .map(|m| format!("expected beneficiary {} is missing", m.account))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// The raw output of one completed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub index: usize,
    pub function: String,
    pub output: String,
}

#[derive(Debug, Clone)]
pub struct SequenceReport {
    pub outcomes: Vec<StepOutcome>,
    pub expected: ExpectationModel,
}

/// Runs a plan step by step against a live session, stopping at the first failure.
#[derive(Clone)]
pub struct ExerciseSequencer {
    plan: ExercisePlan,
    clock: Arc<dyn Clock>,
}

impl ExerciseSequencer {
    pub fn new(plan: ExercisePlan, clock: Arc<dyn Clock>) -> Self {
        Self { plan, clock }
    }

    pub async fn run(&self, scope: &SessionScope<'_>) -> Result<SequenceReport, DriverError> {
        let mut model = ExpectationModel::new(self.plan.owner.clone(), self.plan.unit);
        let mut outcomes = Vec::with_capacity(self.plan.steps.len());

        for (offset, step) in self.plan.steps.iter().enumerate() {
            let index = offset + 1;
            let _timer = StepTimer::new(&step.function);
            let fail = |e| abort(index, &step.function, e);

            // Deadlines and the model's checks both use the time the call goes out.
            let at = self.clock.since_epoch().map_err(fail)?;
            let mut next = model.clone();
            next.apply(step, at).map_err(fail)?;
            let payload = step.payload_at(self.plan.unit, at).map_err(fail)?;

            let caller = match step.caller {
                Caller::Owner => scope.owner().clone(),
                Caller::Instance => scope.deployment().instance_id.as_account(),
            };
            let output = scope
                .gateway()
                .call(&step.to_call(caller, payload))
                .await
                .map_err(fail)?;

            model = next;
            for problem in model.discrepancies(&step.effect, &output) {
                tracing::warn!(target: "sequence", step = index, function = %step.function, "{}", problem);
            }
            if step.effect == ExpectedEffect::ObserveActiveProposals {
                tracing::info!(
                    target: "sequence",
                    step = index,
                    expected_active = model.proposals.active().count(),
                    "observed active proposals"
                );
            }

            outcomes.push(StepOutcome {
                index,
                function: step.function.clone(),
                output,
            });
        }

        Ok(SequenceReport {
            outcomes,
            expected: model,
        })
    }
}

fn abort(step: usize, function: &str, source: DriverError) -> DriverError {
    DriverError::SequenceAbort {
        step,
        function: function.to_string(),
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SUBMITTED: Duration = Duration::from_secs(1_700_000_000);

    fn plan() -> ExercisePlan {
        ExercisePlan::donation_dao(
            &DriverConfig::default(),
            &"alice.testnet".into(),
            &"bob.alice.testnet".into(),
        )
        .unwrap()
    }

    fn deadline_of(payload: &Option<Value>) -> u64 {
        payload.as_ref().and_then(|p| p["deadline"].as_u64()).unwrap()
    }

    #[test]
    fn test_default_plan_order() {
        let plan = plan();
        let functions: Vec<&str> = plan.steps().iter().map(|s| s.function.as_str()).collect();
        assert_eq!(
            functions,
            vec![
                "init",
                "get_beneficiaries",
                "donate",
                "create_add_beneficiary_proposal",
                "get_proposals",
                "approve_proposal",
                "finalise_proposals",
                "get_proposals",
                "get_beneficiaries",
                "donate",
            ]
        );
    }

    #[test]
    fn test_proposal_deadline_is_stamped_when_issued() {
        let plan = plan();
        let create = &plan.steps()[3];
        assert_eq!(create.payload, None);

        let unit = TimestampUnit::Nanoseconds;
        assert_eq!(
            create.payload_at(unit, SUBMITTED).unwrap(),
            Some(json!({
                "deadline": (1_700_000_000u64 + 600) * 1_000_000_000,
                "account": "bob.alice.testnet",
                "share": 50,
                "isAuthoriser": false
            }))
        );

        // Issued fifteen minutes later, the window still starts at issue time.
        let later = SUBMITTED + Duration::from_secs(900);
        assert_eq!(
            deadline_of(&create.payload_at(unit, later).unwrap()),
            (1_700_000_000u64 + 900 + 600) * 1_000_000_000
        );
    }

    #[test]
    fn test_fixed_payloads() {
        let plan = plan();
        let unit = TimestampUnit::Nanoseconds;
        let payload = |i: usize| plan.steps()[i].payload_at(unit, SUBMITTED).unwrap();
        assert_eq!(plan.steps()[0].caller, Caller::Instance);
        assert_eq!(payload(0), Some(json!({"owner": "alice.testnet"})));
        assert_eq!(payload(4), Some(json!({"activeOnly": true})));
        assert_eq!(payload(5), Some(json!({"proposalId": 0})));
        assert_eq!(payload(6), None);
        assert_eq!(payload(1), None);
        assert_eq!(plan.steps()[2].amount.as_deref(), Some("1"));
    }

    #[test]
    fn test_nanosecond_deadline_survives_double_precision() {
        let plan = plan();
        let create = &plan.steps()[3];
        let deadline = deadline_of(&create.payload_at(TimestampUnit::Nanoseconds, SUBMITTED).unwrap());
        assert!(deadline > 1u64 << 53);
        let through_double = deadline as f64 as u64;
        assert!(through_double.abs_diff(deadline) < 1_000);
    }

    #[test]
    fn test_rehearsal_ends_with_new_beneficiary() {
        let model = plan().rehearse(SUBMITTED).unwrap();
        let bob = model.ledger.get(&"bob.alice.testnet".into()).unwrap();
        assert_eq!(bob.share, 50);
        assert_eq!(model.proposals.active().count(), 0);
        assert_eq!(model.donations, 2);
    }

    #[test]
    fn test_rehearsal_rejects_approve_before_create() {
        let mut steps = plan().steps().to_vec();
        steps.swap(3, 5);
        let bad = ExercisePlan::from_steps("alice.testnet".into(), TimestampUnit::Seconds, steps);
        match bad.rehearse(SUBMITTED).unwrap_err() {
            DriverError::SequenceAbort { step, function, source } => {
                assert_eq!(step, 4);
                assert_eq!(function, "approve_proposal");
                assert!(matches!(*source, DriverError::InvalidTransition(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rehearsal_rejects_calls_before_init() {
        let steps = plan().steps()[1..].to_vec();
        let bad = ExercisePlan::from_steps("alice.testnet".into(), TimestampUnit::Seconds, steps);
        assert!(bad.rehearse(SUBMITTED).is_err());
    }

    #[test]
    fn test_approval_after_the_deadline_is_refused() {
        let plan = plan();
        let mut model = ExpectationModel::new("alice.testnet".into(), TimestampUnit::Seconds);
        for step in &plan.steps()[..5] {
            model.apply(step, SUBMITTED).unwrap();
        }
        let overdue = SUBMITTED + Duration::from_secs(601);
        let err = model.apply(&plan.steps()[5], overdue).unwrap_err();
        assert!(matches!(err, DriverError::InvalidTransition(_)));
        assert_eq!(model.proposals.active().count(), 0);
    }

    #[test]
    fn test_proposing_the_owner_lists_it_twice() {
        let plan = ExercisePlan::donation_dao(
            &DriverConfig::default(),
            &"alice.testnet".into(),
            &"alice.testnet".into(),
        )
        .unwrap();
        let model = plan.rehearse(SUBMITTED).unwrap();
        assert_eq!(model.ledger.members().len(), 2);
        assert!(model.ledger.is_authoriser(&"alice.testnet".into()));
    }

    #[test]
    fn test_discrepancy_reported_for_missing_beneficiary() {
        let model = plan().rehearse(SUBMITTED).unwrap();
        let problems = model.discrepancies(
            &ExpectedEffect::ObserveBeneficiaries,
            "[ { account: 'alice.testnet', share: 100, isAuthoriser: true } ]",
        );
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("bob.alice.testnet"));
    }
}
