// Path: crates/cli/src/driver/mod.rs
//! The deployment driver: command execution, build, deploy/delete, the
//! scoped session that owns an instance, contract calls, and the exercise
//! sequence that runs inside the session.

pub mod build;
pub mod clock;
pub mod deploy;
pub mod executor;
pub mod gateway;
pub mod sequence;
pub mod session;

pub use build::ArtifactBuilder;
pub use clock::{Clock, SystemClock};
pub use deploy::{parse_instance_id, DeploymentManager};
pub use executor::{CommandExecutor, CommandSpec, ProcessOutput, ProcessRunner, SystemProcessRunner};
pub use gateway::{RemoteCall, RemoteCallGateway};
pub use sequence::{
    Caller, ExercisePlan, ExerciseSequencer, ExerciseStep, ExpectationModel, ExpectedEffect,
    SequenceReport, StepOutcome,
};
pub use session::{DeploymentSession, SessionScope};

use dao_types::app::AccountId;
use dao_types::{config::DriverConfig, DriverError};
use std::sync::Arc;

/// Builds, deploys and exercises the contract for `owner`, proposing `user` as a beneficiary.
///
/// The plan is rehearsed offline first, so an inconsistent plan fails before
/// anything is built or deployed. `clock` is read as each step is issued.
pub async fn drive(
    executor: CommandExecutor,
    config: DriverConfig,
    owner: AccountId,
    user: AccountId,
    clock: Arc<dyn Clock>,
) -> Result<SequenceReport, DriverError> {
    let plan = ExercisePlan::donation_dao(&config, &owner, &user)?;
    plan.rehearse(clock.since_epoch()?)?;
    if user == owner {
        tracing::warn!(
            target: "sequence",
            account = %owner,
            "the proposed beneficiary is the owner, who will be listed twice"
        );
    }

    let sequencer = ExerciseSequencer::new(plan, clock);
    let session = DeploymentSession::new(executor, config, owner);
    session
        .run(move |scope| Box::pin(async move { sequencer.run(&scope).await }))
        .await
}
