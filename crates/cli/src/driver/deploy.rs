// Path: crates/cli/src/driver/deploy.rs

use super::executor::{CommandExecutor, CommandSpec};
use dao_types::app::{AccountId, Deployment, InstanceId};
use dao_types::{config::DriverConfig, DriverError};

/// Marker preceding the generated account on the first line of `dev-deploy` output.
pub const ACCOUNT_ID_MARKER: &str = "Account id: ";

/// Extracts the generated instance id from `dev-deploy` output.
///
/// Only the first line is inspected. The id is the text between
/// [`ACCOUNT_ID_MARKER`] and the next comma and must look like
/// `dev-<digits>-<digits>`.
pub fn parse_instance_id(output: &str) -> Result<InstanceId, DriverError> {
    let first_line = output.lines().next().unwrap_or_default();
    first_line
        .match_indices(ACCOUNT_ID_MARKER)
        .find_map(|(at, marker)| {
            let rest = first_line.get(at + marker.len()..)?;
            let (candidate, _) = rest.split_once(',')?;
            InstanceId::parse(candidate)
        })
        .ok_or_else(|| DriverError::ParseFailure {
            expected: format!("`{}dev-<digits>-<digits>,` on the first line", ACCOUNT_ID_MARKER),
            output: output.to_string(),
        })
}

/// Creates and deletes ephemeral contract instances.
pub struct DeploymentManager<'a> {
    executor: &'a CommandExecutor,
    config: &'a DriverConfig,
}

impl<'a> DeploymentManager<'a> {
    pub fn new(executor: &'a CommandExecutor, config: &'a DriverConfig) -> Self {
        Self { executor, config }
    }

    /// Deploys the built artifact to a freshly generated dev account.
    pub async fn deploy(&self, owner: &AccountId) -> Result<Deployment, DriverError> {
        tracing::info!(target: "deploy", "===== Deploying contract to testnet =====");
        let command = CommandSpec::new(&self.config.near_program)
            .arg("dev-deploy")
            .arg(self.config.artifact_path.to_string_lossy())
            .current_dir(&self.config.project_dir);
        let stdout = self.executor.execute(&command).await?;
        let instance_id = parse_instance_id(&stdout)?;

        tracing::info!(target: "deploy", instance = %instance_id, "contract deployed");
        Ok(Deployment {
            instance_id,
            artifact_path: self.config.artifact(),
            owner: owner.clone(),
        })
    }

    /// Deletes the instance, sending its residual balance to the deployment owner.
    pub async fn destroy(&self, deployment: Deployment) -> Result<(), DriverError> {
        tracing::info!(
            target: "deploy",
            instance = %deployment.instance_id,
            beneficiary = %deployment.owner,
            "===== Deleting contract ====="
        );
        self.executor
            .execute(&self.delete_command(&deployment))
            .await?;
        Ok(())
    }

    /// `near delete <instance> <owner>`
    pub fn delete_command(&self, deployment: &Deployment) -> CommandSpec {
        CommandSpec::new(&self.config.near_program)
            .arg("delete")
            .arg(deployment.instance_id.as_str())
            .arg(deployment.owner.as_str())
            .current_dir(&self.config.project_dir)
    }
}
