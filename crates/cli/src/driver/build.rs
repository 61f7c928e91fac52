// Path: crates/cli/src/driver/build.rs

use super::executor::{CommandExecutor, CommandSpec};
use dao_types::{config::DriverConfig, DriverError};
use std::path::{Path, PathBuf};

/// Produces the release artifact from a clean deployment-metadata state.
pub struct ArtifactBuilder<'a> {
    executor: &'a CommandExecutor,
    config: &'a DriverConfig,
}

impl<'a> ArtifactBuilder<'a> {
    pub fn new(executor: &'a CommandExecutor, config: &'a DriverConfig) -> Self {
        Self { executor, config }
    }

    /// Clears stale metadata, runs the build command, and returns the artifact path.
    pub async fn build(&self) -> Result<PathBuf, DriverError> {
        reset_metadata_dir(&self.config.metadata_path()).await?;

        tracing::info!(target: "build", "===== Building release version =====");
        let command = CommandSpec::from_tokens(&self.config.build_command)?
            .current_dir(&self.config.project_dir);
        self.executor.execute(&command).await?;

        Ok(self.config.artifact())
    }
}

/// Removes a previous run's metadata directory so `dev-deploy` creates a fresh account.
async fn reset_metadata_dir(path: &Path) -> Result<(), DriverError> {
    if path.is_dir() {
        tracing::info!(target: "build", path = %path.display(), "removing stale deployment metadata");
        tokio::fs::remove_dir_all(path).await?;
    }
    Ok(())
}
