// Path: crates/cli/src/driver/session.rs

use super::build::ArtifactBuilder;
use super::deploy::DeploymentManager;
use super::executor::{CommandExecutor, CommandSpec};
use super::gateway::RemoteCallGateway;
use dao_telemetry::StepTimer;
use dao_types::app::{AccountId, Deployment};
use dao_types::{config::DriverConfig, DriverError, ErrorCode};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// What the work of a session gets to see: the live deployment and a gateway bound to it.
pub struct SessionScope<'s> {
    deployment: &'s Deployment,
    gateway: RemoteCallGateway<'s>,
}

impl<'s> SessionScope<'s> {
    fn new(
        deployment: &'s Deployment,
        executor: &'s CommandExecutor,
        config: &'s DriverConfig,
    ) -> Self {
        Self {
            deployment,
            gateway: RemoteCallGateway::new(executor, config, &deployment.instance_id),
        }
    }

    pub fn deployment(&self) -> &Deployment {
        self.deployment
    }

    pub fn gateway(&self) -> &RemoteCallGateway<'s> {
        &self.gateway
    }

    pub fn owner(&self) -> &AccountId {
        &self.deployment.owner
    }
}

/// Produces the future that resolves when the operator asks the run to stop.
type InterruptSource = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

async fn ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::warn!(target: "session", "Ctrl-C received, tearing down"),
        Err(e) => {
            tracing::error!(target: "session", error = %e, "Failed to install CTRL+C handler");
            std::future::pending::<()>().await;
        }
    }
}

/// Deletes the instance from a background task if the session future is
/// dropped while the instance is live (a timeout or a losing `select!` arm).
struct TeardownGuard {
    pending: Option<(CommandExecutor, CommandSpec)>,
}

impl TeardownGuard {
    fn arm(executor: &CommandExecutor, delete: CommandSpec) -> Self {
        Self {
            pending: Some((executor.clone(), delete)),
        }
    }

    fn disarm(&mut self) {
        self.pending = None;
    }
}

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        let Some((executor, delete)) = self.pending.take() else {
            return;
        };
        let command = delete.render();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                tracing::warn!(
                    target: "session",
                    command = %command,
                    "session dropped with a live instance, deleting it in the background"
                );
                handle.spawn(async move {
                    if let Err(e) = executor.execute(&delete).await {
                        tracing::error!(target: "session", code = e.code(), error = %e, "background teardown failed");
                    }
                });
            }
            Err(_) => tracing::error!(
                target: "session",
                command = %command,
                "session dropped outside a runtime, instance leaked"
            ),
        }
    }
}

/// Owns one ephemeral deployment for the duration of a unit of work.
///
/// [`DeploymentSession::run`] is the only way to obtain a live
/// [`Deployment`]. Once the instance is deployed, it is destroyed exactly
/// once when the work ends, whether the work returned `Ok`, returned `Err`,
/// panicked, or was cut short by an interrupt. If the `run` future itself is
/// dropped, the delete is issued from a background task. If the build or the
/// deploy fails nothing was created and nothing is destroyed.
pub struct DeploymentSession {
    executor: CommandExecutor,
    config: DriverConfig,
    owner: AccountId,
    interrupt: InterruptSource,
}

impl DeploymentSession {
    pub fn new(executor: CommandExecutor, config: DriverConfig, owner: AccountId) -> Self {
        Self {
            executor,
            config,
            owner,
            interrupt: Arc::new(|| ctrl_c().boxed()),
        }
    }

    /// Replaces Ctrl-C as the signal that stops the work early.
    pub fn with_interrupt<S, Fut>(mut self, signal: S) -> Self
    where
        S: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.interrupt = Arc::new(move || signal().boxed());
        self
    }

    /// Builds, deploys, runs `work` against the instance, then tears it down.
    ///
    /// If both the work and the teardown fail, the work's error is returned
    /// and the teardown failure is logged. If only the teardown fails, it is
    /// returned as [`DriverError::Teardown`]. An interrupt drops the work and
    /// is reported as [`DriverError::Interrupted`] after teardown. A panic
    /// inside `work` is resumed after teardown.
    pub async fn run<T, F>(&self, work: F) -> Result<T, DriverError>
    where
        F: for<'s> FnOnce(SessionScope<'s>) -> BoxFuture<'s, Result<T, DriverError>>,
    {
        {
            let _timer = StepTimer::new("build");
            ArtifactBuilder::new(&self.executor, &self.config)
                .build()
                .await?;
        }

        let manager = DeploymentManager::new(&self.executor, &self.config);
        let deployment = manager.deploy(&self.owner).await?;
        let instance = deployment.instance_id.clone();
        let mut guard = TeardownGuard::arm(&self.executor, manager.delete_command(&deployment));

        let outcome = {
            let scope = SessionScope::new(&deployment, &self.executor, &self.config);
            let work = AssertUnwindSafe(work(scope)).catch_unwind();
            tokio::select! {
                outcome = work => outcome,
                () = (self.interrupt)() => Ok(Err(DriverError::Interrupted {
                    instance: instance.to_string(),
                })),
            }
        };

        // From here the delete is issued inline, at most once.
        guard.disarm();
        let teardown = {
            let _timer = StepTimer::new("teardown");
            manager.destroy(deployment).await
        };

        match outcome {
            Ok(Ok(value)) => teardown.map(|()| value).map_err(|source| DriverError::Teardown {
                instance: instance.to_string(),
                source: Box::new(source),
            }),
            Ok(Err(primary)) => {
                if let Err(e) = teardown {
                    tracing::error!(
                        target: "session",
                        instance = %instance,
                        code = e.code(),
                        error = %e,
                        "teardown failed after the session had already failed"
                    );
                }
                Err(primary)
            }
            Err(panic) => {
                if let Err(e) = teardown {
                    tracing::error!(
                        target: "session",
                        instance = %instance,
                        error = %e,
                        "teardown failed while unwinding a panicked session"
                    );
                }
                std::panic::resume_unwind(panic)
            }
        }
    }
}
