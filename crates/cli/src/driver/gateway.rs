// Path: crates/cli/src/driver/gateway.rs

use super::executor::{CommandExecutor, CommandSpec};
use dao_types::app::{AccountId, InstanceId};
use dao_types::{config::DriverConfig, DriverError};
use serde_json::Value;

/// One invocation of a contract method.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub function: String,
    pub caller: AccountId,
    /// JSON arguments. `None` omits the argument token entirely.
    pub payload: Option<Value>,
    /// Attached deposit. `None` omits the `--amount` flag.
    pub amount: Option<String>,
}

impl RemoteCall {
    pub fn new(function: impl Into<String>, caller: AccountId) -> Self {
        Self {
            function: function.into(),
            caller,
            payload: None,
            amount: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount = Some(amount.into());
        self
    }
}

/// Issues contract calls against one deployed instance.
pub struct RemoteCallGateway<'a> {
    executor: &'a CommandExecutor,
    config: &'a DriverConfig,
    instance: &'a InstanceId,
}

impl<'a> RemoteCallGateway<'a> {
    pub fn new(
        executor: &'a CommandExecutor,
        config: &'a DriverConfig,
        instance: &'a InstanceId,
    ) -> Self {
        Self {
            executor,
            config,
            instance,
        }
    }

    /// `near call <instance> <function> [<json>] --accountId <caller> [--amount <amount>]`
    pub fn command_for(&self, call: &RemoteCall) -> CommandSpec {
        let mut command = CommandSpec::new(&self.config.near_program)
            .arg("call")
            .arg(self.instance.as_str())
            .arg(call.function.as_str());
        if let Some(payload) = &call.payload {
            command = command.arg(payload.to_string());
        }
        command = command.arg("--accountId").arg(call.caller.as_str());
        if let Some(amount) = &call.amount {
            command = command.arg("--amount").arg(amount.as_str());
        }
        command.current_dir(&self.config.project_dir)
    }

    /// Runs the call and returns its raw stdout; result shapes are the caller's concern.
    pub async fn call(&self, call: &RemoteCall) -> Result<String, DriverError> {
        tracing::info!(
            target: "gateway",
            function = %call.function,
            caller = %call.caller,
            "===== Calling {} =====",
            call.function
        );
        self.executor.execute(&self.command_for(call)).await
    }
}
