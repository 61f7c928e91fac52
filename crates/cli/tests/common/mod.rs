// Path: crates/cli/tests/common/mod.rs

#![allow(dead_code)]

use async_trait::async_trait;
use dao_cli::driver::{Clock, CommandExecutor, CommandSpec, ProcessOutput, ProcessRunner};
use dao_types::config::DriverConfig;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

pub const INSTANCE_ID: &str = "dev-1696000000-12345678";
pub const OWNER: &str = "alice.testnet";
pub const USER: &str = "bob.alice.testnet";

pub const DEPLOY_STDOUT: &str = "Account id: dev-1696000000-12345678, node: https://rpc.testnet.near.org, helper: https://helper.testnet.near.org\n\
Transaction Id 7chs2gT3mTn7tRbQ8ZUx8C4JbAGya3psaJQT1bH79iDp\n\
Done deploying to dev-1696000000-12345678\n";

type Matcher = Box<dyn Fn(&CommandSpec) -> bool + Send + Sync>;

/// A clock that only moves when a test (or a scripted command) moves it.
pub struct TestClock {
    now: Mutex<SystemTime>,
}

impl TestClock {
    pub fn at(secs_since_epoch: u64) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(UNIX_EPOCH + Duration::from_secs(secs_since_epoch)),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for TestClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap()
    }
}

/// A `ProcessRunner` that records every command and answers from a script.
///
/// Unscripted commands get a plausible successful response: `dev-deploy`
/// prints [`DEPLOY_STDOUT`], everything else prints a short line.
#[derive(Default)]
pub struct ScriptedRunner {
    calls: Mutex<Vec<(CommandSpec, Option<SystemTime>)>>,
    overrides: Vec<(Matcher, ProcessOutput)>,
    stalls: Vec<Matcher>,
    clock: Option<Arc<TestClock>>,
    durations: Vec<(Matcher, Duration)>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers the first command matching `matcher` (and every later one) with `output`.
    pub fn respond_when(
        mut self,
        matcher: impl Fn(&CommandSpec) -> bool + Send + Sync + 'static,
        output: ProcessOutput,
    ) -> Self {
        self.overrides.push((Box::new(matcher), output));
        self
    }

    pub fn fail_when(
        self,
        matcher: impl Fn(&CommandSpec) -> bool + Send + Sync + 'static,
        stderr: &str,
    ) -> Self {
        self.respond_when(
            matcher,
            ProcessOutput {
                stdout: String::new(),
                stderr: stderr.to_string(),
                status: Some(1),
            },
        )
    }

    /// Matching commands are recorded and then never complete.
    pub fn stall_when(
        mut self,
        matcher: impl Fn(&CommandSpec) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.stalls.push(Box::new(matcher));
        self
    }

    /// Stamps every command with `clock`'s time when it starts.
    pub fn with_clock(mut self, clock: Arc<TestClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Matching commands move the attached clock forward by `took`.
    pub fn taking(
        mut self,
        matcher: impl Fn(&CommandSpec) -> bool + Send + Sync + 'static,
        took: Duration,
    ) -> Self {
        self.durations.push((Box::new(matcher), took));
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(c, _)| c.clone())
            .collect()
    }

    /// Commands with the clock time they were started at.
    pub fn stamped_calls(&self) -> Vec<(CommandSpec, SystemTime)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(c, at)| at.map(|at| (c.clone(), at)))
            .collect()
    }

    /// The contract functions invoked through `near call`, in order.
    pub fn remote_functions(&self) -> Vec<String> {
        self.calls()
            .iter()
            .filter(|c| is_subcommand(c, "call"))
            .map(|c| c.args[2].clone())
            .collect()
    }

    pub fn remote_calls(&self) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|c| is_subcommand(c, "call"))
            .collect()
    }

    pub fn deletes(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|c| is_subcommand(c, "delete"))
            .map(|c| c.args)
            .collect()
    }

    pub fn deploys(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| is_subcommand(c, "dev-deploy"))
            .count()
    }

    fn default_response(command: &CommandSpec) -> ProcessOutput {
        let stdout = if is_subcommand(command, "dev-deploy") {
            DEPLOY_STDOUT.to_string()
        } else {
            format!("ok: {}", command.render())
        };
        ProcessOutput {
            stdout,
            stderr: String::new(),
            status: Some(0),
        }
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(&self, command: &CommandSpec) -> std::io::Result<ProcessOutput> {
        let started = self.clock.as_ref().map(|clock| clock.now());
        self.calls.lock().unwrap().push((command.clone(), started));

        if self.stalls.iter().any(|matcher| matcher(command)) {
            std::future::pending::<()>().await;
        }
        if let Some(clock) = &self.clock {
            for (matcher, took) in &self.durations {
                if matcher(command) {
                    clock.advance(*took);
                }
            }
        }
        let scripted = self
            .overrides
            .iter()
            .find(|(matcher, _)| matcher(command))
            .map(|(_, output)| output.clone());
        Ok(scripted.unwrap_or_else(|| Self::default_response(command)))
    }
}

pub fn is_subcommand(command: &CommandSpec, sub: &str) -> bool {
    command.program == "near" && command.args.first().map(String::as_str) == Some(sub)
}

/// Matches `near call <instance> <function> ...`.
pub fn is_remote_call(function: &'static str) -> impl Fn(&CommandSpec) -> bool {
    move |c| is_subcommand(c, "call") && c.args.get(2).map(String::as_str) == Some(function)
}

pub fn is_build() -> impl Fn(&CommandSpec) -> bool {
    |c| c.program == "yarn"
}

/// A config rooted in a throw-away project directory.
pub fn test_config() -> (TempDir, DriverConfig) {
    let dir = tempfile::tempdir().unwrap();
    let config = DriverConfig {
        project_dir: dir.path().to_path_buf(),
        ..DriverConfig::default()
    };
    (dir, config)
}

pub fn executor(runner: &Arc<ScriptedRunner>) -> CommandExecutor {
    CommandExecutor::new(runner.clone())
}
