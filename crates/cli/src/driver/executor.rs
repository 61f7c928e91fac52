// Path: crates/cli/src/driver/executor.rs

use async_trait::async_trait;
use dao_types::DriverError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command as TokioCommand;

/// A fully specified external command: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Builds a command from a token list whose first token is the program.
    pub fn from_tokens(tokens: &[String]) -> Result<Self, DriverError> {
        let (program, args) = tokens
            .split_first()
            .ok_or_else(|| DriverError::Config("command token list is empty".into()))?;
        Ok(Self::new(program.clone()).args(args.iter().cloned()))
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    /// The command line as a single string, for logs and error messages.
    pub fn render(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Everything a finished process left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` if the process was terminated by a signal.
    pub status: Option<i32>,
}

/// A trait for abstracting how external processes are launched (real OS process vs. scripted).
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs the command to completion and captures both output streams.
    async fn run(&self, command: &CommandSpec) -> std::io::Result<ProcessOutput>;
}

/// Launches real child processes through `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, command: &CommandSpec) -> std::io::Result<ProcessOutput> {
        let mut cmd = TokioCommand::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }
        let output = cmd.output().await?;
        Ok(ProcessOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        })
    }
}

/// Runs commands and classifies their outcome.
///
/// A command succeeds only if its error stream is empty. Any stderr text,
/// even a warning from a zero-exit process, is a `CommandFailure`; a
/// non-zero exit with an empty error stream still counts as success.
#[derive(Clone)]
pub struct CommandExecutor {
    runner: Arc<dyn ProcessRunner>,
}

impl CommandExecutor {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(SystemProcessRunner))
    }

    /// Runs the command, echoes its stdout, and returns it if stderr stayed empty.
    pub async fn execute(&self, command: &CommandSpec) -> Result<String, DriverError> {
        let rendered = command.render();
        tracing::debug!(target: "executor", command = %rendered, "running command");

        let output = self
            .runner
            .run(command)
            .await
            .map_err(|source| DriverError::Spawn {
                command: rendered.clone(),
                source,
            })?;

        println!("{}", output.stdout);

        if !output.stderr.is_empty() {
            eprintln!("{}", output.stderr);
            tracing::error!(
                target: "executor",
                command = %rendered,
                status = ?output.status,
                "command wrote to stderr"
            );
            return Err(DriverError::CommandFailure {
                command: rendered,
                stderr: output.stderr,
            });
        }

        if output.status != Some(0) {
            tracing::warn!(
                target: "executor",
                command = %rendered,
                status = ?output.status,
                "command exited abnormally with an empty error stream; treating as success"
            );
        }
        Ok(output.stdout)
    }
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor").finish_non_exhaustive()
    }
}
