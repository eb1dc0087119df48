//! Shell-free command executor
//!
//! Builds an argument vector from an action's command template and runs it
//! with `tokio::process::Command`. No shell is involved: parameter values can
//! only ever land inside a single argv word.
//!
//! Each child runs in its own process group. The group is killed when the
//! per-action timeout fires or when the invocation is dropped before the
//! child finishes, so no descendants are left behind.

pub mod parser;

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command as TokioCommand;
use tracing::{debug, info, warn};

use self::parser::{ParseError, TemplateParser};
use super::output::normalize_terminal_output;
use super::params::{ParameterResolver, ResolvedEnvironment};
use crate::config::actions::Action;
use crate::io::env::{EnvLookup, ProcessEnv};
use crate::io::paths::resolve_project_path;

/// A fully built command, ready to spawn
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Program to execute (looked up on PATH unless it contains a slash)
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Overlaid on the inherited process environment
    pub env_vars: HashMap<String, String>,
}

/// Captured result of a completed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Normalized standard output
    pub stdout: String,
    /// Normalized standard error
    pub stderr: String,
    /// Exit status; `-N` when the process was killed by signal N
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Per-invocation failures
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Required environment variable '{param}' not set for action '{action}'")]
    MissingEnvVar { action: String, param: String },

    #[error("Required parameter '{param}' not provided for action '{action}'")]
    MissingParameter { action: String, param: String },

    #[error(
        "Invalid path '{value}' for parameter '{param}' in action '{action}'. Path must be within the project directory"
    )]
    InvalidPath {
        action: String,
        param: String,
        value: String,
    },

    #[error("Path '{value}' for parameter '{param}' in action '{action}' does not exist")]
    PathNotFound {
        action: String,
        param: String,
        value: String,
    },

    #[error(
        "Invalid run_path '{run_path}' for action '{action}'. Path must be within the project directory"
    )]
    InvalidRunPath { action: String, run_path: String },

    #[error("Invalid command for action '{action}': {source}")]
    CommandSyntax {
        action: String,
        #[source]
        source: ParseError,
    },

    #[error("Command for action '{action}' timed out after {timeout_secs} seconds")]
    Timeout { action: String, timeout_secs: u64 },

    #[error("Failed to execute command for action '{action}': {source}")]
    Launch {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unexpected error while executing action '{action}': {message}")]
    Unexpected { action: String, message: String },
}

impl ExecutionError {
    /// Name of the action the failure belongs to
    pub fn action(&self) -> &str {
        match self {
            Self::MissingEnvVar { action, .. }
            | Self::MissingParameter { action, .. }
            | Self::InvalidPath { action, .. }
            | Self::PathNotFound { action, .. }
            | Self::InvalidRunPath { action, .. }
            | Self::CommandSyntax { action, .. }
            | Self::Timeout { action, .. }
            | Self::Launch { action, .. }
            | Self::Unexpected { action, .. } => action,
        }
    }

    /// Boundary violations by a parameter or run_path
    pub fn is_security_rejection(&self) -> bool {
        matches!(self, Self::InvalidPath { .. } | Self::InvalidRunPath { .. })
    }
}

/// Runs actions inside a project root
#[derive(Clone)]
pub struct CommandExecutor {
    project_root: PathBuf,
    env: Arc<dyn EnvLookup>,
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("project_root", &self.project_root)
            .finish_non_exhaustive()
    }
}

impl CommandExecutor {
    /// Executor reading the real process environment
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self::with_env(project_root, Arc::new(ProcessEnv))
    }

    pub fn with_env(project_root: impl Into<PathBuf>, env: Arc<dyn EnvLookup>) -> Self {
        Self {
            project_root: project_root.into(),
            env,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn resolver(&self) -> ParameterResolver<'_> {
        ParameterResolver::new(&self.project_root, self.env.as_ref())
    }

    /// Resolve caller arguments and run the action
    pub async fn execute_action(
        &self,
        action: &Action,
        arguments: &Map<String, Value>,
    ) -> Result<ExecutionResult, ExecutionError> {
        info!("Executing action '{}'", action.name);
        let resolved = self.resolver().resolve(action, arguments)?;
        self.execute(action, &resolved).await
    }

    /// Run an action with already resolved parameters
    pub async fn execute(
        &self,
        action: &Action,
        resolved: &ResolvedEnvironment,
    ) -> Result<ExecutionResult, ExecutionError> {
        let command = self.build_command(action, resolved)?;
        self.run(action, &command).await
    }

    /// Build argv, working directory and environment overlay
    pub fn build_command(
        &self,
        action: &Action,
        resolved: &ResolvedEnvironment,
    ) -> Result<Command, ExecutionError> {
        let mut argv = TemplateParser::new(resolved)
            .parse(&action.command)
            .map_err(|source| ExecutionError::CommandSyntax {
                action: action.name.clone(),
                source,
            })?
            .into_iter();

        // tokenize() never yields an empty vector
        let program = argv.next().ok_or_else(|| ExecutionError::CommandSyntax {
            action: action.name.clone(),
            source: ParseError::EmptyCommand,
        })?;

        Ok(Command {
            program,
            args: argv.collect(),
            working_dir: self.working_dir(action)?,
            env_vars: resolved
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    /// Project root, or the validated `run_path` beneath it
    pub fn working_dir(&self, action: &Action) -> Result<PathBuf, ExecutionError> {
        match &action.run_path {
            None => Ok(self.project_root.clone()),
            Some(run_path) => resolve_project_path(run_path, &self.project_root, self.env.as_ref())
                .map_err(|rejection| {
                    warn!(
                        "Rejected run_path '{}' for action '{}': {}",
                        run_path, action.name, rejection
                    );
                    ExecutionError::InvalidRunPath {
                        action: action.name.clone(),
                        run_path: run_path.clone(),
                    }
                }),
        }
    }

    async fn run(&self, action: &Action, command: &Command) -> Result<ExecutionResult, ExecutionError> {
        debug!(
            "Spawning {:?} {:?} in {}",
            command.program,
            command.args,
            command.working_dir.display()
        );

        let mut cmd = TokioCommand::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&command.working_dir)
            .envs(&command.env_vars)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let launch_error = |source| ExecutionError::Launch {
            action: action.name.clone(),
            source,
        };

        let mut child = cmd.spawn().map_err(launch_error)?;
        let guard = ProcessGroupGuard::new(child.id());
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let limit = Duration::from_secs(action.timeout);
        let completion = async {
            tokio::try_join!(child.wait(), read_pipe(stdout), read_pipe(stderr))
        };

        let outcome = tokio::time::timeout(limit, completion).await;
        match outcome {
            Ok(Ok((status, stdout, stderr))) => {
                guard.disarm();
                let exit_code = exit_code(status);
                info!("Action '{}' exited with code {}", action.name, exit_code);
                Ok(ExecutionResult {
                    stdout: normalize_terminal_output(&String::from_utf8_lossy(&stdout)),
                    stderr: normalize_terminal_output(&String::from_utf8_lossy(&stderr)),
                    exit_code,
                })
            }
            Ok(Err(source)) => Err(launch_error(source)),
            Err(_) => {
                warn!(
                    "Action '{}' timed out after {} seconds, killing process group",
                    action.name, action.timeout
                );
                drop(guard);
                // Reap the leader; it may already be gone
                let _ = child.kill().await;
                Err(ExecutionError::Timeout {
                    action: action.name.clone(),
                    timeout_secs: action.timeout,
                })
            }
        }
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

#[cfg(unix)]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| -sig))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Kills the child's process group on drop unless disarmed
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid }
    }

    fn disarm(mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_process_group(pgid);
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg only sends a signal; a stale group id yields ESRCH
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(
            "killpg({}) failed: {}",
            pgid,
            std::io::Error::last_os_error()
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}
