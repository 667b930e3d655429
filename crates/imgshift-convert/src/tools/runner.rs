//! External tool execution.
//!
//! Runs conversion tools as child processes inside a workspace, with
//! timeout management and output verification.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::process::Command;

/// Maximum stderr characters kept on a failure.
const STDERR_LIMIT: usize = 2000;

/// Errors from running an external tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The executable could not be found.
    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// The process exceeded its time budget and was killed.
    #[error("'{command}' timed out after {seconds} seconds")]
    Timeout {
        /// The command that timed out.
        command: String,
        /// The timeout that was exceeded.
        seconds: u64,
    },

    /// The process exited unsuccessfully.
    #[error("'{command}' failed with {}: {stderr}", exit_description(.code))]
    ProcessFailed {
        /// The command that failed.
        command: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error (truncated).
        stderr: String,
    },

    /// IO error while spawning or collecting the process.
    #[error("IO error running tool: {0}")]
    Io(#[from] std::io::Error),

    /// The tool succeeded but the expected output file is absent.
    #[error("Expected output file not created: {}", .0.display())]
    OutputMissing(PathBuf),

    /// The tool succeeded but wrote an empty output file.
    #[error("Output file is empty: {}", .0.display())]
    OutputEmpty(PathBuf),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "signal termination".to_string(),
    }
}

/// Where the child's standard output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdoutMode {
    /// Collected and discarded.
    #[default]
    Discard,
    /// Written straight into the invocation's output file.
    IntoOutput,
}

/// One fully-resolved tool invocation.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Executable name or path.
    pub command: String,
    /// Arguments, placeholders already substituted.
    pub args: Vec<String>,
    /// Working directory, normally the workspace.
    pub working_dir: PathBuf,
    /// Time budget.
    pub timeout: Duration,
    /// File the tool is expected to produce.
    pub output_path: PathBuf,
    /// Stdout handling.
    pub stdout: StdoutMode,
}

/// Outcome of a successful invocation.
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    /// The verified output file.
    pub output_path: PathBuf,
    /// Output size in bytes.
    pub output_size: u64,
    /// Wall-clock duration.
    pub duration: Duration,
}

/// Values substituted into argument templates.
#[derive(Debug, Clone, Default)]
pub struct ArgVars<'a> {
    /// `{input}`
    pub input: Option<&'a Path>,
    /// `{output}`; `{output_dir}` is derived from it.
    pub output: Option<&'a Path>,
    /// `{dpi}`
    pub dpi: Option<u32>,
}

/// Executes external tools.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolRunner;

impl ToolRunner {
    /// Create a runner.
    pub fn new() -> Self {
        Self
    }

    /// Substitute `{input}`, `{output}`, `{output_dir}` and `{dpi}` in a
    /// template.
    pub fn substitute_args(&self, template: &[&str], vars: &ArgVars<'_>) -> Vec<String> {
        let input = vars
            .input
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let output = vars
            .output
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let output_dir = vars
            .output
            .and_then(Path::parent)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let dpi = vars.dpi.map(|d| d.to_string()).unwrap_or_default();

        template
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output_dir}", &output_dir)
                    .replace("{output}", &output)
                    .replace("{dpi}", &dpi)
            })
            .collect()
    }

    /// Run an invocation and verify its output file.
    pub async fn execute(&self, invocation: &ToolInvocation) -> Result<ToolOutcome, ToolError> {
        let start = Instant::now();

        tracing::debug!(
            command = %invocation.command,
            args = ?invocation.args,
            output = %invocation.output_path.display(),
            "Executing tool"
        );

        // `output()` replaces a caller-supplied stdout with a pipe, so
        // captured output is written to the file once the process exits.
        let stdout = match invocation.stdout {
            StdoutMode::Discard => Stdio::null(),
            StdoutMode::IntoOutput => Stdio::piped(),
        };

        let mut cmd = Command::new(&invocation.command);
        cmd.args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = tokio::time::timeout(invocation.timeout, cmd.output()).await;
        let duration = start.elapsed();

        let output = match result {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::CommandNotFound(invocation.command.clone()));
            }
            Ok(Err(e)) => return Err(ToolError::Io(e)),
            Err(_) => {
                tracing::warn!(
                    command = %invocation.command,
                    timeout_secs = invocation.timeout.as_secs(),
                    "Tool timed out, process killed"
                );
                return Err(ToolError::Timeout {
                    command: invocation.command.clone(),
                    seconds: invocation.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr: String = String::from_utf8_lossy(&output.stderr)
                .chars()
                .take(STDERR_LIMIT)
                .collect();
            return Err(ToolError::ProcessFailed {
                command: invocation.command.clone(),
                code: output.status.code(),
                stderr,
            });
        }

        if invocation.stdout == StdoutMode::IntoOutput {
            tokio::fs::write(&invocation.output_path, &output.stdout).await?;
        }

        let output_size = match tokio::fs::metadata(&invocation.output_path).await {
            Ok(meta) => meta.len(),
            Err(_) => return Err(ToolError::OutputMissing(invocation.output_path.clone())),
        };
        if output_size == 0 {
            return Err(ToolError::OutputEmpty(invocation.output_path.clone()));
        }

        tracing::debug!(
            command = %invocation.command,
            duration_ms = duration.as_millis() as u64,
            output_size,
            "Tool completed"
        );

        Ok(ToolOutcome {
            output_path: invocation.output_path.clone(),
            output_size,
            duration,
        })
    }

    /// Check whether a command resolves to an executable file.
    ///
    /// Paths containing a separator are checked directly; bare names are
    /// looked up on `PATH`.
    pub fn check_command_available(&self, command: &str) -> bool {
        let path = Path::new(command);
        if path.components().count() > 1 {
            return path.is_file();
        }

        let Some(search_path) = std::env::var_os("PATH") else {
            return false;
        };

        std::env::split_paths(&search_path).any(|dir| {
            let candidate = dir.join(command);
            candidate.is_file() || (cfg!(windows) && candidate.with_extension("exe").is_file())
        })
    }
}
