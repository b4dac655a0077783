//! Synchronous subprocess execution
//!
//! All container runtime calls go through [`ProcessRunner`] so the pipeline
//! can be driven against a scripted runtime in tests.

use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

/// Result of a subprocess execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,

    /// Process exit code, -1 when terminated by a signal
    pub exit_code: i32,

    /// Captured standard output (empty for inherited streams)
    pub stdout: String,

    /// Captured standard error (empty for inherited streams)
    pub stderr: String,

    /// Execution duration
    pub duration: Duration,
}

impl CommandResult {
    /// Create a CommandResult from an exit status
    pub fn from_status(
        status: ExitStatus,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        let exit_code = status.code().unwrap_or(-1);
        Self {
            success: status.success(),
            exit_code,
            stdout,
            stderr,
            duration,
        }
    }

    /// Exit code, or `None` if the process did not exit normally
    pub fn code(&self) -> Option<i32> {
        (self.exit_code >= 0).then_some(self.exit_code)
    }

    /// Short human readable failure reason
    pub fn failure_reason(&self) -> String {
        let stderr = self.stderr.trim();
        match self.code() {
            Some(code) if stderr.is_empty() => format!("exit status {}", code),
            Some(code) => format!("exit status {}: {}", code, stderr),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Executes external programs and waits for them to finish
pub trait ProcessRunner {
    /// Run with the current process's stdin/stdout/stderr attached
    fn run_inherited(&self, program: &str, args: &[String]) -> Result<CommandResult>;

    /// Run with stdout and stderr captured
    fn run_captured(&self, program: &str, args: &[String]) -> Result<CommandResult>;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
    fn run_inherited(&self, program: &str, args: &[String]) -> Result<CommandResult> {
        (**self).run_inherited(program, args)
    }

    fn run_captured(&self, program: &str, args: &[String]) -> Result<CommandResult> {
        (**self).run_captured(program, args)
    }
}

/// Runs real processes found on PATH
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn command(program: &str, args: &[String]) -> Result<Command> {
        let path = which::which(program)
            .with_context(|| format!("{} not found in PATH", program))?;
        let mut cmd = Command::new(path);
        cmd.args(args);
        Ok(cmd)
    }
}

impl ProcessRunner for SystemRunner {
    fn run_inherited(&self, program: &str, args: &[String]) -> Result<CommandResult> {
        let start = Instant::now();
        tracing::debug!(program, ?args, "running with inherited stdio");

        let status = Self::command(program, args)?
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("Failed to execute {}", program))?;

        let duration = start.elapsed();
        tracing::debug!(program, code = ?status.code(), ?duration, "process finished");
        Ok(CommandResult::from_status(status, String::new(), String::new(), duration))
    }

    fn run_captured(&self, program: &str, args: &[String]) -> Result<CommandResult> {
        let start = Instant::now();
        tracing::debug!(program, ?args, "running with captured output");

        let output = Self::command(program, args)?
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute {}", program))?;

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        tracing::debug!(program, code = ?output.status.code(), ?duration, "process finished");
        Ok(CommandResult::from_status(output.status, stdout, stderr, duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit_code: i32, stderr: &str) -> CommandResult {
        CommandResult {
            success: exit_code == 0,
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_failure_reason() {
        assert_eq!(result(1, "").failure_reason(), "exit status 1");
        assert_eq!(result(2, "  denied \n").failure_reason(), "exit status 2: denied");
        assert_eq!(result(-1, "").failure_reason(), "terminated by signal");
        assert_eq!(result(-1, "").code(), None);
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let err = SystemRunner
            .run_captured("xgo-definitely-not-installed", &[])
            .unwrap_err();
        assert!(err.to_string().contains("not found in PATH"));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout() {
        let out = SystemRunner
            .run_captured("sh", &["-c".to_string(), "echo hello".to_string()])
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "hello");
    }
}
