use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::debug;

/// Captured result of one external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Stdout followed by stderr, for log artifacts.
    pub fn combined(&self) -> String {
        let mut combined = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&self.stderr);
        }
        combined
    }

    pub fn describe_status(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external programs. Blocking; no timeout is imposed.
pub trait CommandRunner {
    /// Run to completion, capturing stdout and stderr.
    fn run(&self, program: &Path, args: &[OsString]) -> Result<ToolOutput>;

    /// Run with the terminal attached (installers, uninstallers).
    fn run_interactive(&self, program: &Path, args: &[OsString]) -> Result<ToolOutput>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<ToolOutput> {
        debug!(program = %program.display(), ?args, "running");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute {:?}", program))?;

        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn run_interactive(&self, program: &Path, args: &[OsString]) -> Result<ToolOutput> {
        debug!(program = %program.display(), ?args, "running attached");
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("Failed to execute {:?}", program))?;

        Ok(ToolOutput {
            success: status.success(),
            code: status.code(),
            ..ToolOutput::default()
        })
    }
}

/// Convenience for building argument vectors from string slices.
pub fn args<I, S>(items: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    items.into_iter().map(Into::into).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_output() {
        let output = ToolOutput {
            success: false,
            code: Some(1),
            stdout: "solving".to_string(),
            stderr: "conflict".to_string(),
        };
        assert_eq!(output.combined(), "solving\nconflict");
        assert_eq!(output.describe_status(), "exit code 1");
        assert_eq!(ToolOutput::ok("x\n").combined(), "x\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_system_runner_captures_status() {
        let runner = SystemRunner;
        let output = runner
            .run(Path::new("sh"), &args(["-c", "echo hi; echo oops >&2; exit 3"]))
            .unwrap();
        assert!(!output.success);
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "hi");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[test]
    fn test_missing_program_is_an_error() {
        let runner = SystemRunner;
        assert!(runner
            .run(Path::new("definitely-not-a-real-program-xyz"), &[])
            .is_err());
    }
}
