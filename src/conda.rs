//! Thin wrapper around the `conda`/`mamba` command line.
//!
//! Only argument construction and output parsing live here; success or
//! failure is always the external tool's exit status.

use crate::runner::{CommandRunner, ToolOutput};
use anyhow::{bail, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// An environment known to a package-manager installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentDescriptor {
    pub name: String,
    pub prefix: PathBuf,
}

pub struct Conda<'r> {
    exe: PathBuf,
    runner: &'r dyn CommandRunner,
}

impl<'r> Conda<'r> {
    pub fn new(exe: impl Into<PathBuf>, runner: &'r dyn CommandRunner) -> Self {
        Self {
            exe: exe.into(),
            runner,
        }
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    /// Run an arbitrary subcommand.
    pub fn run<S: AsRef<std::ffi::OsStr>>(&self, args: &[S]) -> Result<ToolOutput> {
        let args: Vec<OsString> = args.iter().map(|arg| arg.as_ref().to_os_string()).collect();
        self.runner.run(&self.exe, &args)
    }

    pub fn list_environments(&self) -> Result<Vec<EnvironmentDescriptor>> {
        let output = self.run(&["env", "list"])?;
        if !output.success {
            bail!(
                "`{} env list` failed ({}): {}",
                self.exe.display(),
                output.describe_status(),
                output.stderr.trim()
            );
        }
        Ok(parse_env_list(&output.stdout))
    }

    pub fn environment_names(&self) -> Result<Vec<String>> {
        Ok(self
            .list_environments()?
            .into_iter()
            .map(|env| env.name)
            .collect())
    }

    /// Export one environment without build strings.
    pub fn export_environment(&self, name: &str, from_history: bool) -> Result<ToolOutput> {
        let mut args = vec!["env", "export", "-n", name, "--no-builds"];
        if from_history {
            args.push("--from-history");
        }
        self.run(&args)
    }

    pub fn create_environment(&self, file: &Path) -> Result<ToolOutput> {
        self.run(&[
            OsString::from("env"),
            OsString::from("create"),
            OsString::from("-f"),
            file.as_os_str().to_os_string(),
        ])
    }

    /// Update in place. Packages missing from the file are left installed.
    pub fn update_environment(&self, name: &str, file: &Path) -> Result<ToolOutput> {
        self.run(&[
            OsString::from("env"),
            OsString::from("update"),
            OsString::from("-n"),
            OsString::from(name),
            OsString::from("-f"),
            file.as_os_str().to_os_string(),
        ])
    }

    pub fn reverse_init_all_shells(&self) -> Result<ToolOutput> {
        self.run(&["init", "--reverse", "--all"])
    }

    pub fn has_package(&self, env: &str, package: &str) -> Result<bool> {
        let output = self.run(&["list", "-n", env, package])?;
        Ok(output.success && lists_package(&output.stdout, package))
    }

    pub fn install_package(&self, env: &str, package: &str) -> Result<ToolOutput> {
        self.run(&["install", "-n", env, "-y", package])
    }
}

/// Parse `conda env list` text. Path-only (unnamed) environments are skipped.
pub fn parse_env_list(text: &str) -> Vec<EnvironmentDescriptor> {
    text.lines()
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter_map(|line| {
            let tokens: Vec<&str> = line
                .split_whitespace()
                .filter(|token| *token != "*" && *token != "+")
                .collect();
            let name = *tokens.first()?;
            if name.contains('/') || name.contains('\\') {
                return None;
            }
            let prefix = tokens.get(1..).map(|rest| rest.join(" ")).unwrap_or_default();
            Some(EnvironmentDescriptor {
                name: name.to_string(),
                prefix: PathBuf::from(prefix),
            })
        })
        .collect()
}

fn lists_package(listing: &str, package: &str) -> bool {
    listing
        .lines()
        .filter(|line| !line.starts_with('#'))
        .any(|line| line.split_whitespace().next() == Some(package))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeRunner;

    const LISTING: &str = "# conda environments:\n#\nbase                  *  /home/u/anaconda3\ndevA                     /home/u/anaconda3/envs/devA\n                         /elsewhere/unnamed\ndevB                     /home/u/My Envs/devB\n\n";

    #[test]
    fn test_parse_env_list() {
        let envs = parse_env_list(LISTING);
        let names: Vec<&str> = envs.iter().map(|env| env.name.as_str()).collect();
        assert_eq!(names, vec!["base", "devA", "devB"]);
        assert_eq!(envs[0].prefix, PathBuf::from("/home/u/anaconda3"));
        assert_eq!(envs[1].prefix, PathBuf::from("/home/u/anaconda3/envs/devA"));
        assert_eq!(envs[2].prefix, PathBuf::from("/home/u/My Envs/devB"));
    }

    #[test]
    fn test_parse_env_list_windows_paths() {
        let listing = "base                  *  C:\\Users\\u\\anaconda3\nC:\\other\\env\n";
        let envs = parse_env_list(listing);
        assert_eq!(envs.len(), 1);
        assert_eq!(envs[0].name, "base");
    }

    #[test]
    fn test_export_arguments() {
        let runner = FakeRunner::new(&["base"]);
        let conda = Conda::new("/fake/bin/conda", &runner);
        conda.export_environment("base", false).unwrap();
        conda.export_environment("base", true).unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0], "env export -n base --no-builds");
        assert_eq!(calls[1], "env export -n base --no-builds --from-history");
    }

    #[test]
    fn test_list_failure_is_an_error() {
        let runner = FakeRunner::new(&[]);
        runner.fail_next("env list", 1);
        let conda = Conda::new("/fake/bin/conda", &runner);
        assert!(conda.list_environments().is_err());
    }

    #[test]
    fn test_lists_package() {
        let listing = "# packages in environment at /x:\n#\n# Name  Version  Build  Channel\nanaconda-clean  1.1.1  py_0\n";
        assert!(lists_package(listing, "anaconda-clean"));
        assert!(!lists_package("# anaconda-clean\n", "anaconda-clean"));
    }
}
