//! Fakes shared by unit tests.

use crate::envfile;
use crate::prompt::Prompt;
use crate::runner::{CommandRunner, ToolOutput};
use anyhow::{bail, Result};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub fn touch_executable(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }
}

/// In-memory stand-in for a conda installation.
///
/// Environments created through `env create` become visible to later
/// `env list` calls, so create-then-update sequences behave like the real tool.
#[derive(Default)]
pub struct FakeRunner {
    envs: RefCell<Vec<String>>,
    exports: RefCell<BTreeMap<String, String>>,
    packages: RefCell<Vec<String>>,
    failures: RefCell<Vec<(String, i32)>>,
    missing: RefCell<Vec<PathBuf>>,
    calls: RefCell<Vec<String>>,
    programs: RefCell<Vec<PathBuf>>,
}

impl FakeRunner {
    pub fn new(envs: &[&str]) -> Self {
        Self {
            envs: RefCell::new(envs.iter().map(|env| env.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Override the raw export text for one environment.
    pub fn set_export(&self, name: &str, text: &str) {
        self.exports
            .borrow_mut()
            .insert(name.to_string(), text.to_string());
    }

    pub fn add_package(&self, package: &str) {
        self.packages.borrow_mut().push(package.to_string());
    }

    /// Make the next call whose arguments start with `prefix` fail.
    pub fn fail_next(&self, prefix: &str, code: i32) {
        self.failures.borrow_mut().push((prefix.to_string(), code));
    }

    /// Make every call to `program` fail as if it could not be spawned.
    pub fn missing_program(&self, program: impl Into<PathBuf>) {
        self.missing.borrow_mut().push(program.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn programs(&self) -> Vec<PathBuf> {
        self.programs.borrow().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn env_names(&self) -> Vec<String> {
        self.envs.borrow().clone()
    }

    fn respond(&self, args: &[String]) -> ToolOutput {
        let joined = args.join(" ");
        let failure = {
            let mut failures = self.failures.borrow_mut();
            failures
                .iter()
                .position(|(prefix, _)| joined.starts_with(prefix.as_str()))
                .map(|idx| failures.remove(idx))
        };
        if let Some((_, code)) = failure {
            return ToolOutput::failed(code, format!("simulated failure: {joined}"));
        }

        let words: Vec<&str> = args.iter().map(String::as_str).collect();
        match words.as_slice() {
            ["env", "list", ..] => {
                let mut listing = String::from("# conda environments:\n#\n");
                for name in self.envs.borrow().iter() {
                    listing.push_str(&format!("{name:<24} /fake/envs/{name}\n"));
                }
                ToolOutput::ok(listing)
            }
            ["env", "export", "-n", name, ..] => {
                let text = self.exports.borrow().get(*name).cloned().unwrap_or_else(|| {
                    format!(
                        "name: {name}\nchannels:\n  - defaults\ndependencies:\n  - python=3.11\n  - pip\nprefix: /fake/envs/{name}\n"
                    )
                });
                ToolOutput::ok(text)
            }
            ["env", "create", "-f", file] => {
                let name = envfile::extract_name(Path::new(file));
                self.envs.borrow_mut().push(name);
                ToolOutput::ok("created\n")
            }
            ["list", "-n", _, package] => {
                if self.packages.borrow().iter().any(|p| p.as_str() == *package) {
                    ToolOutput::ok(format!("{package}  1.1.1  py_0\n"))
                } else {
                    ToolOutput::ok("# no packages\n")
                }
            }
            ["install", "-n", _, "-y", package] => {
                self.add_package(package);
                ToolOutput::ok("installed\n")
            }
            _ => ToolOutput::ok(""),
        }
    }

    fn spawn_check(&self, program: &Path) -> Result<()> {
        if self.missing.borrow().iter().any(|missing| missing == program) {
            bail!(
                "Failed to execute {:?}: No such file or directory (os error 2)",
                program
            );
        }
        Ok(())
    }

    fn record(&self, program: &Path, args: &[OsString]) -> Vec<String> {
        let args: Vec<String> = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        self.calls.borrow_mut().push(args.join(" "));
        self.programs.borrow_mut().push(program.to_path_buf());
        args
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> Result<ToolOutput> {
        let args = self.record(program, args);
        self.spawn_check(program)?;
        Ok(self.respond(&args))
    }

    fn run_interactive(&self, program: &Path, args: &[OsString]) -> Result<ToolOutput> {
        let args = self.record(program, args);
        self.spawn_check(program)?;
        Ok(self.respond(&args))
    }
}

/// Prompt that replays canned answers and records every question.
#[derive(Default)]
pub struct ScriptedPrompt {
    confirms: RefCell<VecDeque<bool>>,
    inputs: RefCell<VecDeque<String>>,
    questions: RefCell<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirm_with(self, answer: bool) -> Self {
        self.confirms.borrow_mut().push_back(answer);
        self
    }

    pub fn input_with(self, answer: &str) -> Self {
        self.inputs.borrow_mut().push_back(answer.to_string());
        self
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.borrow().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn confirm(&self, question: &str, _default: bool) -> Result<bool> {
        self.questions.borrow_mut().push(question.to_string());
        match self.confirms.borrow_mut().pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("unexpected confirmation: {question}"),
        }
    }

    fn input(&self, question: &str) -> Result<String> {
        self.questions.borrow_mut().push(question.to_string());
        match self.inputs.borrow_mut().pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("unexpected input prompt: {question}"),
        }
    }
}
