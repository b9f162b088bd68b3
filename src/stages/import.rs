use super::validate;
use super::StageContext;
use crate::conda::Conda;
use crate::envfile::{self, RESERVED_ENV_NAME};
use crate::error::MigrateError;
use crate::probe;
use crate::runner::ToolOutput;
use crate::ui;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub export_dir: PathBuf,
    /// Per-environment `import-<name>.log` files land here.
    pub log_dir: PathBuf,
    /// Leave the reserved default environment alone.
    pub skip_base: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    Created,
    Updated,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub succeeded: Vec<(String, ImportAction)>,
    /// Environment (or file) name with the reason it failed.
    pub failed: Vec<(String, String)>,
    /// Files that never reached the package manager.
    pub skipped: Vec<(PathBuf, String)>,
    /// Actions a dry run would have taken.
    pub previewed: Vec<(String, ImportAction)>,
}

/// Re-create or update environments from exported files.
///
/// Existing names are queried before every file, so re-running after a
/// partial failure only creates what is still missing.
pub fn run(ctx: &StageContext<'_>, prefix: &Path, options: &ImportOptions) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    let tool = probe::find_executable(prefix, ctx.platform.conda_relpaths())
        .or_else(|| probe::find_executable(prefix, ctx.platform.mamba_relpaths()));
    let conda = match tool {
        Some(tool) => Some(Conda::new(tool, ctx.runner)),
        None if ctx.dry_run() => {
            ui::preview(format!(
                "import environments with the package manager at {} once it is installed",
                prefix.display()
            ));
            None
        }
        None => {
            return Err(MigrateError::ToolMissing {
                tool: "conda or mamba",
                root: prefix.to_path_buf(),
            }
            .into())
        }
    };

    if !options.export_dir.is_dir() {
        ui::warn(format!(
            "Export directory {} does not exist; nothing to import.",
            options.export_dir.display()
        ));
        return Ok(report);
    }
    let files = validate::env_files(&options.export_dir)?;
    if files.is_empty() {
        ui::warn(format!(
            "No environment files in {}; nothing to import.",
            options.export_dir.display()
        ));
        return Ok(report);
    }

    for file in files {
        if let Some(reason) = rejection(&file) {
            ui::warn(format!("Skipping {}: {reason}", file.display()));
            report.skipped.push((file, reason));
            continue;
        }

        let name = envfile::extract_name(&file);
        if name.is_empty() {
            report
                .failed
                .push((file.display().to_string(), "could not read environment name".to_string()));
            continue;
        }
        if options.skip_base && name == RESERVED_ENV_NAME {
            ui::info(format!("Skipping {RESERVED_ENV_NAME} (--skip-base)"));
            report.skipped.push((file, format!("{RESERVED_ENV_NAME} skipped")));
            continue;
        }

        // Without a package manager yet, every environment would be created.
        let existing = match &conda {
            Some(conda) => match conda.environment_names() {
                Ok(names) => names,
                Err(err) => {
                    ui::warn(format!("{err:#}"));
                    report.failed.push((name, format!("{err:#}")));
                    continue;
                }
            },
            None => Vec::new(),
        };
        let action = if existing.iter().any(|env| *env == name) {
            ImportAction::Updated
        } else {
            ImportAction::Created
        };

        if ctx.dry_run() {
            ui::preview(match action {
                ImportAction::Updated => format!("update '{name}' from {}", file.display()),
                ImportAction::Created => format!("create '{name}' from {}", file.display()),
            });
            report.previewed.push((name, action));
            continue;
        }
        let Some(conda) = &conda else {
            continue;
        };

        let progress = ui::Progress::new(
            match action {
                ImportAction::Updated => "Updating",
                ImportAction::Created => "Creating",
            },
            name.clone(),
        );
        let result = match action {
            ImportAction::Updated => conda.update_environment(&name, &file),
            ImportAction::Created => conda.create_environment(&file),
        };
        match result {
            Ok(output) => {
                write_log(&options.log_dir, &name, &output);
                if output.success {
                    progress.success("Imported", None);
                    report.succeeded.push((name, action));
                } else {
                    progress.fail("Failed", output.describe_status());
                    report.failed.push((name, output.describe_status()));
                }
            }
            Err(err) => {
                progress.fail("Failed", format!("{err:#}"));
                report.failed.push((name, format!("{err:#}")));
            }
        }
    }

    if let (false, Some(conda)) = (ctx.dry_run(), &conda) {
        print_summary(&report, &options.log_dir, conda.exe(), &options.export_dir);
    }
    Ok(report)
}

fn rejection(file: &Path) -> Option<String> {
    match envfile::inspect(file) {
        Ok(summary) => summary.problem().map(str::to_string),
        Err(err) => Some(format!("{err:#}")),
    }
}

pub fn log_path(log_dir: &Path, name: &str) -> PathBuf {
    log_dir.join(format!("import-{name}.log"))
}

fn write_log(log_dir: &Path, name: &str, output: &ToolOutput) {
    let path = log_path(log_dir, name);
    let result = fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))
        .and_then(|()| {
            fs::write(&path, output.combined())
                .with_context(|| format!("Failed to write import log {:?}", path))
        });
    if let Err(err) = result {
        ui::warn(format!("{err:#}"));
    }
}

fn print_summary(report: &ImportReport, log_dir: &Path, tool: &Path, export_dir: &Path) {
    let names = |items: &[(String, ImportAction)]| {
        items
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    ui::status(
        "Imported",
        format!(
            "{} environment(s) succeeded{}",
            report.succeeded.len(),
            if report.succeeded.is_empty() {
                String::new()
            } else {
                format!(": {}", names(&report.succeeded))
            }
        ),
    );
    if !report.skipped.is_empty() {
        ui::warn(format!("{} file(s) skipped", report.skipped.len()));
    }
    if report.failed.is_empty() {
        return;
    }

    ui::error(format!("{} environment(s) failed:", report.failed.len()));
    for (name, reason) in &report.failed {
        ui::error(format!("  {name}: {reason}"));
    }
    ui::info(format!("Logs for each environment are in {}", log_dir.display()));
    ui::info("Retry one by hand with:");
    ui::info(format!(
        "  {} env create -f {}",
        tool.display(),
        export_dir.join("<name>.yml").display()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Os, Platform};
    use crate::prompt::Session;
    use crate::test_support::{touch_executable, FakeRunner, ScriptedPrompt};
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        platform: Platform,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            touch_executable(&temp.path().join("miniforge3/bin/conda"));
            fs::create_dir_all(temp.path().join("exports")).unwrap();
            Self {
                temp,
                platform: Platform::new(Os::Linux, "x86_64"),
            }
        }

        fn prefix(&self) -> PathBuf {
            self.temp.path().join("miniforge3")
        }

        fn write_env(&self, file: &str, name: &str) {
            fs::write(
                self.temp.path().join("exports").join(file),
                format!("name: {name}\nchannels:\n  - conda-forge\ndependencies:\n  - python=3.11\n  - numpy\n"),
            )
            .unwrap();
        }

        fn options(&self, skip_base: bool) -> ImportOptions {
            ImportOptions {
                export_dir: self.temp.path().join("exports"),
                log_dir: self.temp.path().join("logs"),
                skip_base,
            }
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_create_then_update_round_trip() {
        let fixture = Fixture::new();
        fixture.write_env("devA.yml", "devA");
        let runner = FakeRunner::new(&["base"]);
        let prompt = ScriptedPrompt::new();
        let session = Session::new(false, false, &prompt);
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &fixture.platform,
        };

        let first = run(&ctx, &fixture.prefix(), &fixture.options(false)).unwrap();
        assert_eq!(first.succeeded, vec![("devA".to_string(), ImportAction::Created)]);

        let second = run(&ctx, &fixture.prefix(), &fixture.options(false)).unwrap();
        assert_eq!(second.succeeded, vec![("devA".to_string(), ImportAction::Updated)]);

        assert_eq!(runner.calls_starting_with("env create").len(), 1);
        assert_eq!(runner.calls_starting_with("env update -n devA").len(), 1);
        assert!(log_path(&fixture.temp.path().join("logs"), "devA").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_lexicographic_order_and_skip_base() {
        let fixture = Fixture::new();
        fixture.write_env("zeta.yml", "zeta");
        fixture.write_env("base.yml", "base");
        fixture.write_env("alpha.yml", "alpha");
        let runner = FakeRunner::new(&["base"]);
        let prompt = ScriptedPrompt::new();
        let session = Session::new(false, false, &prompt);
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &fixture.platform,
        };

        let report = run(&ctx, &fixture.prefix(), &fixture.options(true)).unwrap();
        let names: Vec<&str> = report
            .succeeded
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(report.skipped.len(), 1);
        assert!(runner.calls_starting_with("env update").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_base_is_updated_without_pruning() {
        let fixture = Fixture::new();
        fixture.write_env("base.yml", "base");
        let runner = FakeRunner::new(&["base"]);
        let prompt = ScriptedPrompt::new();
        let session = Session::new(false, false, &prompt);
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &fixture.platform,
        };

        let report = run(&ctx, &fixture.prefix(), &fixture.options(false)).unwrap();
        assert_eq!(report.succeeded, vec![("base".to_string(), ImportAction::Updated)]);
        let updates = runner.calls_starting_with("env update");
        assert_eq!(
            updates,
            vec![format!(
                "env update -n base -f {}",
                fixture.temp.path().join("exports/base.yml").display()
            )]
        );
        assert!(!updates[0].contains("--prune"));
    }

    #[cfg(unix)]
    #[test]
    fn test_invalid_files_never_reach_the_tool() {
        let fixture = Fixture::new();
        fixture.write_env("good.yml", "good");
        fs::write(
            fixture.temp.path().join("exports/bad.yml"),
            "name: bad\nchannels:\n  - defaults\n",
        )
        .unwrap();
        let runner = FakeRunner::new(&[]);
        let prompt = ScriptedPrompt::new();
        let session = Session::new(false, false, &prompt);
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &fixture.platform,
        };

        let report = run(&ctx, &fixture.prefix(), &fixture.options(false)).unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.succeeded.len(), 1);
        assert!(runner.calls().iter().all(|call| !call.contains("bad.yml")));
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_is_recorded_and_logged() {
        let fixture = Fixture::new();
        fixture.write_env("a.yml", "a");
        fixture.write_env("b.yml", "b");
        let runner = FakeRunner::new(&[]);
        runner.fail_next("env create", 1);
        let prompt = ScriptedPrompt::new();
        let session = Session::new(false, false, &prompt);
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &fixture.platform,
        };

        let report = run(&ctx, &fixture.prefix(), &fixture.options(false)).unwrap();
        assert_eq!(report.failed, vec![("a".to_string(), "exit code 1".to_string())]);
        assert_eq!(report.succeeded, vec![("b".to_string(), ImportAction::Created)]);
        let log = fs::read_to_string(log_path(&fixture.temp.path().join("logs"), "a")).unwrap();
        assert!(log.contains("simulated failure"));

        // A re-run creates only what is still missing.
        let rerun = run(&ctx, &fixture.prefix(), &fixture.options(false)).unwrap();
        assert_eq!(
            rerun.succeeded,
            vec![
                ("a".to_string(), ImportAction::Created),
                ("b".to_string(), ImportAction::Updated),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_export_dir_is_not_fatal() {
        let fixture = Fixture::new();
        let runner = FakeRunner::new(&[]);
        let prompt = ScriptedPrompt::new();
        let session = Session::new(false, false, &prompt);
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &fixture.platform,
        };

        let report = run(&ctx, &fixture.prefix(), &fixture.options(false)).unwrap();
        assert!(report.succeeded.is_empty() && report.failed.is_empty());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_dry_run_without_tool_still_names_each_file() {
        let temp = TempDir::new().unwrap();
        let exports = temp.path().join("exports");
        fs::create_dir_all(&exports).unwrap();
        fs::write(
            exports.join("devA.yml"),
            "name: devA\ndependencies:\n  - python=3.11\n",
        )
        .unwrap();
        fs::write(exports.join("bad.yml"), "name: bad\nchannels:\n  - defaults\n").unwrap();
        let runner = FakeRunner::new(&[]);
        let prompt = ScriptedPrompt::new();
        let session = Session::new(false, true, &prompt);
        let platform = Platform::new(Os::Linux, "x86_64");
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &platform,
        };
        let options = ImportOptions {
            export_dir: exports.clone(),
            log_dir: temp.path().join("logs"),
            skip_base: false,
        };

        let report = run(&ctx, &temp.path().join("miniforge3"), &options).unwrap();
        assert_eq!(report.previewed, vec![("devA".to_string(), ImportAction::Created)]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, exports.join("bad.yml"));
        assert!(report.failed.is_empty());
        assert!(runner.calls().is_empty());
        assert!(!temp.path().join("logs").exists());
    }

    #[test]
    fn test_missing_tool_is_fatal_unless_dry_run() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::new(&[]);
        let prompt = ScriptedPrompt::new();
        let platform = Platform::new(Os::Linux, "x86_64");
        let options = ImportOptions {
            export_dir: temp.path().join("exports"),
            log_dir: temp.path().join("logs"),
            skip_base: false,
        };

        let session = Session::new(false, true, &prompt);
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &platform,
        };
        assert!(run(&ctx, temp.path(), &options).is_ok());

        let session = Session::new(false, false, &prompt);
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &platform,
        };
        assert!(run(&ctx, temp.path(), &options).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_dry_run_previews_only() {
        let fixture = Fixture::new();
        fixture.write_env("devA.yml", "devA");
        let runner = FakeRunner::new(&[]);
        let prompt = ScriptedPrompt::new();
        let session = Session::new(false, true, &prompt);
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &fixture.platform,
        };

        let report = run(&ctx, &fixture.prefix(), &fixture.options(false)).unwrap();
        assert!(report.succeeded.is_empty());
        assert!(runner.calls_starting_with("env create").is_empty());
        assert!(!fixture.temp.path().join("logs").exists());
    }
}
