use super::StageContext;
use crate::conda::Conda;
use crate::error::MigrateError;
use crate::probe;
use crate::runner::ToolOutput;
use crate::ui;
use anyhow::Result;
use std::path::Path;

/// Shell integration plus baseline configuration for a fresh installation.
pub fn run(ctx: &StageContext<'_>, prefix: &Path, channel: &str) -> Result<()> {
    let Some(exe) = probe::find_executable(prefix, ctx.platform.conda_relpaths()) else {
        if ctx.dry_run() {
            ui::preview(format!(
                "initialize shells with conda from {} once it is installed",
                prefix.display()
            ));
            return Ok(());
        }
        return Err(MigrateError::ToolMissing {
            tool: "conda",
            root: prefix.to_path_buf(),
        }
        .into());
    };
    let conda = Conda::new(exe, ctx.runner);

    let steps: [(&str, Vec<&str>); 4] = [
        ("shell integration", vec!["init", "--all"]),
        (
            "auto-activation of base",
            vec!["config", "--set", "auto_activate_base", "false"],
        ),
        ("preferred channel", vec!["config", "--add", "channels", channel]),
        (
            "strict channel priority",
            vec!["config", "--set", "channel_priority", "strict"],
        ),
    ];

    for (what, args) in &steps {
        if ctx.dry_run() {
            ui::preview(format!("{} {}", conda.exe().display(), args.join(" ")));
            continue;
        }
        report(what, conda.run(args.as_slice()));
    }

    if let Some(mamba) = probe::find_executable(prefix, ctx.platform.mamba_relpaths()) {
        let args = crate::runner::args(["shell", "init"]);
        if ctx.dry_run() {
            ui::preview(format!("{} shell init", mamba.display()));
        } else if let Ok(output) = ctx.runner.run(&mamba, &args) {
            if !output.success {
                tracing::debug!(status = %output.describe_status(), "mamba shell init failed");
            }
        }
    }
    Ok(())
}

fn report(what: &str, result: Result<ToolOutput>) {
    match result {
        Ok(output) if output.success => ui::success("Configured", what),
        Ok(output) => ui::warn(format!(
            "Could not configure {what} ({}): {}",
            output.describe_status(),
            output.stderr.trim()
        )),
        Err(err) => ui::warn(format!("Could not configure {what}: {err:#}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Os, Platform};
    use crate::prompt::Session;
    use crate::test_support::{touch_executable, FakeRunner, ScriptedPrompt};
    use tempfile::TempDir;

    #[cfg(unix)]
    #[test]
    fn test_runs_configuration_in_order() {
        let temp = TempDir::new().unwrap();
        touch_executable(&temp.path().join("bin/conda"));
        touch_executable(&temp.path().join("bin/mamba"));
        let runner = FakeRunner::new(&[]);
        let prompt = ScriptedPrompt::new();
        let session = Session::new(false, false, &prompt);
        let platform = Platform::new(Os::Linux, "x86_64");
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &platform,
        };

        run(&ctx, temp.path(), "conda-forge").unwrap();
        assert_eq!(
            runner.calls(),
            vec![
                "init --all",
                "config --set auto_activate_base false",
                "config --add channels conda-forge",
                "config --set channel_priority strict",
                "shell init",
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failures_are_warnings() {
        let temp = TempDir::new().unwrap();
        touch_executable(&temp.path().join("bin/conda"));
        let runner = FakeRunner::new(&[]);
        runner.fail_next("init", 1);
        let prompt = ScriptedPrompt::new();
        let session = Session::new(false, false, &prompt);
        let platform = Platform::new(Os::Linux, "x86_64");
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &platform,
        };

        run(&ctx, temp.path(), "bioconda").unwrap();
        assert_eq!(runner.calls().len(), 4);
        assert_eq!(runner.calls()[2], "config --add channels bioconda");
    }

    #[test]
    fn test_missing_conda() {
        let temp = TempDir::new().unwrap();
        let runner = FakeRunner::new(&[]);
        let prompt = ScriptedPrompt::new();
        let platform = Platform::new(Os::Linux, "x86_64");

        let session = Session::new(false, true, &prompt);
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &platform,
        };
        assert!(run(&ctx, temp.path(), "conda-forge").is_ok());

        let session = Session::new(false, false, &prompt);
        let ctx = StageContext {
            session: &session,
            runner: &runner,
            platform: &platform,
        };
        let err = run(&ctx, temp.path(), "conda-forge").unwrap_err();
        assert!(err.to_string().contains("conda not found"));
    }
}
