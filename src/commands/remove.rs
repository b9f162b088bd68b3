use super::RunMode;
use crate::cli::RemoveArgs;
use crate::conda::Conda;
use crate::config::Settings;
use crate::error::MigrateError;
use crate::interrupt::InterruptWatch;
use crate::plan::{self, RemovalPlan};
use crate::platform::Platform;
use crate::probe::{self, RootResolution};
use crate::prompt::{Session, TerminalPrompt};
use crate::runner::SystemRunner;
use crate::stages::clean::{self, CleanupMode};
use crate::stages::deinit::{self, DeinitOptions};
use crate::stages::export::{self, ExportOptions};
use crate::stages::uninstall;
use crate::stages::{validate, StageContext};
use crate::ui;
use anyhow::Result;
use std::path::PathBuf;

pub fn execute(settings: &Settings, args: &RemoveArgs, mode: RunMode) -> Result<()> {
    // Conflicting flags stop the run before anything is touched.
    let plan = RemovalPlan::resolve(&args.flags())?;
    let platform = Platform::current()?;

    let prompt = TerminalPrompt;
    let session =
        Session::new(mode.assume_yes, mode.dry_run, &prompt).with_interrupts(InterruptWatch::install()?);
    let runner = SystemRunner;
    let ctx = StageContext {
        session: &session,
        runner: &runner,
        platform: &platform,
    };

    ui::status("Plan", plan::describe(&plan.stages()));
    if mode.dry_run {
        ui::preview("no changes will be made");
    }

    let roots = RootResolution::resolve(
        args.anaconda_path.as_deref(),
        &platform.anaconda_root_candidates(&settings.home),
    );
    match roots.display_root() {
        Some(root) if roots.active.is_some() => ui::info(format!("Anaconda root: {}", root.display())),
        Some(root) => ui::warn(format!("Anaconda root {} does not exist", root.display())),
        None => ui::warn("No Anaconda installation found in the usual locations"),
    }
    let conda = roots
        .active
        .as_deref()
        .and_then(|root| probe::find_executable(root, platform.conda_relpaths()))
        .map(|exe| Conda::new(exe, &runner));
    let missing_conda = || MigrateError::ToolMissing {
        tool: "conda",
        root: roots
            .display_root()
            .map(PathBuf::from)
            .unwrap_or_else(|| settings.home.clone()),
    };

    if plan.export {
        ui::stage("Export");
        match &conda {
            Some(conda) => {
                export::run(
                    &ctx,
                    conda,
                    &ExportOptions {
                        export_dir: settings.export_dir.clone(),
                        all: args.export_all,
                        from_history: args.from_history,
                        state_dir: settings.state_dir.clone(),
                    },
                )?;
            }
            None if mode.dry_run => ui::preview(format!(
                "export environments to {} ({})",
                settings.export_dir.display(),
                missing_conda()
            )),
            None => return Err(missing_conda().into()),
        }
    }

    if plan.validate {
        ui::stage("Validate");
        let report = validate::run(&settings.export_dir)?;
        report.print_summary();
        if !report.is_ok() {
            let failed = report.failed.len();
            if args.strict {
                return Err(MigrateError::ValidationFailed { failed }.into());
            }
            if plan.has_destructive_stage()
                && !session.confirm(&format!(
                    "{failed} exported file(s) are invalid. Continue removing Anaconda anyway?"
                ))?
            {
                return Err(MigrateError::Aborted(
                    "stopped before removal; fix or re-export the invalid files and re-run".to_string(),
                )
                .into());
            }
        }
    }

    if plan.deinit {
        ui::stage("Deinit");
        deinit::run(
            &ctx,
            conda.as_ref(),
            roots.active.as_deref(),
            DeinitOptions { force: args.force },
        )?;
    }

    let mut uninstalled = false;
    if plan.uninstall {
        ui::stage("Uninstall");
        let outcome = uninstall::run(&ctx, &roots, platform.is_elevated())?;
        uninstalled = outcome.succeeded();
    }

    if plan.clean {
        ui::stage("Clean");
        let cleanup_mode = if args.backup {
            CleanupMode::Backup
        } else {
            CleanupMode::Delete
        };
        let items = clean::catalog(&platform, &settings.home, roots.active.as_deref());
        clean::run(&ctx, items, cleanup_mode, uninstalled)?;
    }

    if mode.dry_run {
        ui::success("Done", "dry run complete; nothing was changed");
    } else {
        ui::success("Done", "removal finished; open a new shell to pick up the changes");
    }
    Ok(())
}
