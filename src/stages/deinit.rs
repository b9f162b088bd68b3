use super::StageContext;
use crate::conda::Conda;
use crate::envfile::RESERVED_ENV_NAME;
use crate::ui;
use anyhow::Result;
use std::path::Path;
use tracing::debug;

const DEEP_CLEAN_PACKAGE: &str = "anaconda-clean";

#[derive(Debug, Clone, Copy, Default)]
pub struct DeinitOptions {
    /// Run the deep-clean tool without asking.
    pub force: bool,
}

/// Remove shell integration, then offer the vendor's deep-clean tool.
///
/// A missing package manager only skips the stage; there is nothing to
/// de-initialize without one.
pub fn run(
    ctx: &StageContext<'_>,
    conda: Option<&Conda<'_>>,
    root: Option<&Path>,
    options: DeinitOptions,
) -> Result<()> {
    let (Some(conda), Some(root)) = (conda, root) else {
        ui::warn("No Anaconda package manager found; skipping shell de-initialization.");
        return Ok(());
    };

    note_active_environment();
    reverse_init(ctx, conda);
    deep_clean(ctx, conda, root, options)?;
    Ok(())
}

fn note_active_environment() {
    match std::env::var("CONDA_DEFAULT_ENV") {
        Ok(env) if !env.is_empty() => ui::warn(format!(
            "Environment '{env}' is active in this shell; run `conda deactivate` before opening a new shell."
        )),
        _ => debug!("no active conda environment"),
    }
}

fn reverse_init(ctx: &StageContext<'_>, conda: &Conda<'_>) {
    if ctx.dry_run() {
        ui::preview(format!("{} init --reverse --all", conda.exe().display()));
        return;
    }

    match conda.reverse_init_all_shells() {
        Ok(output) if output.success => {
            ui::success("Deinit", "removed shell integration from every shell")
        }
        Ok(output) => ui::warn(format!(
            "`conda init --reverse --all` failed ({}); remove the conda block from your shell profiles by hand. {}",
            output.describe_status(),
            output.stderr.trim()
        )),
        Err(err) => ui::warn(format!("Could not reverse shell integration: {err:#}")),
    }
}

fn deep_clean(
    ctx: &StageContext<'_>,
    conda: &Conda<'_>,
    root: &Path,
    options: DeinitOptions,
) -> Result<()> {
    let question = format!(
        "Run {DEEP_CLEAN_PACKAGE} to remove Anaconda configuration files and caches?"
    );
    if !options.force && !ctx.session.confirm(&question)? {
        ui::info(format!("Skipping {DEEP_CLEAN_PACKAGE}."));
        return Ok(());
    }

    let tool = root.join(ctx.platform.deep_clean_relpath());
    if ctx.dry_run() {
        ui::preview(format!(
            "install {DEEP_CLEAN_PACKAGE} into {RESERVED_ENV_NAME} if missing, then run {} --yes",
            tool.display()
        ));
        return Ok(());
    }

    let installed = match conda.has_package(RESERVED_ENV_NAME, DEEP_CLEAN_PACKAGE) {
        Ok(installed) => installed,
        Err(err) => {
            ui::warn(format!("Skipping {DEEP_CLEAN_PACKAGE}: {err:#}"));
            return Ok(());
        }
    };
    if !installed {
        let progress = ui::Progress::new("Installing", DEEP_CLEAN_PACKAGE);
        match conda.install_package(RESERVED_ENV_NAME, DEEP_CLEAN_PACKAGE) {
            Ok(output) if output.success => progress.success("Installed", None),
            Ok(output) => {
                progress.fail("Failed", output.describe_status());
                ui::warn(format!("Skipping {DEEP_CLEAN_PACKAGE}; it could not be installed."));
                return Ok(());
            }
            Err(err) => {
                progress.fail("Failed", "could not run conda");
                ui::warn(format!("Skipping {DEEP_CLEAN_PACKAGE}: {err:#}"));
                return Ok(());
            }
        }
    }

    let output = match ctx.runner.run(&tool, &crate::runner::args(["--yes"])) {
        Ok(output) => output,
        Err(err) => {
            ui::warn(format!("{DEEP_CLEAN_PACKAGE} could not run: {err:#}"));
            return Ok(());
        }
    };
    if output.success {
        ui::success("Cleaned", format!("{DEEP_CLEAN_PACKAGE} finished"));
    } else {
        ui::warn(format!(
            "{DEEP_CLEAN_PACKAGE} failed ({}): {}",
            output.describe_status(),
            output.stderr.trim()
        ));
    }
    Ok(())
}
