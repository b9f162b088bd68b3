use super::StageContext;
use crate::conda::{Conda, EnvironmentDescriptor};
use crate::envfile::{self, ENV_FILE_EXTENSION};
use crate::interrupt::InFlight;
use crate::ui;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const MARKER_FILE: &str = "export-in-progress";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub export_dir: PathBuf,
    /// Export every environment without showing the pick-list.
    pub all: bool,
    /// Only explicitly requested packages (`--from-history`).
    pub from_history: bool,
    /// Directory holding the persisted in-progress marker.
    pub state_dir: PathBuf,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<String>,
}

/// Records which file is being written so a later run can warn about it.
struct ExportMarker {
    path: PathBuf,
}

impl ExportMarker {
    fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join(MARKER_FILE),
        }
    }

    /// Warn about, then forget, a write that never completed.
    fn check_leftover(&self, dry_run: bool) {
        let Ok(target) = fs::read_to_string(&self.path) else {
            return;
        };
        let target = target.trim();
        if !target.is_empty() {
            ui::warn(format!(
                "A previous export to {target} did not finish; the file may be truncated or corrupt. \
                 Delete it and export again."
            ));
        }
        if !dry_run {
            let _ = fs::remove_file(&self.path);
        }
    }

    fn set(&self, target: &Path) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory {:?}", parent))?;
        }
        fs::write(&self.path, target.to_string_lossy().as_bytes())
            .with_context(|| format!("Failed to write export marker {:?}", self.path))
    }

    fn clear(&self) {
        let _ = fs::remove_file(&self.path);
    }
}

pub fn target_path(export_dir: &Path, env_name: &str) -> PathBuf {
    export_dir.join(format!("{env_name}.{ENV_FILE_EXTENSION}"))
}

pub fn run(ctx: &StageContext<'_>, conda: &Conda<'_>, options: &ExportOptions) -> Result<ExportReport> {
    let marker = ExportMarker::new(&options.state_dir);
    marker.check_leftover(ctx.dry_run());

    let environments = conda.list_environments()?;
    let mut report = ExportReport::default();
    if environments.is_empty() {
        ui::warn("No named environments found; nothing to export.");
        return Ok(report);
    }

    let selected: Vec<&EnvironmentDescriptor> = if options.all {
        environments.iter().collect()
    } else {
        ctx.session
            .choose("Environments to export:", &environments, |env| {
                format!("{:<24} {}", env.name, env.prefix.display())
            })?
    };
    if selected.is_empty() {
        ui::info("No environments selected for export.");
        return Ok(report);
    }

    if ctx.dry_run() {
        ui::preview(format!("create export directory {}", options.export_dir.display()));
    } else {
        fs::create_dir_all(&options.export_dir).with_context(|| {
            format!("Failed to create export directory {:?}", options.export_dir)
        })?;
    }

    for env in selected {
        let target = target_path(&options.export_dir, &env.name);
        if ctx.dry_run() {
            ui::preview(format!("export '{}' to {}", env.name, target.display()));
            continue;
        }

        match export_one(ctx, conda, &marker, &env.name, &target, options.from_history) {
            Ok(true) => report.written.push(target),
            Ok(false) => report.failed.push(env.name.clone()),
            Err(err) => {
                ui::warn(format!("Failed to export '{}': {err:#}", env.name));
                report.failed.push(env.name.clone());
            }
        }
    }

    if !ctx.dry_run() {
        ui::success(
            "Exported",
            format!(
                "{} environment(s) to {}; {} failed",
                report.written.len(),
                options.export_dir.display(),
                report.failed.len()
            ),
        );
        for name in &report.failed {
            ui::warn(format!("Not exported: {name}"));
        }
    }
    Ok(report)
}

/// Export a single environment. `Ok(false)` is a non-fatal miss.
fn export_one(
    ctx: &StageContext<'_>,
    conda: &Conda<'_>,
    marker: &ExportMarker,
    name: &str,
    target: &Path,
    from_history: bool,
) -> Result<bool> {
    let progress = ui::Progress::new("Exporting", name.to_string());
    let output = conda.export_environment(name, from_history)?;
    if !output.success || output.stdout.trim().is_empty() {
        let reason = if output.success {
            "no content returned".to_string()
        } else {
            output.describe_status()
        };
        progress.fail("Skipped", reason);
        return Ok(false);
    }

    let filtered = envfile::strip_prefix(&output.stdout);

    marker.set(target)?;
    let guard = ctx
        .session
        .interrupts()
        .begin(InFlight::Export(target.to_path_buf()));
    fs::write(target, filtered).with_context(|| format!("Failed to write {:?}", target))?;
    marker.clear();
    guard.finish();

    progress.success("Exported", Some(format!("to {}", target.display())));
    Ok(true)
}
