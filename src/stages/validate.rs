use crate::envfile::{self, ENV_FILE_EXTENSION};
use crate::ui;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const REMEDIATION: [&str; 3] = [
    "re-export it from the source installation,",
    "edit it so it has a top-level 'name:' and a non-empty 'dependencies:' list, or",
    "delete it if the environment is no longer needed",
];

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub passed: Vec<PathBuf>,
    /// Rejected files with the first problem found in each.
    pub failed: Vec<(PathBuf, String)>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn checked(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    pub fn print_summary(&self) {
        if self.checked() == 0 {
            return;
        }
        ui::status(
            "Checked",
            format!(
                "{} file(s): {} valid, {} invalid",
                self.checked(),
                self.passed.len(),
                self.failed.len()
            ),
        );
        if self.is_ok() {
            return;
        }
        for (path, problem) in &self.failed {
            ui::error(format!("{}: {problem}", display_name(path)));
        }
        ui::info("Invalid files are skipped on import. For each one:");
        for step in REMEDIATION {
            ui::info(format!("  - {step}"));
        }
    }
}

/// `*.yml` files directly inside `dir`, sorted by file name.
pub fn env_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read export directory {:?}", dir))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == ENV_FILE_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Check every environment file in `export_dir`.
pub fn run(export_dir: &Path) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();
    if !export_dir.is_dir() {
        ui::warn(format!(
            "Export directory {} does not exist; nothing to validate.",
            export_dir.display()
        ));
        return Ok(report);
    }

    let files = env_files(export_dir)?;
    if files.is_empty() {
        ui::warn(format!(
            "No .{ENV_FILE_EXTENSION} files in {}",
            export_dir.display()
        ));
        return Ok(report);
    }

    for path in files {
        match envfile::inspect(&path) {
            Ok(summary) => match summary.problem() {
                None => {
                    ui::success("Valid", display_name(&path));
                    report.passed.push(path);
                }
                Some(problem) => report.failed.push((path, problem.to_string())),
            },
            Err(err) => report.failed.push((path, format!("{err:#}"))),
        }
    }
    Ok(report)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
