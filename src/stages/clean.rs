//! Backup-or-delete of leftover installation directories and config files.

use super::StageContext;
use crate::platform::Platform;
use crate::ui;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const BACKUP_SUFFIX: &str = ".old";
const BACKUP_TIMESTAMP: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupItem {
    pub label: String,
    pub path: PathBuf,
    pub description: String,
    pub is_file: bool,
}

impl CleanupItem {
    fn dir(label: &str, path: PathBuf, description: &str) -> Self {
        Self {
            label: label.to_string(),
            path,
            description: description.to_string(),
            is_file: false,
        }
    }

    fn file(label: &str, path: PathBuf, description: &str) -> Self {
        Self {
            is_file: true,
            ..Self::dir(label, path, description)
        }
    }
}

/// Backup renames in place; delete is permanent. One mode per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    Backup,
    Delete,
}

#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Processed paths, with the backup location in backup mode.
    pub done: Vec<(PathBuf, Option<PathBuf>)>,
    pub failed: Vec<(PathBuf, String)>,
}

/// Conventional leftovers of an Anaconda installation, existing or not.
pub fn catalog(platform: &Platform, home: &Path, active_root: Option<&Path>) -> Vec<CleanupItem> {
    let mut items = Vec::new();
    if let Some(root) = active_root {
        items.push(CleanupItem::dir(
            "Anaconda installation",
            root.to_path_buf(),
            "the installation root with every environment inside it",
        ));
    }
    items.push(CleanupItem::dir(
        "Conda user data",
        home.join(".conda"),
        "environment registry and package caches",
    ));
    items.push(CleanupItem::dir(
        "Continuum data",
        home.join(".continuum"),
        "legacy Anaconda Navigator state",
    ));
    items.push(CleanupItem::dir(
        "Anaconda data",
        home.join(".anaconda"),
        "Anaconda client and Navigator settings",
    ));
    items.push(CleanupItem::file(
        "Conda config",
        home.join(".condarc"),
        "user-level conda configuration",
    ));
    if platform.os.is_windows() {
        items.push(CleanupItem::dir(
            "Local conda data",
            home.join("AppData").join("Local").join("conda"),
            "per-user conda cache",
        ));
    }
    items
}

/// Only items that are present on disk are offered.
pub fn existing(items: Vec<CleanupItem>) -> Vec<CleanupItem> {
    items
        .into_iter()
        .filter(|item| fs::symlink_metadata(&item.path).is_ok())
        .collect()
}

pub fn run(
    ctx: &StageContext<'_>,
    items: Vec<CleanupItem>,
    mode: CleanupMode,
    uninstaller_succeeded: bool,
) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();
    if uninstaller_succeeded {
        ui::info("The vendor uninstaller completed; skipping directory cleanup.");
        return Ok(report);
    }

    let items = existing(items);
    if items.is_empty() {
        ui::info("Nothing left to clean up.");
        return Ok(report);
    }

    let selected = ctx.session.choose("Leftovers to clean up:", &items, |item| {
        format!(
            "{:<24} {} ({}) - {}",
            item.label,
            item.path.display(),
            format_size(disk_usage(&item.path)),
            item.description
        )
    })?;
    if selected.is_empty() {
        ui::info("No items selected; nothing cleaned up.");
        return Ok(report);
    }

    let verb = match mode {
        CleanupMode::Backup => "Back up (rename)",
        CleanupMode::Delete => "PERMANENTLY delete",
    };
    for item in &selected {
        ui::warn(format!("{verb}: {}", item.path.display()));
    }
    if !ctx
        .session
        .confirm(&format!("{verb} the {} path(s) listed above?", selected.len()))?
    {
        ui::info("Cleanup cancelled.");
        return Ok(report);
    }

    for item in selected {
        if ctx.dry_run() {
            ui::preview(match mode {
                CleanupMode::Backup => format!(
                    "rename {} to {}",
                    item.path.display(),
                    backup_path(&item.path, Local::now()).display()
                ),
                CleanupMode::Delete => format!("delete {}", item.path.display()),
            });
            continue;
        }

        let result = match mode {
            CleanupMode::Backup => backup(&item.path).map(Some),
            CleanupMode::Delete => remove(item).map(|()| None),
        };
        match result {
            Ok(backup) => {
                match &backup {
                    Some(to) => ui::success(
                        "Backed up",
                        format!("{} -> {}", item.path.display(), to.display()),
                    ),
                    None => ui::success("Removed", item.path.display()),
                }
                report.done.push((item.path.clone(), backup));
            }
            Err(err) => {
                ui::warn(format!("{err:#}"));
                report.failed.push((item.path.clone(), format!("{err:#}")));
            }
        }
    }

    if !ctx.dry_run() {
        ui::status(
            "Cleaned",
            format!("{} item(s); {} failed", report.done.len(), report.failed.len()),
        );
    }
    Ok(report)
}

/// First free name among `<path>.old`, `<path>.old.<ts>`, `<path>.old.<ts>.<N>`.
pub fn backup_path(path: &Path, now: DateTime<Local>) -> PathBuf {
    let with_suffix = |suffix: &str| {
        let mut name = OsString::from(path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    };
    let taken = |candidate: &Path| fs::symlink_metadata(candidate).is_ok();

    let plain = with_suffix(BACKUP_SUFFIX);
    if !taken(&plain) {
        return plain;
    }

    let stamp = format!("{BACKUP_SUFFIX}.{}", now.format(BACKUP_TIMESTAMP));
    let stamped = with_suffix(&stamp);
    if !taken(&stamped) {
        return stamped;
    }

    (1..)
        .map(|n| with_suffix(&format!("{stamp}.{n}")))
        .find(|candidate| !taken(candidate))
        .unwrap_or(stamped)
}

/// Rename `path` to a fresh backup name and return that name.
pub fn backup(path: &Path) -> Result<PathBuf> {
    let target = backup_path(path, Local::now());
    fs::rename(path, &target)
        .with_context(|| format!("Failed to back up {:?} to {:?}", path, target))?;
    Ok(target)
}

pub fn remove(item: &CleanupItem) -> Result<()> {
    let metadata = fs::symlink_metadata(&item.path)
        .with_context(|| format!("Failed to inspect {:?}", item.path))?;
    let result = if metadata.is_dir() {
        fs::remove_dir_all(&item.path)
    } else {
        fs::remove_file(&item.path)
    };
    result.with_context(|| format!("Failed to remove {:?}", item.path))
}

/// Total size of regular files under `path`. Unreadable entries count as zero.
pub fn disk_usage(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}
