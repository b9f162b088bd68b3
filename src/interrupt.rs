//! Scoped bookkeeping for operations that must not be cut short silently.
//!
//! One `ctrlc` handler is installed per process. Operations register what is
//! in flight through [`InterruptWatch::begin`]; the returned guard clears the
//! slot when the operation ends. An operation that ends without calling
//! [`InFlightGuard::finish`] (early return, panic) gets the same treatment as
//! an interrupt.

use crate::ui;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

/// Exit status used after an interrupt, as shells report SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InFlight {
    /// An environment file is being written.
    Export(PathBuf),
    /// An installer is being downloaded to a temporary file.
    Download(PathBuf),
}

impl InFlight {
    /// Best-effort reaction to an unfinished operation.
    fn abandon(&self) {
        match self {
            InFlight::Export(target) => ui::warn(format!(
                "Export to {} was interrupted; the file may be truncated or corrupt. \
                 Delete it before retrying.",
                target.display()
            )),
            InFlight::Download(path) => {
                if path.exists() && fs::remove_file(path).is_err() {
                    ui::warn(format!(
                        "Could not remove temporary installer {}",
                        path.display()
                    ));
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InterruptWatch {
    slot: Arc<Mutex<Option<InFlight>>>,
    abandoned: Arc<Mutex<Option<InFlight>>>,
}

impl InterruptWatch {
    /// Create a watch and wire it to the process interrupt handler.
    pub fn install() -> Result<Self> {
        let watch = Self::default();
        let handler = watch.clone();
        ctrlc::set_handler(move || {
            if let Some(operation) = handler.lock().take() {
                operation.abandon();
            }
            ui::error("Interrupted.");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        })
        .context("Failed to install interrupt handler")?;
        Ok(watch)
    }

    pub fn begin(&self, operation: InFlight) -> InFlightGuard<'_> {
        *self.lock() = Some(operation);
        InFlightGuard {
            watch: self,
            finished: false,
        }
    }

    pub fn current(&self) -> Option<InFlight> {
        self.lock().clone()
    }

    /// The most recent operation that ended without finishing.
    pub fn last_abandoned(&self) -> Option<InFlight> {
        self.abandoned
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[must_use = "dropping the guard immediately ends the in-flight scope"]
pub struct InFlightGuard<'a> {
    watch: &'a InterruptWatch,
    finished: bool,
}

impl InFlightGuard<'_> {
    /// The operation completed; nothing to report.
    pub fn finish(mut self) {
        self.finished = true;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let operation = self.watch.lock().take();
        if !self.finished {
            if let Some(operation) = operation {
                operation.abandon();
                *self
                    .watch
                    .abandoned
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(operation);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slot_is_scoped_to_guard() {
        let watch = InterruptWatch::default();
        let target = PathBuf::from("/tmp/exports/devA.yml");
        {
            let guard = watch.begin(InFlight::Export(target.clone()));
            assert_eq!(watch.current(), Some(InFlight::Export(target)));
            guard.finish();
        }
        assert_eq!(watch.current(), None);
    }

    #[test]
    fn test_unfinished_download_removes_file() {
        let temp = TempDir::new().unwrap();
        let partial = temp.path().join("Miniforge3.sh");
        fs::write(&partial, "partial").unwrap();

        let watch = InterruptWatch::default();
        {
            let _guard = watch.begin(InFlight::Download(partial.clone()));
        }
        assert!(!partial.exists());
        assert_eq!(watch.current(), None);
        assert_eq!(watch.last_abandoned(), Some(InFlight::Download(partial)));
    }

    #[test]
    fn test_finished_download_keeps_file() {
        let temp = TempDir::new().unwrap();
        let complete = temp.path().join("Miniforge3.sh");
        fs::write(&complete, "complete").unwrap();

        let watch = InterruptWatch::default();
        watch.begin(InFlight::Download(complete.clone())).finish();
        assert!(complete.exists());
        assert_eq!(watch.last_abandoned(), None);
    }
}
