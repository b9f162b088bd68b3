//! The eight migration stages.
//!
//! Removal: export, validate, deinit, uninstall, clean.
//! Installation: install, init, import.
//! Each stage reports its own aggregate outcome; only configuration and
//! precondition problems propagate as errors.

pub mod clean;
pub mod deinit;
pub mod export;
pub mod import;
pub mod init;
pub mod install;
pub mod uninstall;
pub mod validate;

use crate::platform::Platform;
use crate::prompt::Session;
use crate::runner::CommandRunner;

/// Collaborators every stage needs.
pub struct StageContext<'a> {
    pub session: &'a Session<'a>,
    pub runner: &'a dyn CommandRunner,
    pub platform: &'a Platform,
}

impl StageContext<'_> {
    pub fn dry_run(&self) -> bool {
        self.session.dry_run
    }
}
