use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions that stop a run before (or instead of) any mutation.
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("conflicting flags: {0}")]
    FlagConflict(String),

    #[error("unsupported platform for the Miniforge installer: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("{tool} not found under {}", .root.display())]
    ToolMissing { tool: &'static str, root: PathBuf },

    #[error(
        "refusing to uninstall with administrative privileges; re-run as the user who owns the installation"
    )]
    Elevated,

    #[error("{failed} environment file(s) failed validation")]
    ValidationFailed { failed: usize },

    #[error("{0}")]
    Aborted(String),
}
