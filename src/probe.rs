//! Locating installation roots and the executables inside them.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of root resolution.
///
/// `active` is the root used for display and for the package manager.
/// `search` is where the uninstaller may be looked for: every existing
/// conventional root, or exactly the pinned root when the user gave one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootResolution {
    pub active: Option<PathBuf>,
    pub search: Vec<PathBuf>,
    pub pinned: bool,
}

impl RootResolution {
    /// An explicit root collapses the candidate list to that single path.
    pub fn resolve(explicit: Option<&Path>, candidates: &[PathBuf]) -> Self {
        if let Some(root) = explicit {
            debug!(root = %root.display(), "using pinned root");
            return Self {
                active: root.exists().then(|| root.to_path_buf()),
                search: vec![root.to_path_buf()],
                pinned: true,
            };
        }

        let existing: Vec<PathBuf> = candidates
            .iter()
            .filter(|candidate| candidate.exists())
            .cloned()
            .collect();
        debug!(?existing, "probed conventional roots");

        Self {
            active: existing.first().cloned(),
            search: existing,
            pinned: false,
        }
    }

    /// The root to report, even when it does not exist yet.
    pub fn display_root(&self) -> Option<&Path> {
        self.active
            .as_deref()
            .or_else(|| self.search.first().map(PathBuf::as_path))
    }
}

/// First existing executable among `root/<relpath>`. Never fails.
pub fn find_executable(root: &Path, relpaths: &[&str]) -> Option<PathBuf> {
    relpaths
        .iter()
        .map(|relpath| root.join(relpath))
        .find(|path| is_executable(path))
}

/// First hit for `relpaths` across `roots`, in root order.
pub fn find_in_roots(roots: &[PathBuf], relpaths: &[&str]) -> Option<PathBuf> {
    roots
        .iter()
        .find_map(|root| find_executable(root, relpaths))
}

#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}
