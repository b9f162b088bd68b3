pub mod xdg;

use std::path::PathBuf;

/// Expand a leading `~` in user-supplied paths.
pub fn expand_path(raw: &str) -> Result<PathBuf, String> {
    if raw.trim().is_empty() {
        return Err("path must not be empty".to_string());
    }
    Ok(PathBuf::from(shellexpand::tilde(raw).as_ref()))
}
