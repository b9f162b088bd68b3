//! Lightweight structural checks for exported environment files.
//!
//! This is a pre-flight guard, not a YAML parser. The package manager that
//! consumes the file stays the authority on deep correctness. Known limits of
//! the line scanner:
//! - only keys starting in column 0 count as top level;
//! - flow-style sequences (`dependencies: [a, b]`) are not recognised;
//! - block scalars and anchors are not interpreted.

use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Name of the default environment every installation carries.
pub const RESERVED_ENV_NAME: &str = "base";

/// File extension used for exported environments.
pub const ENV_FILE_EXTENSION: &str = "yml";

fn name_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^name:(.*)$").expect("valid name regex"))
}

fn dependencies_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^dependencies:\s*(#.*)?$").expect("valid dependencies regex")
    })
}

fn list_item_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*-\s+(\S.*)$").expect("valid list item regex"))
}

fn prefix_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^prefix:").expect("valid prefix regex"))
}

/// What the scanner found in an environment file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFileSummary {
    /// Declared environment name; empty when absent.
    pub name: String,
    pub channels: Vec<String>,
    pub dependency_specs: Vec<String>,
    pub has_dependencies_key: bool,
    pub has_prefix: bool,
}

impl EnvFileSummary {
    /// Scan file contents without interpreting full YAML semantics.
    pub fn scan(contents: &str) -> Self {
        let mut summary = Self {
            name: extract_name_from(contents),
            ..Self::default()
        };

        let mut block: Option<&mut Vec<String>> = None;
        for line in contents.lines() {
            if is_top_level(line) {
                block = None;
                if dependencies_line().is_match(line) {
                    summary.has_dependencies_key = true;
                    block = Some(&mut summary.dependency_specs);
                } else if line.starts_with("channels:") {
                    block = Some(&mut summary.channels);
                } else if prefix_line().is_match(line) {
                    summary.has_prefix = true;
                }
                continue;
            }

            if let Some(items) = block.as_deref_mut() {
                if let Some(captures) = list_item_line().captures(line) {
                    items.push(captures[1].trim().to_string());
                }
            }
        }

        summary
    }

    /// The validity invariant: non-empty name and at least one dependency.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.dependency_specs.is_empty()
    }

    /// First reason the file would be rejected, if any.
    pub fn problem(&self) -> Option<&'static str> {
        if self.name.is_empty() {
            Some("missing or empty top-level 'name:'")
        } else if !self.has_dependencies_key {
            Some("missing top-level 'dependencies:'")
        } else if self.dependency_specs.is_empty() {
            Some("'dependencies:' has no list items")
        } else {
            None
        }
    }
}

/// A top-level line starts in column 0 and is neither a list item nor a comment.
fn is_top_level(line: &str) -> bool {
    match line.chars().next() {
        None => false,
        Some(ch) => !ch.is_whitespace() && ch != '-' && ch != '#',
    }
}

/// Read and scan a file. Missing or empty files are reported as errors.
pub fn inspect(path: &Path) -> Result<EnvFileSummary> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read environment file {:?}", path))?;
    if contents.trim().is_empty() {
        anyhow::bail!("Environment file {:?} is empty", path);
    }
    Ok(EnvFileSummary::scan(&contents))
}

/// True iff the file exists, is non-empty, declares a non-empty top-level
/// `name:` and a `dependencies:` block with at least one list item.
pub fn validate(path: &Path) -> bool {
    inspect(path)
        .map(|summary| summary.is_valid())
        .unwrap_or(false)
}

/// Declared environment name, or an empty string when none can be read.
pub fn extract_name(path: &Path) -> String {
    fs::read_to_string(path)
        .map(|contents| extract_name_from(&contents))
        .unwrap_or_default()
}

/// Only the first column-0 `name:` line counts.
pub fn extract_name_from(contents: &str) -> String {
    contents
        .lines()
        .find_map(|line| name_line().captures(line))
        .map(|captures| clean_scalar(&captures[1]))
        .unwrap_or_default()
}

fn clean_scalar(raw: &str) -> String {
    let value = raw.trim();

    for quote in ['"', '\''] {
        if let Some(rest) = value.strip_prefix(quote) {
            if let Some(end) = rest.find(quote) {
                return rest[..end].trim().to_string();
            }
        }
    }

    let without_comment = match value.find('#') {
        Some(idx) => &value[..idx],
        None => value,
    };
    without_comment.trim().to_string()
}

/// Drop machine-local `prefix:` lines from raw export output.
pub fn strip_prefix(raw: &str) -> String {
    let mut filtered = String::with_capacity(raw.len());
    for line in raw.lines() {
        if prefix_line().is_match(line) {
            continue;
        }
        filtered.push_str(line);
        filtered.push('\n');
    }
    filtered
}
