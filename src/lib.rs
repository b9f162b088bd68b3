// Public API
pub mod cli;
pub mod commands;

// Migration stages and their collaborators
pub mod conda;
pub mod config;
pub mod download;
pub mod envfile;
pub mod error;
pub mod interrupt;
pub mod plan;
pub mod platform;
pub mod probe;
pub mod prompt;
pub mod runner;
pub mod selection;
pub mod stages;
pub mod ui;
pub mod util;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use config::{Config, Settings};
pub use error::MigrateError;
pub use plan::{InstallPlan, RemovalPlan};
pub use platform::Platform;
