use crate::cli::{Cli, Commands};
use crate::config::{Config, Settings};
use anyhow::Result;
use tracing::debug;

mod check;
mod install;
mod remove;

/// Per-invocation switches shared by `remove` and `install`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunMode {
    pub assume_yes: bool,
    pub dry_run: bool,
}

pub fn execute(cli: Cli) -> Result<()> {
    let config = Config::load_default()?;
    let settings = Settings::resolve(&config, cli.export_dir)?;
    debug!(?settings, "resolved settings");

    let mode = RunMode {
        assume_yes: cli.yes,
        dry_run: cli.dry_run,
    };

    match cli.command {
        Commands::Remove(args) => remove::execute(&settings, &args, mode),
        Commands::Install(args) => install::execute(&settings, &args, mode),
        Commands::Check => check::execute(&settings),
    }
}
