use crate::plan::{InstallFlags, RemovalFlags};
use crate::util::expand_path;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// conda-migrate - move from Anaconda to Miniforge
///
/// `remove` exports your environments and takes Anaconda apart;
/// `install` sets up Miniforge and re-creates the exported environments.
/// Every destructive step asks first, and `--dry-run` shows what would
/// happen without touching anything.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Answer yes to every confirmation and select every listed item
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Print what would be done without changing anything
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Directory holding exported environment files [default: ~/conda-exports]
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        env = "CONDA_MIGRATE_EXPORT_DIR",
        value_parser = expand_path
    )]
    pub export_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export environments, then remove Anaconda
    ///
    /// Stages run in order: export, validate, deinit, uninstall, clean.
    Remove(RemoveArgs),

    /// Install Miniforge and import exported environments
    ///
    /// Stages run in order: install, init, import.
    Install(InstallArgs),

    /// Validate exported environment files and exit
    Check,
}

#[derive(Args, Debug, Default)]
pub struct RemoveArgs {
    /// Skip exporting environments
    #[arg(long)]
    pub skip_export: bool,

    /// Skip validating exported files
    #[arg(long)]
    pub skip_validate: bool,

    /// Keep shell integration and skip the deep clean
    #[arg(long)]
    pub skip_deinit: bool,

    /// Skip the vendor uninstaller
    #[arg(long)]
    pub skip_uninstall: bool,

    /// Skip removing leftover directories
    #[arg(long)]
    pub skip_clean: bool,

    /// Only export environments
    #[arg(long)]
    pub export_only: bool,

    /// Only validate exported files
    #[arg(long)]
    pub validate_only: bool,

    /// Only run the vendor uninstaller
    #[arg(long)]
    pub uninstall_only: bool,

    /// Only de-initialize shells and remove leftovers
    #[arg(long)]
    pub clean_only: bool,

    /// Export every environment without asking
    #[arg(long)]
    pub export_all: bool,

    /// Export only explicitly requested packages
    #[arg(long)]
    pub from_history: bool,

    /// Rename leftovers to `<path>.old` instead of deleting them
    #[arg(long)]
    pub backup: bool,

    /// Run the deep clean without asking
    #[arg(short, long)]
    pub force: bool,

    /// Stop before any destructive stage when validation fails
    #[arg(long)]
    pub strict: bool,

    /// Anaconda installation root (disables probing of other locations)
    #[arg(
        long,
        value_name = "PATH",
        env = "CONDA_MIGRATE_ANACONDA_PATH",
        value_parser = expand_path
    )]
    pub anaconda_path: Option<PathBuf>,
}

impl RemoveArgs {
    pub fn flags(&self) -> RemovalFlags {
        RemovalFlags {
            skip_export: self.skip_export,
            skip_validate: self.skip_validate,
            skip_deinit: self.skip_deinit,
            skip_uninstall: self.skip_uninstall,
            skip_clean: self.skip_clean,
            export_only: self.export_only,
            validate_only: self.validate_only,
            uninstall_only: self.uninstall_only,
            clean_only: self.clean_only,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct InstallArgs {
    /// Skip downloading and running the installer
    #[arg(long)]
    pub skip_install: bool,

    /// Skip shell initialization and configuration
    #[arg(long)]
    pub skip_init: bool,

    /// Skip importing environments
    #[arg(long)]
    pub skip_import: bool,

    /// Only install Miniforge
    #[arg(long)]
    pub install_only: bool,

    /// Only initialize shells and configure channels
    #[arg(long)]
    pub init_only: bool,

    /// Only import environments
    #[arg(long)]
    pub import_only: bool,

    /// Installation prefix [default: ~/miniforge3]
    #[arg(
        long,
        value_name = "PATH",
        env = "CONDA_MIGRATE_MINIFORGE_PATH",
        value_parser = expand_path
    )]
    pub prefix: Option<PathBuf>,

    /// Do not import the `base` environment file
    #[arg(long)]
    pub skip_base: bool,

    /// Channel added during init [default: conda-forge]
    #[arg(long, value_name = "CHANNEL")]
    pub channel: Option<String>,
}

impl InstallArgs {
    pub fn flags(&self) -> InstallFlags {
        InstallFlags {
            skip_install: self.skip_install,
            skip_init: self.skip_init,
            skip_import: self.skip_import,
            install_only: self.install_only,
            init_only: self.init_only,
            import_only: self.import_only,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_remove_flags_map_to_planner() {
        let cli = Cli::parse_from([
            "conda-migrate",
            "--yes",
            "remove",
            "--skip-clean",
            "--export-all",
        ]);
        assert!(cli.yes);
        let Commands::Remove(args) = cli.command else {
            panic!("expected remove");
        };
        let flags = args.flags();
        assert!(flags.skip_clean);
        assert!(!flags.export_only);
        assert!(args.export_all);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["conda-migrate", "install", "--dry-run", "--import-only"]);
        assert!(cli.dry_run);
        let Commands::Install(args) = cli.command else {
            panic!("expected install");
        };
        assert!(args.flags().import_only);
    }

    #[test]
    fn test_path_arguments() {
        let cli = Cli::parse_from([
            "conda-migrate",
            "remove",
            "--anaconda-path",
            "/opt/anaconda3",
            "--export-dir",
            "/data/exports",
        ]);
        assert_eq!(cli.export_dir, Some(PathBuf::from("/data/exports")));
        let Commands::Remove(args) = cli.command else {
            panic!("expected remove");
        };
        assert_eq!(args.anaconda_path, Some(PathBuf::from("/opt/anaconda3")));
    }
}
