//! Resolution of skip/only switches into an immutable stage plan.
//!
//! Every stage starts enabled. Skip switches turn single stages off. An only
//! switch selects exactly the stages it names and must stand alone: two only
//! switches, or an only switch next to any skip switch of the same tool, is a
//! configuration error raised before anything runs.

use crate::error::MigrateError;
use std::fmt;

/// Stages of the removal tool, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalStage {
    Export,
    Validate,
    Deinit,
    Uninstall,
    Clean,
}

impl RemovalStage {
    pub const ALL: [RemovalStage; 5] = [
        RemovalStage::Export,
        RemovalStage::Validate,
        RemovalStage::Deinit,
        RemovalStage::Uninstall,
        RemovalStage::Clean,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RemovalStage::Export => "export",
            RemovalStage::Validate => "validate",
            RemovalStage::Deinit => "deinit",
            RemovalStage::Uninstall => "uninstall",
            RemovalStage::Clean => "clean",
        }
    }
}

/// Stages of the installation tool, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallStage {
    Install,
    Init,
    Import,
}

impl InstallStage {
    pub const ALL: [InstallStage; 3] = [
        InstallStage::Install,
        InstallStage::Init,
        InstallStage::Import,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            InstallStage::Install => "install",
            InstallStage::Init => "init",
            InstallStage::Import => "import",
        }
    }
}

impl fmt::Display for RemovalStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw removal switches as parsed from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemovalFlags {
    pub skip_export: bool,
    pub skip_validate: bool,
    pub skip_deinit: bool,
    pub skip_uninstall: bool,
    pub skip_clean: bool,
    pub export_only: bool,
    pub validate_only: bool,
    pub uninstall_only: bool,
    pub clean_only: bool,
}

/// Raw installation switches as parsed from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstallFlags {
    pub skip_install: bool,
    pub skip_init: bool,
    pub skip_import: bool,
    pub install_only: bool,
    pub init_only: bool,
    pub import_only: bool,
}

struct SkipSwitch<S> {
    flag: &'static str,
    stage: S,
    set: bool,
}

struct OnlySwitch<S: 'static> {
    flag: &'static str,
    stages: &'static [S],
    set: bool,
}

fn resolve<S: Copy + PartialEq + 'static>(
    all: &[S],
    skips: &[SkipSwitch<S>],
    onlys: &[OnlySwitch<S>],
) -> Result<Vec<S>, MigrateError> {
    let active_onlys: Vec<&OnlySwitch<S>> = onlys.iter().filter(|only| only.set).collect();

    if active_onlys.len() > 1 {
        let names: Vec<&str> = active_onlys.iter().map(|only| only.flag).collect();
        return Err(MigrateError::FlagConflict(format!(
            "{} are mutually exclusive",
            names.join(", ")
        )));
    }

    if let Some(only) = active_onlys.first() {
        let skipped: Vec<&str> = skips
            .iter()
            .filter(|skip| skip.set)
            .map(|skip| skip.flag)
            .collect();
        if !skipped.is_empty() {
            return Err(MigrateError::FlagConflict(format!(
                "{} cannot be combined with {}",
                only.flag,
                skipped.join(", ")
            )));
        }

        return Ok(all
            .iter()
            .copied()
            .filter(|stage| only.stages.contains(stage))
            .collect());
    }

    Ok(all
        .iter()
        .copied()
        .filter(|stage| !skips.iter().any(|skip| skip.set && skip.stage == *stage))
        .collect())
}

/// Resolved removal stages; immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalPlan {
    pub export: bool,
    pub validate: bool,
    pub deinit: bool,
    pub uninstall: bool,
    pub clean: bool,
}

impl RemovalPlan {
    pub fn resolve(flags: &RemovalFlags) -> Result<Self, MigrateError> {
        let skips = [
            SkipSwitch {
                flag: "--skip-export",
                stage: RemovalStage::Export,
                set: flags.skip_export,
            },
            SkipSwitch {
                flag: "--skip-validate",
                stage: RemovalStage::Validate,
                set: flags.skip_validate,
            },
            SkipSwitch {
                flag: "--skip-deinit",
                stage: RemovalStage::Deinit,
                set: flags.skip_deinit,
            },
            SkipSwitch {
                flag: "--skip-uninstall",
                stage: RemovalStage::Uninstall,
                set: flags.skip_uninstall,
            },
            SkipSwitch {
                flag: "--skip-clean",
                stage: RemovalStage::Clean,
                set: flags.skip_clean,
            },
        ];
        let onlys = [
            OnlySwitch {
                flag: "--export-only",
                stages: &[RemovalStage::Export],
                set: flags.export_only,
            },
            OnlySwitch {
                flag: "--validate-only",
                stages: &[RemovalStage::Validate],
                set: flags.validate_only,
            },
            OnlySwitch {
                flag: "--uninstall-only",
                stages: &[RemovalStage::Uninstall],
                set: flags.uninstall_only,
            },
            OnlySwitch {
                flag: "--clean-only",
                stages: &[RemovalStage::Deinit, RemovalStage::Clean],
                set: flags.clean_only,
            },
        ];

        let enabled = resolve(&RemovalStage::ALL, &skips, &onlys)?;
        Ok(Self {
            export: enabled.contains(&RemovalStage::Export),
            validate: enabled.contains(&RemovalStage::Validate),
            deinit: enabled.contains(&RemovalStage::Deinit),
            uninstall: enabled.contains(&RemovalStage::Uninstall),
            clean: enabled.contains(&RemovalStage::Clean),
        })
    }

    pub fn is_enabled(&self, stage: RemovalStage) -> bool {
        match stage {
            RemovalStage::Export => self.export,
            RemovalStage::Validate => self.validate,
            RemovalStage::Deinit => self.deinit,
            RemovalStage::Uninstall => self.uninstall,
            RemovalStage::Clean => self.clean,
        }
    }

    /// Enabled stages in execution order.
    pub fn stages(&self) -> Vec<RemovalStage> {
        RemovalStage::ALL
            .into_iter()
            .filter(|stage| self.is_enabled(*stage))
            .collect()
    }

    pub fn has_destructive_stage(&self) -> bool {
        self.deinit || self.uninstall || self.clean
    }
}

/// Resolved installation stages; immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallPlan {
    pub install: bool,
    pub init: bool,
    pub import: bool,
}

impl InstallPlan {
    pub fn resolve(flags: &InstallFlags) -> Result<Self, MigrateError> {
        let skips = [
            SkipSwitch {
                flag: "--skip-install",
                stage: InstallStage::Install,
                set: flags.skip_install,
            },
            SkipSwitch {
                flag: "--skip-init",
                stage: InstallStage::Init,
                set: flags.skip_init,
            },
            SkipSwitch {
                flag: "--skip-import",
                stage: InstallStage::Import,
                set: flags.skip_import,
            },
        ];
        let onlys = [
            OnlySwitch {
                flag: "--install-only",
                stages: &[InstallStage::Install],
                set: flags.install_only,
            },
            OnlySwitch {
                flag: "--init-only",
                stages: &[InstallStage::Init],
                set: flags.init_only,
            },
            OnlySwitch {
                flag: "--import-only",
                stages: &[InstallStage::Import],
                set: flags.import_only,
            },
        ];

        let enabled = resolve(&InstallStage::ALL, &skips, &onlys)?;
        Ok(Self {
            install: enabled.contains(&InstallStage::Install),
            init: enabled.contains(&InstallStage::Init),
            import: enabled.contains(&InstallStage::Import),
        })
    }

    pub fn is_enabled(&self, stage: InstallStage) -> bool {
        match stage {
            InstallStage::Install => self.install,
            InstallStage::Init => self.init,
            InstallStage::Import => self.import,
        }
    }

    pub fn stages(&self) -> Vec<InstallStage> {
        InstallStage::ALL
            .into_iter()
            .filter(|stage| self.is_enabled(*stage))
            .collect()
    }
}

/// Human-readable plan line, e.g. `export -> validate -> clean`.
pub fn describe<S: fmt::Display>(stages: &[S]) -> String {
    if stages.is_empty() {
        return "no-op (every stage skipped)".to_string();
    }
    stages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
