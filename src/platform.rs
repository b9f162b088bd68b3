//! Platform adapter: path conventions, installer syntax and privilege checks.
//!
//! Everything else in the crate is platform-neutral and asks this module for
//! the concrete names it needs.

use crate::error::MigrateError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Operating system families the toolkit knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

impl Os {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linux" => Some(Os::Linux),
            "macos" => Some(Os::MacOs),
            "windows" => Some(Os::Windows),
            _ => None,
        }
    }

    pub fn is_windows(self) -> bool {
        matches!(self, Os::Windows)
    }
}

/// Host description handed to every path/asset decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: String,
}

impl Platform {
    /// The platform this binary runs on.
    pub fn current() -> Result<Self, MigrateError> {
        let os = Os::from_name(std::env::consts::OS).ok_or_else(|| {
            MigrateError::UnsupportedPlatform {
                os: std::env::consts::OS.to_string(),
                arch: std::env::consts::ARCH.to_string(),
            }
        })?;
        Ok(Self {
            os,
            arch: std::env::consts::ARCH.to_string(),
        })
    }

    pub fn new(os: Os, arch: impl Into<String>) -> Self {
        Self {
            os,
            arch: arch.into(),
        }
    }

    /// Conventional Anaconda roots in probe order.
    pub fn anaconda_root_candidates(&self, home: &Path) -> Vec<PathBuf> {
        match self.os {
            Os::Windows => {
                let mut roots = vec![home.join("anaconda3"), home.join("Anaconda3")];
                if let Some(local) = std::env::var_os("LOCALAPPDATA") {
                    roots.push(PathBuf::from(local).join("anaconda3"));
                }
                if let Some(program_data) = std::env::var_os("ProgramData") {
                    roots.push(PathBuf::from(program_data).join("anaconda3"));
                }
                roots.push(PathBuf::from(r"C:\anaconda3"));
                roots
            }
            Os::MacOs => vec![
                home.join("anaconda3"),
                home.join("opt").join("anaconda3"),
                home.join("anaconda"),
                PathBuf::from("/opt/anaconda3"),
                PathBuf::from("/usr/local/anaconda3"),
            ],
            Os::Linux => vec![
                home.join("anaconda3"),
                home.join("anaconda"),
                PathBuf::from("/opt/anaconda3"),
                PathBuf::from("/opt/anaconda"),
                PathBuf::from("/usr/local/anaconda3"),
            ],
        }
    }

    pub fn default_miniforge_prefix(&self, home: &Path) -> PathBuf {
        home.join("miniforge3")
    }

    /// Relative paths of the primary package-manager binary, in preference order.
    pub fn conda_relpaths(&self) -> &'static [&'static str] {
        if self.os.is_windows() {
            &[r"Scripts\conda.exe", r"condabin\conda.bat"]
        } else {
            &["bin/conda", "condabin/conda"]
        }
    }

    /// Relative paths of the accelerated package-manager binary.
    pub fn mamba_relpaths(&self) -> &'static [&'static str] {
        if self.os.is_windows() {
            &[r"Library\bin\mamba.exe", r"Scripts\mamba.exe", r"condabin\mamba.bat"]
        } else {
            &["bin/mamba", "condabin/mamba"]
        }
    }

    /// Vendor uninstaller names across Anaconda releases.
    pub fn uninstaller_relpaths(&self) -> &'static [&'static str] {
        if self.os.is_windows() {
            &[
                "Uninstall-Anaconda3.exe",
                "Uninstall-Anaconda.exe",
                "Uninstall-Anaconda2.exe",
            ]
        } else {
            &["uninstall.sh", "uninstall-anaconda3.sh", "bin/anaconda-uninstall"]
        }
    }

    /// Relative path of the deep-clean tool inside an Anaconda root.
    pub fn deep_clean_relpath(&self) -> &'static str {
        if self.os.is_windows() {
            r"Scripts\anaconda-clean.exe"
        } else {
            "bin/anaconda-clean"
        }
    }

    /// Fixed, non-interactive uninstaller arguments.
    pub fn uninstaller_args(&self) -> Vec<OsString> {
        let args: &[&str] = if self.os.is_windows() {
            &[
                "/S",
                "/RemoveCaches=1",
                "/RemoveConfigFiles=user",
                "/RemoveUserData=1",
            ]
        } else {
            &[
                "--remove-caches",
                "--remove-config-files",
                "user",
                "--remove-user-data",
            ]
        };
        args.iter().map(OsString::from).collect()
    }

    /// Release asset name of the Miniforge installer for this host.
    pub fn installer_asset(&self) -> Result<String, MigrateError> {
        let asset = match (self.os, self.arch.as_str()) {
            (Os::Linux, "x86_64") => "Miniforge3-Linux-x86_64.sh",
            (Os::Linux, "aarch64" | "arm64") => "Miniforge3-Linux-aarch64.sh",
            (Os::MacOs, "x86_64") => "Miniforge3-MacOSX-x86_64.sh",
            (Os::MacOs, "aarch64" | "arm64") => "Miniforge3-MacOSX-arm64.sh",
            (Os::Windows, "x86_64") => "Miniforge3-Windows-x86_64.exe",
            (os, arch) => {
                return Err(MigrateError::UnsupportedPlatform {
                    os: format!("{os:?}"),
                    arch: arch.to_string(),
                })
            }
        };
        Ok(asset.to_string())
    }

    /// Program and arguments that run the installer silently into `prefix`
    /// without touching PATH or registering as the system interpreter.
    pub fn installer_command(&self, installer: &Path, prefix: &Path) -> (PathBuf, Vec<OsString>) {
        if self.os.is_windows() {
            let mut destination = OsString::from("/D=");
            destination.push(prefix.as_os_str());
            (
                installer.to_path_buf(),
                vec![
                    OsString::from("/InstallationType=JustMe"),
                    OsString::from("/RegisterPython=0"),
                    OsString::from("/AddToPath=0"),
                    OsString::from("/S"),
                    destination,
                ],
            )
        } else {
            (
                PathBuf::from("bash"),
                vec![
                    installer.as_os_str().to_os_string(),
                    OsString::from("-b"),
                    OsString::from("-p"),
                    prefix.as_os_str().to_os_string(),
                ],
            )
        }
    }

    /// Whether the current process runs with administrative privileges.
    pub fn is_elevated(&self) -> bool {
        if self.os.is_windows() {
            // `net session` only succeeds from an elevated token.
            std::process::Command::new("net")
                .arg("session")
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .status()
                .map(|status| status.success())
                .unwrap_or(false)
        } else {
            whoami::username() == "root"
        }
    }
}
