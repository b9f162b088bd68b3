use super::StageContext;
use crate::download::{self, Fetch};
use crate::interrupt::InFlight;
use crate::probe;
use crate::ui;
use anyhow::{bail, Context, Result};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed,
    AlreadyInstalled,
    Previewed,
}

/// Download the Miniforge installer for this host and run it into `prefix`.
///
/// The downloaded installer lives in a temporary file that is removed when
/// this function returns, whether it succeeds, fails or is interrupted.
pub fn run(ctx: &StageContext<'_>, prefix: &Path, fetcher: &dyn Fetch) -> Result<InstallOutcome> {
    if let Some(conda) = probe::find_executable(prefix, ctx.platform.conda_relpaths()) {
        ui::info(format!(
            "Miniforge is already installed at {} ({}); skipping download.",
            prefix.display(),
            conda.display()
        ));
        return Ok(InstallOutcome::AlreadyInstalled);
    }

    let asset = ctx.platform.installer_asset()?;
    let url = download::installer_url(&asset)?;

    if ctx.dry_run() {
        ui::preview(format!("download {url}"));
        ui::preview(format!("install {asset} into {}", prefix.display()));
        return Ok(InstallOutcome::Previewed);
    }

    let extension = Path::new(&asset)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let installer = tempfile::Builder::new()
        .prefix("Miniforge3-")
        .suffix(&extension)
        .tempfile()
        .context("Failed to create temporary installer file")?
        .into_temp_path();

    let guard = ctx
        .session
        .interrupts()
        .begin(InFlight::Download(installer.to_path_buf()));

    let progress = ui::Progress::new("Downloading", asset.clone());
    let digest = match fetcher.fetch(&url, &installer) {
        Ok(digest) => digest,
        Err(err) => {
            progress.fail("Failed", format!("{err:#}"));
            return Err(err);
        }
    };
    progress.success("Downloaded", Some(download::format_digest(&digest)));
    verify_checksum(fetcher, &asset, &digest)?;

    let (program, args) = ctx.platform.installer_command(&installer, prefix);
    ui::status("Installing", format!("Miniforge into {}", prefix.display()));
    let output = ctx.runner.run_interactive(&program, &args)?;
    if !output.success {
        bail!(
            "Miniforge installer failed ({}); nothing was configured",
            output.describe_status()
        );
    }

    guard.finish();
    installer
        .close()
        .context("Failed to remove temporary installer")?;
    ui::success("Installed", format!("Miniforge at {}", prefix.display()));
    Ok(InstallOutcome::Installed)
}

/// A published checksum must match. A missing one is only a warning.
fn verify_checksum(fetcher: &dyn Fetch, asset: &str, digest: &[u8; 32]) -> Result<()> {
    let url = download::checksum_url(asset)?;
    let expected = match fetcher
        .fetch_text(&url)
        .and_then(|text| download::parse_checksum(&text))
    {
        Ok(expected) => expected,
        Err(err) => {
            ui::warn(format!("Could not verify installer checksum: {err:#}"));
            return Ok(());
        }
    };
    if &expected != digest {
        bail!(
            "Checksum mismatch for {asset}: expected {}, downloaded {}",
            download::format_digest(&expected),
            download::format_digest(digest)
        );
    }
    Ok(())
}
