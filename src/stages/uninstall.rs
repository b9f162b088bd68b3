use super::StageContext;
use crate::error::MigrateError;
use crate::probe::{self, RootResolution};
use crate::ui;
use anyhow::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    /// The vendor uninstaller ran and reported success.
    Completed,
    NotFound,
    Declined,
    Failed(String),
    Previewed,
}

impl UninstallOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, UninstallOutcome::Completed)
    }
}

/// Run the vendor uninstaller found under the search roots.
///
/// `elevated` must come from [`crate::platform::Platform::is_elevated`]; the
/// stage refuses to touch a per-user installation with administrative rights.
pub fn run(
    ctx: &StageContext<'_>,
    roots: &RootResolution,
    elevated: bool,
) -> Result<UninstallOutcome> {
    if elevated {
        return Err(MigrateError::Elevated.into());
    }

    let Some(uninstaller) = probe::find_in_roots(&roots.search, ctx.platform.uninstaller_relpaths())
    else {
        let searched = roots
            .search
            .iter()
            .map(|root| root.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        ui::info(format!(
            "No vendor uninstaller found (searched: {}); the clean stage will remove leftovers.",
            if searched.is_empty() { "none" } else { searched.as_str() }
        ));
        return Ok(UninstallOutcome::NotFound);
    };

    let args = ctx.platform.uninstaller_args();
    let command_line = std::iter::once(uninstaller.display().to_string())
        .chain(args.iter().map(|arg| arg.to_string_lossy().into_owned()))
        .collect::<Vec<_>>()
        .join(" ");

    if !ctx
        .session
        .confirm(&format!("Run the Anaconda uninstaller {}?", uninstaller.display()))?
    {
        ui::info("Skipping the vendor uninstaller.");
        return Ok(UninstallOutcome::Declined);
    }

    if ctx.dry_run() {
        ui::preview(command_line);
        return Ok(UninstallOutcome::Previewed);
    }

    ui::status("Running", &command_line);
    let output = ctx.runner.run_interactive(&uninstaller, &args)?;
    if output.success {
        ui::success("Uninstalled", "vendor uninstaller completed");
        Ok(UninstallOutcome::Completed)
    } else {
        let status = output.describe_status();
        ui::warn(format!(
            "The uninstaller failed ({status}). Re-run it by hand with: {command_line}"
        ));
        Ok(UninstallOutcome::Failed(status))
    }
}
