use crate::config::Settings;
use crate::error::MigrateError;
use crate::stages::validate;
use crate::ui;
use anyhow::Result;

pub fn execute(settings: &Settings) -> Result<()> {
    let report = validate::run(&settings.export_dir)?;
    report.print_summary();

    if !report.is_ok() {
        return Err(MigrateError::ValidationFailed {
            failed: report.failed.len(),
        }
        .into());
    }
    if report.checked() > 0 {
        ui::success("Checked", "every environment file is valid");
    }
    Ok(())
}
