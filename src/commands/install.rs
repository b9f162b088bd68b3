use super::RunMode;
use crate::cli::InstallArgs;
use crate::config::Settings;
use crate::download::Downloader;
use crate::interrupt::InterruptWatch;
use crate::plan::{self, InstallPlan};
use crate::platform::Platform;
use crate::prompt::{Session, TerminalPrompt};
use crate::runner::SystemRunner;
use crate::stages::import::{self, ImportOptions};
use crate::stages::{init, install, StageContext};
use crate::ui;
use anyhow::Result;

pub fn execute(settings: &Settings, args: &InstallArgs, mode: RunMode) -> Result<()> {
    let plan = InstallPlan::resolve(&args.flags())?;
    let platform = Platform::current()?;

    let prompt = TerminalPrompt;
    let session =
        Session::new(mode.assume_yes, mode.dry_run, &prompt).with_interrupts(InterruptWatch::install()?);
    let runner = SystemRunner;
    let ctx = StageContext {
        session: &session,
        runner: &runner,
        platform: &platform,
    };

    let prefix = args
        .prefix
        .clone()
        .or_else(|| settings.miniforge_prefix.clone())
        .unwrap_or_else(|| platform.default_miniforge_prefix(&settings.home));
    let channel = args.channel.as_deref().unwrap_or(&settings.channel);

    ui::status("Plan", plan::describe(&plan.stages()));
    ui::info(format!("Miniforge prefix: {}", prefix.display()));
    if mode.dry_run {
        ui::preview("no changes will be made");
    }

    if plan.install {
        ui::stage("Install");
        let downloader = Downloader::new()?;
        install::run(&ctx, &prefix, &downloader)?;
    }

    if plan.init {
        ui::stage("Init");
        init::run(&ctx, &prefix, channel)?;
    }

    if plan.import {
        ui::stage("Import");
        import::run(
            &ctx,
            &prefix,
            &ImportOptions {
                export_dir: settings.export_dir.clone(),
                log_dir: settings.log_dir(),
                skip_base: args.skip_base,
            },
        )?;
    }

    if mode.dry_run {
        ui::success("Done", "dry run complete; nothing was changed");
    } else {
        ui::success("Done", "open a new shell to start using Miniforge");
    }
    Ok(())
}
