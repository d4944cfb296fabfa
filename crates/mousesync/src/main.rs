mod cli;
mod commands;
mod config;
mod device;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mousesync_core::Controller;

use crate::cli::{Cli, Command};
use crate::device::SettingsFileDevice;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose, cli.global.quiet);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, quiet: bool) {
    let filter = match (quiet, verbosity) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // Config commands don't touch the device
    if let Command::Config(args) = cli.command {
        return commands::config_cmd::handle(args, &cli.global);
    }

    let cfg = config::load(&cli.global)?;
    let format = config::output_format(&cli.global, &cfg)?;

    // Only `watch` keeps the reconciliation loop running
    let interval = match &cli.command {
        Command::Watch(args) => args.interval,
        _ => Some(0),
    };
    let controller_config = config::controller_config(&cfg, interval)?;

    let device = Arc::new(SettingsFileDevice::new(config::settings_path(
        &cli.global,
        &cfg,
    )));
    tracing::debug!(settings = %device.path().display(), "opening device settings");

    let controller = Controller::new(device, controller_config);
    controller.initialize().await?;

    tracing::debug!(command = ?cli.command, "dispatching command");
    let result = commands::dispatch(cli.command, &controller, &cli.global, format).await;
    controller.shutdown().await?;
    result
}
