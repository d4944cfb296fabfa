//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod config_cmd;
pub mod set;
pub mod show;
pub mod stages;
pub mod util;
pub mod watch;

use mousesync_core::Controller;

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    match cmd {
        Command::Show => show::handle(controller, global, format),
        Command::Battery => show::battery(controller, global, format).await,
        Command::Set(args) => set::handle(controller, args, global).await,
        Command::Stages(args) => stages::handle(controller, args, global, format).await,
        Command::Watch(args) => watch::handle(controller, &args, global, format).await,
        // Config is handled before a device is opened
        Command::Config(_) => unreachable!(),
    }
}
