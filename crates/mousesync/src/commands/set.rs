//! Single-setting mutation handlers.

use mousesync_core::Controller;

use crate::cli::{GlobalOpts, SetArgs, SetCommand};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    controller: &Controller,
    args: SetArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (what, outcome) = match args.command {
        SetCommand::PollingRate { hz } => (
            format!("polling rate {hz} Hz"),
            controller.set_polling_rate(hz).await?,
        ),
        SetCommand::Resolution { x, y } => {
            let y = y.unwrap_or(x);
            (
                format!("resolution {x}x{y}"),
                controller.set_resolution(x, y).await?,
            )
        }
        SetCommand::Brightness { level } => (
            format!("brightness {level}"),
            controller.set_illumination_brightness(level).await?,
        ),
        SetCommand::Color { color } => (
            format!("color {color}"),
            controller.set_illumination_color(color).await?,
        ),
        SetCommand::Behavior { behavior } => {
            let behavior = behavior.into();
            (
                format!("behavior {behavior}"),
                controller.set_illumination_behavior(behavior).await?,
            )
        }
        SetCommand::ScrollInverted { enabled } => (
            format!("scroll inverted {enabled}"),
            controller.set_scroll_inverted(enabled).await?,
        ),
        SetCommand::SmartWheel { enabled } => (
            format!("smart wheel {enabled}"),
            controller.set_smart_wheel_enabled(enabled).await?,
        ),
    };

    util::settle(&what, outcome)?;
    output::print_output(&format!("Set {what}"), global.quiet);
    Ok(())
}
