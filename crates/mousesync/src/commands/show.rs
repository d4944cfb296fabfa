//! Snapshot and battery handlers.

use serde::Serialize;

use mousesync_core::{Controller, DeviceSnapshot};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

pub fn detail(s: &DeviceSnapshot) -> String {
    let active = s.active_stage();
    [
        format!("Battery:       {}%{}", s.battery_level, charging(s.is_charging)),
        format!("Polling rate:  {}", s.polling_rate),
        format!("Resolution:    {}", s.resolution),
        format!("Active stage:  {} of {}", active.index, s.stages.len()),
        format!("Brightness:    {}", s.illumination_brightness),
        format!("Color:         {}", s.illumination_color),
        format!("Behavior:      {}", s.illumination_behavior),
        format!("Scroll:        {}", if s.scroll_inverted { "inverted" } else { "normal" }),
        format!("Smart wheel:   {}", on_off(s.smart_wheel_enabled)),
        format!("Target OS:     {}", s.target_platform),
    ]
    .join("\n")
}

fn charging(is_charging: bool) -> &'static str {
    if is_charging { " (charging)" } else { "" }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

pub fn handle(
    controller: &Controller,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    let snap = util::snapshot(controller)?;
    let out = output::render_single(format, snap.as_ref(), detail)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Battery ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct BatteryReport {
    level: u8,
    is_charging: bool,
}

pub async fn battery(
    controller: &Controller,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    let outcome = controller.refresh_battery().await?;
    util::settle("battery refresh", outcome)?;

    let snap = util::snapshot(controller)?;
    let report = BatteryReport {
        level: snap.battery_level,
        is_charging: snap.is_charging,
    };
    let out = output::render_single(format, &report, |r| {
        format!("{}%{}", r.level, charging(r.is_charging))
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
