//! Resolution-stage handlers.

use tabled::Tabled;

use mousesync_core::{Controller, ResolutionStage, StageDisplayMode};

use crate::cli::{GlobalOpts, OutputFormat, StagesArgs, StagesCommand};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct StageRow {
    #[tabled(rename = "Stage")]
    index: u8,
    #[tabled(rename = "Resolution")]
    resolution: String,
    #[tabled(rename = "Active")]
    active: &'static str,
}

impl From<&ResolutionStage> for StageRow {
    fn from(s: &ResolutionStage) -> Self {
        Self {
            index: s.index,
            resolution: s.resolution.to_string(),
            active: if s.active { "*" } else { "" },
        }
    }
}

/// Build a table from per-stage resolutions, marking `active` (1-based).
fn stage_table(resolutions: &[u16], active: u8) -> Result<Vec<ResolutionStage>, CliError> {
    resolutions
        .iter()
        .enumerate()
        .map(|(i, &dpi)| {
            let index = u8::try_from(i + 1).map_err(|_| CliError::Validation {
                field: "stages".into(),
                reason: format!("at most {} stages are supported", u8::MAX),
            })?;
            Ok(ResolutionStage::new(index, dpi, dpi, index == active))
        })
        .collect()
}

fn print_stages(
    controller: &Controller,
    mode: StageDisplayMode,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    let stages = util::snapshot(controller)?.displayed_stages(mode);
    let out = output::render_list(format, &stages, |s| StageRow::from(s))?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: StagesArgs,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    match args.command {
        StagesCommand::List { mode, refresh } => {
            if refresh {
                let outcome = controller.refresh_resolution_stages().await?;
                util::settle("stage refresh", outcome)?;
            }
            print_stages(controller, mode.into(), global, format)
        }

        StagesCommand::Activate { index } => {
            let outcome = controller.set_active_resolution_stage(index).await?;
            util::settle(&format!("activate stage {index}"), outcome)?;
            print_stages(controller, StageDisplayMode::Multi, global, format)
        }

        StagesCommand::Set { index, x, y } => {
            let y = y.unwrap_or(x);
            let outcome = controller.set_stage_resolution(index, x, y).await?;
            util::settle(&format!("stage {index} resolution {x}x{y}"), outcome)?;
            print_stages(controller, StageDisplayMode::Multi, global, format)
        }

        StagesCommand::Replace {
            resolutions,
            active,
        } => {
            let stages = stage_table(&resolutions, active)?;
            let outcome = controller.set_resolution_stages(stages).await?;
            util::settle("stage table", outcome)?;
            print_stages(controller, StageDisplayMode::Multi, global, format)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stage_table_marks_one_active_stage() {
        let stages = stage_table(&[400, 800, 1600], 2).unwrap();
        assert_eq!(stages.len(), 3);
        assert_eq!(
            stages.iter().filter(|s| s.active).map(|s| s.index).collect::<Vec<_>>(),
            vec![2]
        );
        assert_eq!(stages[2].resolution.x, 1600);
    }

    #[test]
    fn stage_table_rejects_too_many_stages() {
        let resolutions = vec![800; 300];
        assert!(stage_table(&resolutions, 1).is_err());
    }
}
