//! Follow the device snapshot as the reconciliation loop observes changes.

use mousesync_core::{Controller, DeviceSnapshot};
use tokio_stream::StreamExt;

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::commands::show;
use crate::error::CliError;
use crate::output;

fn render(snap: &DeviceSnapshot, format: OutputFormat) -> Result<String, CliError> {
    match format {
        // One object per line so the stream can be piped
        OutputFormat::Json => output::render_json_compact(snap),
        OutputFormat::Table => Ok(format!(
            "── {} ──\n{}\n",
            chrono::Local::now().format("%H:%M:%S"),
            show::detail(snap)
        )),
    }
}

pub async fn handle(
    controller: &Controller,
    args: &WatchArgs,
    global: &GlobalOpts,
    format: OutputFormat,
) -> Result<(), CliError> {
    if args.count == Some(0) {
        return Err(CliError::Validation {
            field: "count".into(),
            reason: "must be at least 1".into(),
        });
    }
    if !controller.is_reconciling() {
        return Err(CliError::Validation {
            field: "interval".into(),
            reason: "watch needs a reconcile interval above zero".into(),
        });
    }

    // Yields the current snapshot first, then each published change
    let mut stream = controller.subscribe().into_stream();
    let mut printed = 0usize;

    while !args.count.is_some_and(|n| printed >= n) {
        tokio::select! {
            next = stream.next() => {
                let Some(published) = next else { break };
                if let Some(snap) = published {
                    output::print_output(&render(&snap, format)?, global.quiet);
                    printed += 1;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("interrupted");
                break;
            }
        }
    }

    if let Some(message) = controller.error_state().message() {
        tracing::warn!(%message, "last device error");
    }
    Ok(())
}
