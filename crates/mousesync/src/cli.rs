//! Clap derive structures for the `mousesync` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use mousesync_core::{IlluminationBehavior, RgbColor, StageDisplayMode};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// mousesync -- keep a mouse's settings in sync from the command line
#[derive(Debug, Parser)]
#[command(
    name = "mousesync",
    version,
    about = "Read and change mouse settings from the command line",
    long_about = "Reads the full device state, applies changes optimistically and\n\
        keeps the local view reconciled with the device.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "MOUSESYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Device settings document (overrides [device].settings_file)
    #[arg(long, short = 's', env = "MOUSESYNC_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'o', env = "MOUSESYNC_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the full device snapshot
    Show,

    /// Read battery level and charging state
    Battery,

    /// Change one device setting
    Set(SetArgs),

    /// Inspect and edit resolution stages
    #[command(alias = "stage")]
    Stages(StagesArgs),

    /// Follow the device state as it is reconciled
    Watch(WatchArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

// ── Set ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SetArgs {
    #[command(subcommand)]
    pub command: SetCommand,
}

#[derive(Debug, Subcommand)]
pub enum SetCommand {
    /// Polling rate in Hz (125, 250, 500 or 1000)
    PollingRate { hz: u16 },

    /// Pointer resolution; Y defaults to X
    #[command(alias = "dpi")]
    Resolution { x: u16, y: Option<u16> },

    /// Illumination brightness (0-100)
    Brightness { level: u8 },

    /// Illumination color as #rrggbb or r,g,b
    Color {
        #[arg(value_parser = parse_color)]
        color: RgbColor,
    },

    /// Illumination behavior
    Behavior { behavior: BehaviorArg },

    /// Invert scroll direction (on/off)
    ScrollInverted {
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        enabled: bool,
    },

    /// Smart-wheel mode (on/off)
    SmartWheel {
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        enabled: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BehaviorArg {
    None,
    Static,
}

impl From<BehaviorArg> for IlluminationBehavior {
    fn from(arg: BehaviorArg) -> Self {
        match arg {
            BehaviorArg::None => Self::None,
            BehaviorArg::Static => Self::Static,
        }
    }
}

/// Parse `#rrggbb`, `rrggbb` or `r,g,b`.
pub fn parse_color(s: &str) -> Result<RgbColor, String> {
    if s.contains(',') {
        let channels: Vec<u8> = s
            .split(',')
            .map(|c| {
                c.trim()
                    .parse::<u8>()
                    .map_err(|_| format!("'{c}' is not a channel value in 0..=255"))
            })
            .collect::<Result<_, _>>()?;
        return match channels.as_slice() {
            [r, g, b] => Ok(RgbColor::new(*r, *g, *b)),
            _ => Err(format!("expected three channels, got {}", channels.len())),
        };
    }

    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("'{s}' is not a #rrggbb color"));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).map_err(|e| e.to_string())
    };
    Ok(RgbColor::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

// ── Stages ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StagesArgs {
    #[command(subcommand)]
    pub command: StagesCommand,
}

#[derive(Debug, Subcommand)]
pub enum StagesCommand {
    /// List resolution stages
    #[command(alias = "ls")]
    List {
        /// Display mode
        #[arg(long, default_value = "multi")]
        mode: ModeArg,

        /// Re-read the stage table from the device first
        #[arg(long)]
        refresh: bool,
    },

    /// Make one stage active; the live resolution follows it
    Activate { index: u8 },

    /// Change one stage's resolution; Y defaults to X
    Set { index: u8, x: u16, y: Option<u16> },

    /// Replace the whole table with the given resolutions
    Replace {
        /// One resolution per stage, in order
        #[arg(required = true, num_args = 1..)]
        resolutions: Vec<u16>,

        /// 1-based stage to mark active
        #[arg(long, default_value = "1")]
        active: u8,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Single,
    Multi,
}

impl From<ModeArg> for StageDisplayMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Single => Self::Single,
            ModeArg::Multi => Self::Multi,
        }
    }
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Exit after printing this many snapshots
    #[arg(long, short = 'n')]
    pub count: Option<usize>,

    /// Seconds between reconciliation reads (overrides config)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Write a config file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
