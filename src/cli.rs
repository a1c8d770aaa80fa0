use std::{path::PathBuf, time::Duration};

use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};

use crate::core::{mode::ChargingMode, time_of_day::TimeOfDay};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: supervise battery charging until interrupted.
    ///
    /// SIGHUP re-reads the settings file, SIGUSR1 cancels charging control until
    /// the next power cycle.
    #[clap(name = "watch")]
    Watch(Box<WatchArgs>),

    /// Development tools.
    #[clap(name = "debug")]
    Debug(Box<DebugArgs>),
}

#[derive(Parser)]
pub struct WatchArgs {
    /// Settings file, created on the first write.
    #[clap(long, env = "CHARGEKEEPER_SETTINGS", default_value = "chargekeeper.toml")]
    pub settings: PathBuf,

    #[clap(flatten)]
    pub defaults: DefaultSettings,

    #[clap(flatten)]
    pub platform: PlatformArgs,
}

/// Default setting values, applied when a key is unset or holds an invalid value.
#[derive(Copy, Clone, Parser)]
pub struct DefaultSettings {
    #[clap(long = "default-enabled", env = "CHARGEKEEPER_DEFAULT_ENABLED")]
    pub enabled: bool,

    #[clap(long = "default-mode", env = "CHARGEKEEPER_DEFAULT_MODE", default_value = "auto")]
    pub mode: ChargingMode,

    /// Default charge limit percent for the `limit` mode.
    #[clap(
        long = "default-limit",
        env = "CHARGEKEEPER_DEFAULT_LIMIT",
        default_value = "80",
        value_parser = clap::value_parser!(u32).range(0..=100),
    )]
    pub limit: u32,

    /// Default start of the manual charge window.
    #[clap(long = "default-start-time", env = "CHARGEKEEPER_DEFAULT_START_TIME", default_value = "22:00")]
    pub start_time: TimeOfDay,

    /// Default target of the manual charge window.
    #[clap(long = "default-target-time", env = "CHARGEKEEPER_DEFAULT_TARGET_TIME", default_value = "06:00")]
    pub target_time: TimeOfDay,
}

#[derive(Clone, Parser)]
pub struct PlatformArgs {
    /// Battery supply directory.
    #[clap(
        long = "battery-dir",
        env = "CHARGEKEEPER_BATTERY_DIR",
        default_value = "/sys/class/power_supply/BAT0"
    )]
    pub battery_dir: PathBuf,

    /// Mains supply directory; the battery `status` node is used when omitted.
    #[clap(long = "mains-dir", env = "CHARGEKEEPER_MAINS_DIR")]
    pub mains_dir: Option<PathBuf>,

    /// RTC wake alarm node, consulted in `auto` mode.
    #[clap(long, env = "CHARGEKEEPER_WAKEALARM", default_value = "/sys/class/rtc/rtc0/wakealarm")]
    pub wakealarm: PathBuf,

    /// Power supply polling interval in seconds.
    #[clap(long = "poll-interval-secs", env = "CHARGEKEEPER_POLL_INTERVAL_SECS", default_value = "30")]
    pub poll_interval_secs: u64,
}

impl PlatformArgs {
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Parser)]
pub struct DebugArgs {
    #[command(subcommand)]
    pub command: DebugCommand,
}

#[derive(Subcommand)]
pub enum DebugCommand {
    /// Probe the control mechanism and report the selected strategy.
    Probe(DebugProbeArgs),

    /// Compute and display the charge window for the given inputs.
    Window(DebugWindowArgs),

    /// Print the full diagnostic dump.
    Dump(Box<DebugDumpArgs>),
}

#[derive(Parser)]
pub struct DebugProbeArgs {
    #[clap(flatten)]
    pub platform: PlatformArgs,
}

#[derive(Parser)]
pub struct DebugWindowArgs {
    #[clap(long, default_value = "manual")]
    pub mode: ChargingMode,

    #[clap(long = "start-time", default_value = "22:00")]
    pub start_time: TimeOfDay,

    #[clap(long = "target-time", default_value = "06:00")]
    pub target_time: TimeOfDay,

    /// Next wake-up alarm for the `auto` mode, RFC 3339.
    #[clap(long)]
    pub alarm: Option<DateTime<Local>>,
}

#[derive(Parser)]
pub struct DebugDumpArgs {
    #[clap(long, env = "CHARGEKEEPER_SETTINGS", default_value = "chargekeeper.toml")]
    pub settings: PathBuf,

    /// Override the RTC wake alarm, RFC 3339.
    #[clap(long)]
    pub alarm: Option<DateTime<Local>>,

    #[clap(flatten)]
    pub defaults: DefaultSettings,

    #[clap(flatten)]
    pub platform: PlatformArgs,
}
