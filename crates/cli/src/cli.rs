//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CARLA Apollo Bridge - feeds simulator vehicle state to Apollo localization
#[derive(Parser, Debug)]
#[command(
    name = "carla-apollo-bridge",
    author,
    version,
    about = "CARLA to Apollo localization bridge",
    long_about = "Receives the ego vehicle's state line from the simulator, reconciles \n\
                  heading and map origin with Apollo, and publishes odometry, corrected \n\
                  IMU, GNSS/INS status and chassis messages to the configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CARLA_BRIDGE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CARLA_BRIDGE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bridge
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display the resolved bridge configuration
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "CARLA_BRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the inbound source kind
    #[arg(long, value_enum, env = "CARLA_BRIDGE_SOURCE")]
    pub source: Option<SourceArg>,

    /// UDP bind address for the state line (implies --source udp)
    #[arg(long, env = "CARLA_BRIDGE_BIND", conflicts_with = "replay")]
    pub bind: Option<String>,

    /// Replay a recorded state file (implies --source replay)
    #[arg(long, env = "CARLA_BRIDGE_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Replay rate in Hz (0 = as fast as possible; shallow output queues may drop)
    #[arg(long, requires = "replay")]
    pub replay_rate: Option<f64>,

    /// Loop the replay file when finished
    #[arg(long, requires = "replay")]
    pub replay_loop: bool,

    /// Stop after this many translated ticks (0 = unlimited)
    #[arg(long, default_value = "0", env = "CARLA_BRIDGE_MAX_TICKS")]
    pub max_ticks: u64,

    /// Bridge timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "CARLA_BRIDGE_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running the bridge
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "CARLA_BRIDGE_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "bridge.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; built-in defaults when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show sink parameters for each output
    #[arg(long)]
    pub outputs: bool,
}

/// Inbound source kind
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceArg {
    /// One state line per UDP datagram
    Udp,
    /// Replay a recorded state file
    Replay,
    /// Synthetic vehicle driving a circle
    Mock,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

impl From<SourceArg> for contracts::SourceKind {
    fn from(source: SourceArg) -> Self {
        match source {
            SourceArg::Udp => Self::Udp,
            SourceArg::Replay => Self::Replay,
            SourceArg::Mock => Self::Mock,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_defaults() {
        let cli = Cli::try_parse_from(["carla-apollo-bridge", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.config.is_none());
        assert_eq!(args.max_ticks, 0);
        assert_eq!(args.metrics_port, 9000);
    }

    #[test]
    fn test_parse_run_replay() {
        let cli = Cli::try_parse_from([
            "carla-apollo-bridge",
            "-v",
            "run",
            "--replay",
            "drive.txt",
            "--replay-rate",
            "20",
            "--max-ticks",
            "100",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.replay, Some(PathBuf::from("drive.txt")));
        assert_eq!(args.replay_rate, Some(20.0));
        assert_eq!(args.max_ticks, 100);
    }

    #[test]
    fn test_bind_conflicts_with_replay() {
        let result = Cli::try_parse_from([
            "carla-apollo-bridge",
            "run",
            "--bind",
            "0.0.0.0:5005",
            "--replay",
            "drive.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_replay_rate_requires_replay() {
        let result = Cli::try_parse_from(["carla-apollo-bridge", "run", "--replay-rate", "10"]);
        assert!(result.is_err());
    }
}
