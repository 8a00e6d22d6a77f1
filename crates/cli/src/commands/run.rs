//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{BridgeBlueprint, SourceKind};
use std::time::Duration;
use tracing::{info, warn};

use super::{finalize_blueprint, overrun_topics, read_blueprint};
use crate::cli::{RunArgs, SourceArg};
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_bridge(args: &RunArgs) -> Result<()> {
    let mut blueprint = read_blueprint(args.config.as_deref())?;
    apply_overrides(&mut blueprint, args)?;
    let blueprint = finalize_blueprint(blueprint)?;

    info!(
        source = ?blueprint.source.kind,
        topic = %blueprint.source.topic,
        outputs = blueprint.outputs.len(),
        "Configuration loaded"
    );
    let overrun = overrun_topics(&blueprint);
    if !overrun.is_empty() {
        warn!(
            topics = ?overrun,
            "Unpaced replay into single-slot output queues; lagging sinks will drop messages"
        );
    }

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        max_ticks: (args.max_ticks > 0).then_some(args.max_ticks),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting bridge...");
    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Bridge execution failed")?;

    info!(
        ticks = stats.bridge.ticks,
        decode_errors = stats.bridge.decode_errors,
        published = stats.bridge.published,
        duration_secs = stats.duration.as_secs_f64(),
        rate_hz = format!("{:.2}", stats.tick_rate()),
        stop_reason = %stats.stop_reason,
        "Bridge completed"
    );
    stats.print_summary();

    info!("CARLA Apollo Bridge finished");
    Ok(())
}

/// Apply command-line source overrides
fn apply_overrides(blueprint: &mut BridgeBlueprint, args: &RunArgs) -> Result<(), CliError> {
    let source = &mut blueprint.source;

    if let Some(kind) = args.source {
        info!(source = ?kind, "Overriding source kind from CLI");
        source.kind = kind.into();
    }

    if let Some(ref bind) = args.bind {
        if args.source.is_some_and(|kind| kind != SourceArg::Udp) {
            return Err(CliError::invalid_override(
                "bind",
                "only applies to a udp source",
            ));
        }
        info!(bind = %bind, "Overriding UDP bind address from CLI");
        source.kind = SourceKind::Udp;
        source.params.insert("bind".to_string(), bind.clone());
    }

    if let Some(ref path) = args.replay {
        if args.source.is_some_and(|kind| kind != SourceArg::Replay) {
            return Err(CliError::invalid_override(
                "replay",
                "only applies to a replay source",
            ));
        }
        info!(path = %path.display(), "Replaying state file from CLI");
        source.kind = SourceKind::Replay;
        source
            .params
            .insert("path".to_string(), path.display().to_string());
        if let Some(rate) = args.replay_rate {
            source.params.insert("rate_hz".to_string(), rate.to_string());
        }
        if args.replay_loop {
            source.params.insert("loop".to_string(), "true".to_string());
        }
    }

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping bridge...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &BridgeBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Source:");
    println!("  Kind: {:?}", blueprint.source.kind);
    println!("  Topic: {}", blueprint.source.topic);
    let mut params: Vec<_> = blueprint.source.params.iter().collect();
    params.sort();
    for (key, value) in params {
        println!("  {key}: {value}");
    }

    println!("\nFrames:");
    println!(
        "  Heading offset: -{} deg",
        blueprint.frames.heading_offset_deg
    );
    println!("  Northing offset: +{} m", blueprint.frames.northing_offset_m);

    println!("\nOutputs:");
    for output in blueprint.resolved_outputs() {
        println!(
            "  - {} -> {} ({:?})",
            output.channel,
            output.topic_name(),
            output.sink_type
        );
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["run"];
        argv.extend_from_slice(extra);
        RunArgs::parse_from(argv)
    }

    #[test]
    fn test_replay_override() {
        let mut blueprint = BridgeBlueprint::default();
        let args = run_args(&["--replay", "drive.txt", "--replay-rate", "20", "--replay-loop"]);
        apply_overrides(&mut blueprint, &args).unwrap();

        assert_eq!(blueprint.source.kind, SourceKind::Replay);
        assert_eq!(blueprint.source.params["path"], "drive.txt");
        assert_eq!(blueprint.source.params["rate_hz"], "20");
        assert_eq!(blueprint.source.params["loop"], "true");
        assert!(finalize_blueprint(blueprint).is_ok());
    }

    #[test]
    fn test_unusable_replay_rate_rejected() {
        let mut blueprint = BridgeBlueprint::default();
        let args = run_args(&["--replay", "drive.txt", "--replay-rate", "1e-20"]);
        apply_overrides(&mut blueprint, &args).unwrap();
        let err = finalize_blueprint(blueprint).unwrap_err();
        assert!(format!("{err:#}").contains("rate_hz"), "got: {err:#}");
    }

    #[test]
    fn test_bind_override() {
        let mut blueprint = BridgeBlueprint::default();
        blueprint.source.kind = SourceKind::Mock;
        let args = run_args(&["--bind", "127.0.0.1:6000"]);
        apply_overrides(&mut blueprint, &args).unwrap();

        assert_eq!(blueprint.source.kind, SourceKind::Udp);
        assert_eq!(blueprint.source.params["bind"], "127.0.0.1:6000");
    }

    #[test]
    fn test_conflicting_source_override() {
        let mut blueprint = BridgeBlueprint::default();
        let args = run_args(&["--source", "mock", "--replay", "drive.txt"]);
        let err = apply_overrides(&mut blueprint, &args).unwrap_err();
        assert!(err.to_string().contains("--replay"));
    }

    #[test]
    fn test_source_override_only() {
        let mut blueprint = BridgeBlueprint::default();
        let args = run_args(&["--source", "mock"]);
        apply_overrides(&mut blueprint, &args).unwrap();
        assert_eq!(blueprint.source.kind, SourceKind::Mock);
    }
}
