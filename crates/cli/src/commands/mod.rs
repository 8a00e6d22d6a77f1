//! Command implementations.

mod info;
mod run;
mod validate;

pub use info::run_info;
pub use run::run_bridge;
pub use validate::run_validate;

use std::path::Path;

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{BridgeBlueprint, SourceKind};
use ingestion::DEFAULT_UDP_BIND;
use tracing::info;

use crate::error::CliError;

/// Parse the blueprint at `path`, or the built-in defaults when none is given
///
/// Not validated yet: command-line overrides still apply.
pub(crate) fn read_blueprint(path: Option<&Path>) -> Result<BridgeBlueprint> {
    let Some(path) = path else {
        info!("No configuration file given, using built-in defaults");
        return Ok(BridgeBlueprint::default());
    };

    if !path.exists() {
        return Err(CliError::config_not_found(path).into());
    }
    info!(config = %path.display(), "Loading configuration");
    ConfigLoader::parse_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Fill runtime defaults and validate
///
/// A UDP source without a `bind` listens on the default address.
pub(crate) fn finalize_blueprint(mut blueprint: BridgeBlueprint) -> Result<BridgeBlueprint> {
    if blueprint.source.kind == SourceKind::Udp {
        blueprint
            .source
            .params
            .entry("bind".to_string())
            .or_insert_with(|| DEFAULT_UDP_BIND.to_string());
    }

    ConfigLoader::validate(&blueprint).context("Configuration validation failed")?;
    Ok(blueprint)
}

/// Outbound topics a free-running replay can overflow
///
/// An unpaced replay (`rate_hz` 0) feeds the bridge as fast as it drains, so
/// outputs with a single-slot queue drop messages whenever their sink lags.
pub(crate) fn overrun_topics(blueprint: &BridgeBlueprint) -> Vec<String> {
    let source = &blueprint.source;
    let unpaced = source.kind == SourceKind::Replay
        && source
            .params
            .get("rate_hz")
            .and_then(|rate| rate.trim().parse::<f64>().ok())
            .unwrap_or(0.0)
            == 0.0;
    if !unpaced {
        return Vec::new();
    }

    blueprint
        .resolved_outputs()
        .into_iter()
        .filter(|output| output.queue_capacity <= 1)
        .map(|output| output.topic_name().to_string())
        .collect()
}
