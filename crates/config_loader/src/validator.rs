//! Config validation
//!
//! Rules:
//! - source topic non-empty, queue capacity > 0
//! - source params required by the source kind are present and well-formed
//! - frame offsets finite
//! - best-pose measurement time finite and >= 0
//! - one route per output channel, topics unique and non-empty
//! - output queue capacity > 0, network outputs name an `addr`

use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::Duration;

use contracts::{BridgeBlueprint, ContractError, SinkType, SourceKind};

/// Validate a BridgeBlueprint
///
/// Returns the first error found.
pub fn validate(blueprint: &BridgeBlueprint) -> Result<(), ContractError> {
    validate_source(blueprint)?;
    validate_frames(blueprint)?;
    validate_status(blueprint)?;
    validate_outputs(blueprint)?;
    Ok(())
}

fn validate_source(blueprint: &BridgeBlueprint) -> Result<(), ContractError> {
    let source = &blueprint.source;

    if source.topic.trim().is_empty() {
        return Err(ContractError::config_validation(
            "source.topic",
            "topic cannot be empty",
        ));
    }
    if source.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "source.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }

    let param = |key: &str| source.params.get(key).map(|v| v.trim());

    match source.kind {
        SourceKind::Udp => {
            let bind = param("bind").ok_or_else(|| {
                ContractError::config_validation("source.params.bind", "required for udp source")
            })?;
            bind.parse::<SocketAddr>().map_err(|e| {
                ContractError::config_validation(
                    "source.params.bind",
                    format!("invalid address '{bind}': {e}"),
                )
            })?;
        }
        SourceKind::Replay => {
            match param("path") {
                Some(path) if !path.is_empty() => {}
                _ => {
                    return Err(ContractError::config_validation(
                        "source.params.path",
                        "required for replay source",
                    ))
                }
            }
            if let Some(rate) = param("rate_hz") {
                match rate.parse::<f64>() {
                    Ok(r) if r == 0.0 || (r > 0.0 && has_period(r)) => {}
                    _ => {
                        return Err(ContractError::config_validation(
                            "source.params.rate_hz",
                            format!("rate_hz must be 0 or a usable positive rate, got '{rate}'"),
                        ))
                    }
                }
            }
        }
        SourceKind::Mock => {
            if let Some(freq) = param("frequency_hz") {
                match freq.parse::<f64>() {
                    Ok(f) if f > 0.0 && has_period(f) => {}
                    _ => {
                        return Err(ContractError::config_validation(
                            "source.params.frequency_hz",
                            format!("frequency_hz must be > 0, got '{freq}'"),
                        ))
                    }
                }
            }
        }
    }

    Ok(())
}

/// Whether one tick at `rate_hz` lasts a representable `Duration`
fn has_period(rate_hz: f64) -> bool {
    rate_hz.is_finite() && Duration::try_from_secs_f64(1.0 / rate_hz).is_ok()
}

fn validate_frames(blueprint: &BridgeBlueprint) -> Result<(), ContractError> {
    let frames = &blueprint.frames;
    if !frames.heading_offset_deg.is_finite() {
        return Err(ContractError::config_validation(
            "frames.heading_offset_deg",
            format!("must be finite, got {}", frames.heading_offset_deg),
        ));
    }
    if !frames.northing_offset_m.is_finite() {
        return Err(ContractError::config_validation(
            "frames.northing_offset_m",
            format!("must be finite, got {}", frames.northing_offset_m),
        ));
    }
    Ok(())
}

fn validate_status(blueprint: &BridgeBlueprint) -> Result<(), ContractError> {
    let t = blueprint.status.gnss_best_pose_measurement_time;
    if !t.is_finite() || t < 0.0 {
        return Err(ContractError::config_validation(
            "status.gnss_best_pose_measurement_time",
            format!("must be finite and >= 0, got {t}"),
        ));
    }
    Ok(())
}

fn validate_outputs(blueprint: &BridgeBlueprint) -> Result<(), ContractError> {
    let mut channels = HashSet::new();
    for (idx, output) in blueprint.outputs.iter().enumerate() {
        if !channels.insert(output.channel) {
            return Err(ContractError::config_validation(
                format!("outputs[{idx}].channel"),
                format!("duplicate channel '{}'", output.channel),
            ));
        }
        if output.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("outputs[{idx}].queue_capacity"),
                "queue_capacity must be > 0",
            ));
        }
        if output.sink_type == SinkType::Network && !output.params.contains_key("addr") {
            return Err(ContractError::config_validation(
                format!("outputs[{idx}].params.addr"),
                "required for network sink",
            ));
        }
    }

    // Topics are checked after defaults are applied
    let mut topics = HashSet::new();
    for output in blueprint.resolved_outputs() {
        let topic = output.topic_name();
        if topic.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("outputs[channel={}].topic", output.channel),
                "topic cannot be empty",
            ));
        }
        if !topics.insert(topic.to_string()) {
            return Err(ContractError::config_validation(
                format!("outputs[channel={}].topic", output.channel),
                format!("duplicate topic '{topic}'"),
            ));
        }
    }

    Ok(())
}
