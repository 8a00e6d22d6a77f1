//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{BridgeBlueprint, SinkType, SourceKind};
use serde::Serialize;
use tracing::info;

use super::overrun_topics;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    source_kind: String,
    source_topic: String,
    routed_outputs: usize,
    file_outputs: usize,
    network_outputs: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: Vec::new(),
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let count =
                |sink: SinkType| blueprint.outputs.iter().filter(|o| o.sink_type == sink).count();
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: collect_warnings(&blueprint),
                summary: Some(ConfigSummary {
                    source_kind: format!("{:?}", blueprint.source.kind),
                    source_topic: blueprint.source.topic.clone(),
                    routed_outputs: blueprint.outputs.len(),
                    file_outputs: count(SinkType::File),
                    network_outputs: count(SinkType::Network),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: Vec::new(),
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &BridgeBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.outputs.is_empty() {
        warnings.push("No outputs routed - every channel only logs".to_string());
    }

    if blueprint.source.kind == SourceKind::Mock {
        warnings.push("Mock source - states are synthetic".to_string());
    }

    let overrun = overrun_topics(blueprint);
    if !overrun.is_empty() {
        warnings.push(format!(
            "Unpaced replay with single-slot output queues ({}) - set rate_hz or raise queue_capacity to avoid drops",
            overrun.join(", ")
        ));
    }

    let frames = &blueprint.frames;
    if frames.heading_offset_deg != contracts::HEADING_ZERO_OFFSET_DEG
        || frames.northing_offset_m != contracts::MAP_NORTHING_OFFSET_M
    {
        warnings.push(format!(
            "Non-default frame offsets (heading -{} deg, northing +{} m)",
            frames.heading_offset_deg, frames.northing_offset_m
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Source: {} ({})", summary.source_topic, summary.source_kind);
            println!("  Routed outputs: {}", summary.routed_outputs);
            println!("  File outputs: {}", summary.file_outputs);
            println!("  Network outputs: {}", summary.network_outputs);
        }

        if !result.warnings.is_empty() {
            println!("\n⚠ Warnings:");
            for warning in &result.warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn args(path: PathBuf) -> ValidateArgs {
        ValidateArgs {
            config: path,
            json: true,
        }
    }

    #[test]
    fn test_valid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[source]\nkind = \"mock\"").unwrap();

        let result = validate_config(&args(file.path().to_path_buf()));
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.summary.unwrap().source_kind, "Mock");
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[source]\nkind = \"replay\"").unwrap();

        let result = validate_config(&args(file.path().to_path_buf()));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("source.params.path"));
    }

    #[test]
    fn test_unpaced_replay_warning() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[source]\nkind = \"replay\"\n[source.params]\npath = \"drive.txt\"").unwrap();

        let result = validate_config(&args(file.path().to_path_buf()));
        assert!(result.valid);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.starts_with("Unpaced replay") && w.contains("/apollo/canbus/chassis")));
    }

    #[test]
    fn test_missing_file() {
        let result = validate_config(&args(PathBuf::from("/nonexistent/bridge.toml")));
        assert!(!result.valid);
        assert!(run_validate(&args(PathBuf::from("/nonexistent/bridge.toml"))).is_err());
    }
}
