//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::BridgeBlueprint;
use serde::Serialize;

use super::{finalize_blueprint, read_blueprint};
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    source: SourceInfo,
    heading_offset_deg: f64,
    northing_offset_m: f64,
    ins_status_type: String,
    gnss_best_pose_measurement_time: f64,
    chassis_gear: String,
    outputs: Vec<OutputInfo>,
}

#[derive(Serialize)]
struct SourceInfo {
    kind: String,
    topic: String,
    queue_capacity: usize,
    drop_policy: String,
    params: BTreeMap<String, String>,
}

#[derive(Serialize)]
struct OutputInfo {
    channel: String,
    topic: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let blueprint = finalize_blueprint(read_blueprint(args.config.as_deref())?)?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &BridgeBlueprint, args: &InfoArgs) -> ConfigInfo {
    let outputs = blueprint
        .resolved_outputs()
        .into_iter()
        .map(|output| OutputInfo {
            channel: output.channel.to_string(),
            topic: output.topic_name().to_string(),
            sink_type: format!("{:?}", output.sink_type),
            queue_capacity: output.queue_capacity,
            params: if args.outputs {
                output.params.into_iter().collect()
            } else {
                BTreeMap::new()
            },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        source: SourceInfo {
            kind: format!("{:?}", blueprint.source.kind),
            topic: blueprint.source.topic.clone(),
            queue_capacity: blueprint.source.queue_capacity,
            drop_policy: format!("{:?}", blueprint.source.drop_policy),
            params: blueprint.source.params.clone().into_iter().collect(),
        },
        heading_offset_deg: blueprint.frames.heading_offset_deg,
        northing_offset_m: blueprint.frames.northing_offset_m,
        ins_status_type: format!("{:?}", blueprint.status.ins_status_type),
        gnss_best_pose_measurement_time: blueprint.status.gnss_best_pose_measurement_time,
        chassis_gear: format!("{:?}", blueprint.status.chassis_gear),
        outputs,
    }
}

fn print_config_info(blueprint: &BridgeBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               CARLA Apollo Bridge Configuration              ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let source = &blueprint.source;
    println!("📥 Source");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Kind: {:?}", source.kind);
    println!("   ├─ Topic: {}", source.topic);
    println!(
        "   └─ Queue: {} ({:?})",
        source.queue_capacity, source.drop_policy
    );

    println!("\n🧭 Frames");
    println!(
        "   ├─ Heading offset: -{} deg",
        blueprint.frames.heading_offset_deg
    );
    println!(
        "   └─ Northing offset: +{} m",
        blueprint.frames.northing_offset_m
    );

    let status = &blueprint.status;
    println!("\n⚙️  Status");
    println!("   ├─ INS status: {:?}", status.ins_status_type);
    println!(
        "   ├─ Best pose measurement time: {}",
        status.gnss_best_pose_measurement_time
    );
    println!("   └─ Chassis gear: {:?}", status.chassis_gear);

    let outputs = blueprint.resolved_outputs();
    println!("\n📤 Outputs ({})", outputs.len());
    for (i, output) in outputs.iter().enumerate() {
        let is_last = i == outputs.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} -> {} ({:?})",
            prefix,
            output.channel,
            output.topic_name(),
            output.sink_type
        );

        if args.outputs {
            let params: BTreeMap<_, _> = output.params.iter().collect();
            for (key, value) in params {
                println!("   {}     {} = {}", child_prefix, key, value);
            }
        }
    }

    println!();
}
