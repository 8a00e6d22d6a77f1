//! # Integration Tests
//!
//! Contract snapshots and end-to-end bridge runs (no simulator required).

#[cfg(test)]
mod contract_tests {
    use contracts::{OutputChannel, VehicleState};

    #[test]
    fn test_channel_topics_snapshot() {
        let topics: Vec<_> = OutputChannel::ALL
            .iter()
            .map(|c| c.default_topic())
            .collect();
        assert_eq!(
            topics,
            [
                "/apollo/sensor/gnss/odometry",
                "/apollo/sensor/gnss/corrected_imu",
                "/apollo/sensor/gnss/gnss_status",
                "/apollo/sensor/gnss/ins_status",
                "/apollo/sensor/gnss/best_pose",
                "/apollo/canbus/chassis",
            ]
        );
    }

    #[test]
    fn test_state_line_width() {
        assert_eq!(VehicleState::FIELD_COUNT, 18);
        assert_eq!(VehicleState::FIELD_NAMES[17], "timestamp");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{
        ApolloMessage, BridgeBlueprint, GearPosition, InsStatusType, OutboundMessage,
        OutputChannel, OutputConfig, SinkType, SourceKind,
    };
    use dispatcher::create_bridge;
    use ingestion::IngestionPipeline;
    use observability::BridgeMetricsAggregator;

    const EXAMPLE: &str = "10.0 5.0 0.0 0.0 0.0 0.0 1.0 0 0 0 1 0 0 0 0 0 2.5 100.0";
    const LATER: &str = "12.0 5.0 0.0 0.0 0.0 0.0 1.0 0 0 0 1 0 0 0 0 0 2.5 100.05";

    fn read_topic(dir: &Path, topic: &str) -> Vec<OutboundMessage> {
        let path = dir.join(dispatcher::sinks::topic_file_name(topic));
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn replay_config(state_file: &Path, out_dir: &Path) -> String {
        let mut config = format!(
            r#"
[source]
kind = "replay"
queue_capacity = 64
[source.params]
path = "{}"
"#,
            state_file.display()
        );
        for channel in OutputChannel::ALL {
            config.push_str(&format!(
                r#"
[[outputs]]
channel = "{channel}"
sink_type = "file"
queue_capacity = 16
[outputs.params]
base_path = "{}"
"#,
                out_dir.display()
            ));
        }
        config
    }

    /// Replay file -> Bridge -> JSON Lines file sinks
    #[tokio::test]
    async fn test_e2e_replay_to_file_sinks() {
        let out_dir = tempfile::tempdir().unwrap();
        let mut state_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(state_file, "{EXAMPLE}").unwrap();
        writeln!(state_file, "1.0 2.0 three").unwrap();
        writeln!(state_file, "{LATER}").unwrap();

        let blueprint = ConfigLoader::load_from_str(
            &replay_config(state_file.path(), out_dir.path()),
            ConfigFormat::Toml,
        )
        .unwrap();

        let (mut bridge, outputs) = create_bridge(&blueprint).await.unwrap();
        let mut ingestion = IngestionPipeline::from_config(&blueprint.source).unwrap();
        let rx = ingestion.take_receiver().unwrap();
        ingestion.start().unwrap();

        let stats = tokio::time::timeout(Duration::from_secs(5), bridge.run(rx))
            .await
            .expect("bridge did not finish");
        assert_eq!(stats.received, 3);
        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.decode_errors, 1);
        assert_eq!(stats.publish_failures, 0);

        drop(bridge);
        let reports = outputs.shutdown().await;
        assert!(reports.iter().all(|r| r.metrics.written == 2));

        let odometry = read_topic(out_dir.path(), "/apollo/sensor/gnss/odometry");
        assert_eq!(odometry.len(), 2);
        assert_eq!(odometry[0].sequence, 1);
        assert_eq!(odometry[1].sequence, 2);
        let ApolloMessage::Gps(gps) = &odometry[0].message else {
            panic!("expected gps, got {:?}", odometry[0].message);
        };
        assert_eq!(gps.header.timestamp_sec, Some(100.0));
        assert_eq!(gps.header.module_name, dispatcher::MODULE_NAME);
        let p = gps.localization.position;
        assert!((p.x - 10.0).abs() < 1e-9);
        assert!((p.y - 187.5).abs() < 1e-9);
        assert!(p.z.abs() < 1e-9);
        let q = gps.localization.orientation;
        let half = std::f64::consts::FRAC_1_SQRT_2;
        assert!((q.qz + half).abs() < 1e-9);
        assert!((q.qw - half).abs() < 1e-9);

        let imu = read_topic(out_dir.path(), "/apollo/sensor/gnss/corrected_imu");
        let ApolloMessage::CorrectedImu(imu) = &imu[1].message else {
            panic!("expected corrected imu");
        };
        assert_eq!(imu.header.timestamp_sec, Some(100.05));
        assert!((imu.imu.position.x - 12.0).abs() < 1e-9);

        let gnss_status = read_topic(out_dir.path(), "/apollo/sensor/gnss/gnss_status");
        let ApolloMessage::GnssStatus(status) = &gnss_status[0].message else {
            panic!("expected gnss status");
        };
        assert!(status.solution_completed);
        assert_eq!(status.header.timestamp_sec, None);

        let ins_status = read_topic(out_dir.path(), "/apollo/sensor/gnss/ins_status");
        let ApolloMessage::InsStatus(ins) = &ins_status[0].message else {
            panic!("expected ins status");
        };
        assert_eq!(ins.status_type, InsStatusType::Good);

        let best_pose = read_topic(out_dir.path(), "/apollo/sensor/gnss/best_pose");
        let ApolloMessage::GnssBestPose(best_pose) = &best_pose[0].message else {
            panic!("expected best pose");
        };
        assert_eq!(best_pose.measurement_time, 3.0);

        let chassis = read_topic(out_dir.path(), "/apollo/canbus/chassis");
        assert_eq!(chassis.len(), 2);
        let ApolloMessage::Chassis(chassis) = &chassis[1].message else {
            panic!("expected chassis");
        };
        assert_eq!(chassis.speed_mps, 2.5);
        assert_eq!(chassis.gear_location, GearPosition::Drive);
        assert!(chassis.engine_started);
    }

    /// Mock source -> Bridge, with the run summary aggregated from tick reports
    #[tokio::test]
    async fn test_e2e_mock_circle() {
        let mut blueprint = BridgeBlueprint::default();
        blueprint.source.kind = SourceKind::Mock;
        blueprint.source.queue_capacity = 64;
        blueprint.source.params = HashMap::from([
            ("frequency_hz".to_string(), "100".to_string()),
            ("radius_m".to_string(), "30".to_string()),
            ("speed_mps".to_string(), "6".to_string()),
            ("max_ticks".to_string(), "10".to_string()),
        ]);
        blueprint.outputs = OutputChannel::ALL
            .iter()
            .map(|&channel| OutputConfig {
                queue_capacity: 32,
                ..OutputConfig::log(channel)
            })
            .collect();
        ConfigLoader::validate(&blueprint).unwrap();

        let (mut bridge, outputs) = create_bridge(&blueprint).await.unwrap();
        let mut ingestion = IngestionPipeline::from_config(&blueprint.source).unwrap();
        let rx = ingestion.take_receiver().unwrap();
        ingestion.start().unwrap();

        let mut aggregator = BridgeMetricsAggregator::new();
        let collect = async {
            while let Ok(message) = rx.recv().await {
                let report = bridge.on_message(&message.payload).unwrap();
                aggregator.record_tick(report.timestamp_sec, report.forward_speed);
                for outcome in &report.outcomes {
                    aggregator.record_publish(&outcome.topic, outcome.is_ok());
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), collect)
            .await
            .expect("mock source did not finish");

        let summary = aggregator.summary();
        assert_eq!(summary.total_ticks, 10);
        assert_eq!(summary.messages_published, 60);
        assert_eq!(summary.non_monotonic_ticks, 0);
        assert!((summary.forward_speed_mps.mean - 6.0).abs() < 1e-9);
        assert!((summary.tick_interval_ms.mean - 10.0).abs() < 1e-6);

        drop(bridge);
        outputs.shutdown().await;
    }

    /// One tick delivered as a JSON datagram to a network sink
    #[tokio::test]
    async fn test_e2e_network_sink() {
        let receiver = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = receiver.local_addr().unwrap();

        let blueprint = BridgeBlueprint {
            outputs: vec![OutputConfig {
                channel: OutputChannel::GpsOdometry,
                topic: Some("/bridge/odometry".to_string()),
                sink_type: SinkType::Network,
                queue_capacity: 4,
                params: HashMap::from([("addr".to_string(), addr.to_string())]),
            }],
            ..Default::default()
        };

        let (mut bridge, outputs) = create_bridge(&blueprint).await.unwrap();
        bridge.on_message(EXAMPLE).unwrap();

        let mut buf = vec![0u8; 65536];
        let len = tokio::time::timeout(Duration::from_secs(2), receiver.recv(&mut buf))
            .await
            .expect("no datagram received")
            .unwrap();
        let received: OutboundMessage = serde_json::from_slice(&buf[..len]).unwrap();
        assert_eq!(received.topic, "/bridge/odometry");
        assert_eq!(received.sequence, 1);
        assert_eq!(received.message.timestamp_sec(), Some(100.0));

        drop(bridge);
        outputs.shutdown().await;
    }
}
