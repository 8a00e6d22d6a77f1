//! FileSink - JSON Lines, one file per topic

use contracts::{ContractError, DataSink, OutboundMessage};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Output directory
    pub base_path: PathBuf,
    /// Append to existing files instead of truncating them
    pub append: bool,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));
        let append = params
            .get("append")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Self { base_path, append }
    }
}

/// File name a topic is written to, e.g.
/// `/apollo/sensor/gnss/odometry` -> `apollo_sensor_gnss_odometry.jsonl`
pub fn topic_file_name(topic: &str) -> String {
    let stem: String = topic
        .trim_matches('/')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "root.jsonl".to_string()
    } else {
        format!("{stem}.jsonl")
    }
}

/// Sink that appends each message as one JSON line
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    writers: HashMap<String, BufWriter<File>>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
            writers: HashMap::new(),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        Self::new(name, FileSinkConfig::from_params(params))
    }

    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    fn writer(&mut self, topic: &str) -> std::io::Result<&mut BufWriter<File>> {
        if !self.writers.contains_key(topic) {
            let path = self.config.base_path.join(topic_file_name(topic));
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .append(self.config.append)
                .truncate(!self.config.append)
                .open(&path)?;
            debug!(sink = %self.name, path = %path.display(), "opened topic file");
            self.writers
                .insert(topic.to_string(), BufWriter::new(file));
        }
        self.writers
            .get_mut(topic)
            .ok_or_else(|| std::io::Error::other("topic writer missing"))
    }

    fn append_line(&mut self, message: &OutboundMessage) -> std::io::Result<()> {
        let line = serde_json::to_string(message)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let writer = self.writer(&message.topic)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, message),
        fields(sink = %self.name, sequence = message.sequence)
    )]
    async fn write(&mut self, message: &OutboundMessage) -> Result<(), ContractError> {
        self.append_line(message).map_err(|e| {
            error!(sink = %self.name, topic = %message.topic, error = %e, "write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        for writer in self.writers.values_mut() {
            writer
                .flush()
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        }
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush().await?;
        self.writers.clear();
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{ApolloMessage, GnssBestPose};
    use tempfile::tempdir;

    fn best_pose(sequence: u64) -> OutboundMessage {
        OutboundMessage {
            topic: "/apollo/sensor/gnss/best_pose".to_string(),
            sequence,
            published_at: Utc::now(),
            message: GnssBestPose {
                measurement_time: 3.0,
                ..Default::default()
            }
            .into(),
        }
    }

    #[test]
    fn test_topic_file_name() {
        assert_eq!(
            topic_file_name("/apollo/sensor/gnss/odometry"),
            "apollo_sensor_gnss_odometry.jsonl"
        );
        assert_eq!(topic_file_name("/"), "root.jsonl");
    }

    #[tokio::test]
    async fn test_file_sink_writes_json_lines() {
        let dir = tempdir().unwrap();
        let mut params = HashMap::new();
        params.insert("base_path".to_string(), dir.path().display().to_string());

        let mut sink = FileSink::from_params("test_file", &params).unwrap();
        sink.write(&best_pose(1)).await.unwrap();
        sink.write(&best_pose(2)).await.unwrap();
        sink.close().await.unwrap();

        let content =
            fs::read_to_string(dir.path().join("apollo_sensor_gnss_best_pose.jsonl")).unwrap();
        let lines: Vec<OutboundMessage> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].sequence, 2);
        assert!(matches!(
            lines[0].message,
            ApolloMessage::GnssBestPose(ref p) if p.measurement_time == 3.0
        ));
    }
}
