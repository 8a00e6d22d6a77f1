//! Replay state source
//!
//! Replays a recorded text file, one state line per line. Blank lines and
//! lines starting with `#` are skipped.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{IngestionError, Result};
use crate::sender::StateSender;
use crate::source::StateSource;

use super::period_from_rate;

/// Replays recorded state lines
pub struct ReplayStateSource {
    topic: String,
    path: PathBuf,
    /// Lines per second; 0 replays as fast as the consumer drains, losslessly
    ///
    /// Only the inbound side is lossless: at 0 the bridge can outrun outbound
    /// topic workers, whose full queues drop messages.
    rate_hz: f64,
    loop_playback: bool,
    running: Arc<AtomicBool>,
}

impl ReplayStateSource {
    pub fn new(topic: impl Into<String>, path: impl Into<PathBuf>, rate_hz: f64) -> Self {
        Self {
            topic: topic.into(),
            path: path.into(),
            rate_hz,
            loop_playback: false,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Restart from the first line when the file is exhausted
    pub fn with_loop(mut self, loop_playback: bool) -> Self {
        self.loop_playback = loop_playback;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_lines(&self) -> Result<Vec<String>> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| IngestionError::ReplayRead {
                path: self.path.display().to_string(),
                source,
            })?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect())
    }
}

impl StateSource for ReplayStateSource {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn start(&self, sender: StateSender) -> Result<()> {
        let interval = if self.rate_hz > 0.0 {
            Some(period_from_rate("rate_hz", self.rate_hz)?)
        } else {
            None
        };
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(IngestionError::AlreadyRunning {
                topic: self.topic.clone(),
            });
        }

        let lines = match self.load_lines() {
            Ok(lines) => lines,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        info!(
            topic = %self.topic,
            path = %self.path.display(),
            lines = lines.len(),
            rate_hz = self.rate_hz,
            "replay state source started"
        );

        let loop_playback = self.loop_playback && !lines.is_empty();
        let running = self.running.clone();
        let topic = self.topic.clone();

        tokio::spawn(async move {
            'replay: loop {
                for line in &lines {
                    if !running.load(Ordering::Relaxed) {
                        break 'replay;
                    }

                    let delivered = match interval {
                        Some(period) => {
                            let delivered = sender.send(line.clone());
                            tokio::time::sleep(period).await;
                            delivered
                        }
                        None => sender.send_wait(line.clone()).await,
                    };
                    if !delivered {
                        break 'replay;
                    }
                }

                if !loop_playback {
                    break;
                }
            }

            running.store(false, Ordering::SeqCst);
            debug!(topic = %topic, "replay state source finished");
        });

        Ok(())
    }

    fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            debug!(topic = %self.topic, "stopping replay state source");
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DropPolicy, IngestionMetrics};
    use std::io::Write;

    fn channel(capacity: usize) -> (StateSender, async_channel::Receiver<contracts::StateMessage>) {
        let (tx, rx) = async_channel::bounded(capacity);
        let sender = StateSender::new(
            "/player_vehicle",
            tx,
            rx.clone(),
            DropPolicy::DropOldest,
            Arc::new(IngestionMetrics::new()),
        );
        (sender, rx)
    }

    #[tokio::test]
    async fn test_replay_skips_comments_and_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# recorded from Town01").unwrap();
        writeln!(file, "first line").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  second line  ").unwrap();

        let source = ReplayStateSource::new("/player_vehicle", file.path(), 0.0);
        let (sender, rx) = channel(1);
        source.start(sender).unwrap();

        assert_eq!(rx.recv().await.unwrap().payload, "first line");
        assert_eq!(rx.recv().await.unwrap().payload, "second line");
        // source task finished and dropped its sender
        assert!(rx.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_replay_missing_file() {
        let source = ReplayStateSource::new("/player_vehicle", "/nonexistent/replay.txt", 10.0);
        let (sender, _rx) = channel(1);
        let result = source.start(sender);
        assert!(matches!(result, Err(IngestionError::ReplayRead { .. })));
        assert!(!source.is_running());
    }

    #[tokio::test]
    async fn test_replay_loop_until_stopped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "only").unwrap();

        let source = ReplayStateSource::new("/player_vehicle", file.path(), 0.0).with_loop(true);
        let (sender, rx) = channel(1);
        source.start(sender).unwrap();

        for expected_sequence in 1..=3 {
            let message = rx.recv().await.unwrap();
            assert_eq!(message.payload, "only");
            assert_eq!(message.sequence, expected_sequence);
        }
        source.stop();
    }
}
