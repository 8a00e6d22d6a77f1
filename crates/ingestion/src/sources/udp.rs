//! UDP state source
//!
//! One datagram carries one state line.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use crate::error::{IngestionError, Result};
use crate::sender::StateSender;
use crate::source::StateSource;

/// Largest datagram accepted
const MAX_DATAGRAM: usize = 65_536;

/// Receives state lines over UDP
pub struct UdpStateSource {
    topic: String,
    bind: SocketAddr,
    local_addr: Arc<OnceLock<SocketAddr>>,
    running: Arc<AtomicBool>,
    stop_signal: watch::Sender<bool>,
}

impl UdpStateSource {
    pub fn new(topic: impl Into<String>, bind: SocketAddr) -> Self {
        Self {
            topic: topic.into(),
            bind,
            local_addr: Arc::new(OnceLock::new()),
            running: Arc::new(AtomicBool::new(false)),
            stop_signal: watch::Sender::new(false),
        }
    }

    /// Bound address, available after `start` (resolves port 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    fn bind_socket(&self) -> Result<UdpSocket> {
        let bind_err = |source| IngestionError::Bind {
            topic: self.topic.clone(),
            addr: self.bind.to_string(),
            source,
        };
        let socket = std::net::UdpSocket::bind(self.bind).map_err(bind_err)?;
        socket.set_nonblocking(true).map_err(bind_err)?;
        UdpSocket::from_std(socket).map_err(bind_err)
    }
}

impl StateSource for UdpStateSource {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn start(&self, sender: StateSender) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(IngestionError::AlreadyRunning {
                topic: self.topic.clone(),
            });
        }

        let socket = match self.bind_socket() {
            Ok(socket) => socket,
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };
        if let Ok(addr) = socket.local_addr() {
            let _ = self.local_addr.set(addr);
        }

        info!(topic = %self.topic, addr = ?self.local_addr(), "udp state source listening");

        let running = self.running.clone();
        self.stop_signal.send_replace(false);
        let mut stop_signal = self.stop_signal.subscribe();
        let topic = self.topic.clone();

        tokio::spawn(async move {
            let mut buf = vec![0u8; MAX_DATAGRAM];

            while running.load(Ordering::Relaxed) {
                let (len, peer) = tokio::select! {
                    _ = stop_signal.wait_for(|stop| *stop) => break,
                    received = socket.recv_from(&mut buf) => match received {
                        Ok(r) => r,
                        Err(e) => {
                            warn!(topic = %topic, error = %e, "udp receive failed");
                            continue;
                        }
                    },
                };

                let payload = match std::str::from_utf8(&buf[..len]) {
                    Ok(text) => text.to_string(),
                    Err(_) => {
                        sender.metrics().record_parse_error();
                        trace!(topic = %topic, %peer, len, "non utf-8 datagram skipped");
                        continue;
                    }
                };

                if !sender.send(payload) {
                    break;
                }
            }

            running.store(false, Ordering::SeqCst);
            debug!(topic = %topic, "udp state source stopped");
        });

        Ok(())
    }

    fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            debug!(topic = %self.topic, "stopping udp state source");
            self.stop_signal.send_replace(true);
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
    use std::time::Duration;

    fn channel() -> (StateSender, async_channel::Receiver<contracts::StateMessage>) {
        let (tx, rx) = async_channel::bounded(16);
        let sender = StateSender::new(
            "/player_vehicle",
            tx,
            rx.clone(),
            DropPolicy::DropNewest,
            Arc::new(IngestionMetrics::new()),
        );
        (sender, rx)
    }

    #[tokio::test]
    async fn test_udp_source_receives_datagrams() {
        let source = UdpStateSource::new("/player_vehicle", "127.0.0.1:0".parse().unwrap());
        let (sender, rx) = channel();
        source.start(sender).unwrap();
        let addr = source.local_addr().unwrap();

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"1 2 3", addr).await.unwrap();

        let message = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.payload, "1 2 3");
        assert_eq!(message.topic, "/player_vehicle");

        source.stop();
        assert!(!source.is_running());
    }

    #[tokio::test]
    async fn test_udp_source_skips_non_utf8() {
        let source = UdpStateSource::new("/player_vehicle", "127.0.0.1:0".parse().unwrap());
        let (sender, rx) = channel();
        let metrics = sender.metrics().clone();
        source.start(sender).unwrap();
        let addr = source.local_addr().unwrap();

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(&[0xff, 0xfe, 0x00], addr).await.unwrap();
        client.send_to(b"ok", addr).await.unwrap();

        let message = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.payload, "ok");
        assert_eq!(metrics.snapshot().parse_errors, 1);

        source.stop();
    }

    #[tokio::test]
    async fn test_udp_stop_releases_idle_task() {
        for settle in [Duration::ZERO, Duration::from_millis(50)] {
            let source = UdpStateSource::new("/player_vehicle", "127.0.0.1:0".parse().unwrap());
            let (sender, rx) = channel();
            source.start(sender).unwrap();
            tokio::time::sleep(settle).await;

            source.stop();
            let closed = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("udp task kept its sender after stop");
            assert!(closed.is_err());
        }
    }

    #[tokio::test]
    async fn test_udp_source_double_start() {
        let source = UdpStateSource::new("/player_vehicle", "127.0.0.1:0".parse().unwrap());
        let (sender, _rx) = channel();
        source.start(sender.clone()).unwrap();
        assert!(matches!(
            source.start(sender),
            Err(IngestionError::AlreadyRunning { .. })
        ));
        source.stop();
    }
}
