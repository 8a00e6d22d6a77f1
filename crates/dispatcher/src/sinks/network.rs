//! NetworkSink - UDP fire-and-forget streaming

use contracts::{ContractError, DataSink, OutboundMessage};
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tracing::{debug, instrument, trace, warn};

/// Serialization format for network transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkFormat {
    /// JSON (human-readable, larger)
    #[default]
    Json,
    /// Bincode (binary, compact)
    Bincode,
}

/// Configuration for NetworkSink
#[derive(Debug, Clone)]
pub struct NetworkSinkConfig {
    /// Target address
    pub addr: SocketAddr,
    /// Serialization format
    pub format: NetworkFormat,
    /// Max datagram size; larger messages are dropped
    pub max_packet_size: usize,
}

impl NetworkSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let addr_str = params
            .get("addr")
            .ok_or_else(|| "missing 'addr' parameter".to_string())?;

        let addr: SocketAddr = addr_str
            .parse()
            .map_err(|e| format!("invalid address '{addr_str}': {e}"))?;

        let format = match params.get("format").map(String::as_str) {
            Some("bincode") => NetworkFormat::Bincode,
            Some("json") | None => NetworkFormat::Json,
            Some(other) => return Err(format!("unknown format '{other}'")),
        };

        let max_packet_size = match params.get("max_packet_size") {
            Some(s) => s
                .parse()
                .map_err(|e| format!("invalid max_packet_size '{s}': {e}"))?,
            None => 65_000,
        };

        Ok(Self {
            addr,
            format,
            max_packet_size,
        })
    }
}

/// Sink that sends each message as one UDP datagram
pub struct NetworkSink {
    name: String,
    config: NetworkSinkConfig,
    socket: Option<UdpSocket>,
}

impl NetworkSink {
    /// Create a new NetworkSink
    #[instrument(name = "network_sink_new", skip(name, config), fields(target = %config.addr))]
    pub async fn new(name: impl Into<String>, config: NetworkSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        let bind: SocketAddr = if config.addr.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(config.addr).await?;

        debug!(sink = %name, target = %config.addr, "NetworkSink connected");

        Ok(Self {
            name,
            config,
            socket: Some(socket),
        })
    }

    /// Create from params (for factory)
    pub async fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let config = NetworkSinkConfig::from_params(params)
            .map_err(|e| ContractError::sink_write(&name, e))?;

        Self::new(name.clone(), config)
            .await
            .map_err(|e| ContractError::SinkConnection {
                sink_name: name,
                message: e.to_string(),
            })
    }

    fn encode(&self, message: &OutboundMessage) -> Result<Vec<u8>, ContractError> {
        let data = match self.config.format {
            NetworkFormat::Json => serde_json::to_vec(message)
                .map_err(|e| ContractError::sink_write(&self.name, format!("json error: {e}")))?,
            NetworkFormat::Bincode => bincode::serialize(message)
                .map_err(|e| ContractError::sink_write(&self.name, format!("bincode error: {e}")))?,
        };

        if data.len() > self.config.max_packet_size {
            warn!(
                sink = %self.name,
                size = data.len(),
                max = self.config.max_packet_size,
                "packet too large, dropped"
            );
            return Err(ContractError::sink_write(
                &self.name,
                format!("packet of {} bytes exceeds limit", data.len()),
            ));
        }

        Ok(data)
    }
}

impl DataSink for NetworkSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "network_sink_write",
        skip(self, message),
        fields(sink = %self.name, sequence = message.sequence)
    )]
    async fn write(&mut self, message: &OutboundMessage) -> Result<(), ContractError> {
        let data = self.encode(message)?;
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| ContractError::sink_write(&self.name, "socket not connected"))?;

        match socket.send(&data).await {
            Ok(sent) => trace!(sink = %self.name, bytes = sent, "sent"),
            // UDP is best effort; a refused datagram is not a sink failure
            Err(e) => debug!(sink = %self.name, error = %e, "udp send failed"),
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "network_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.socket = None;
        debug!(sink = %self.name, "NetworkSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::{ApolloMessage, InsStatus, InsStatusType};
    use std::time::Duration;

    fn ins_status() -> OutboundMessage {
        OutboundMessage {
            topic: "/apollo/sensor/gnss/ins_status".to_string(),
            sequence: 4,
            published_at: Utc::now(),
            message: InsStatus {
                status_type: InsStatusType::Good,
                ..Default::default()
            }
            .into(),
        }
    }

    #[test]
    fn test_network_sink_config_parsing() {
        let mut params = HashMap::new();
        params.insert("addr".to_string(), "127.0.0.1:9999".to_string());
        params.insert("format".to_string(), "bincode".to_string());

        let config = NetworkSinkConfig::from_params(&params).unwrap();
        assert_eq!(config.addr.port(), 9999);
        assert_eq!(config.format, NetworkFormat::Bincode);
        assert_eq!(config.max_packet_size, 65_000);

        params.insert("format".to_string(), "xml".to_string());
        assert!(NetworkSinkConfig::from_params(&params).is_err());
        assert!(NetworkSinkConfig::from_params(&HashMap::new()).is_err());
    }

    #[tokio::test]
    async fn test_network_sink_delivers_json() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = NetworkSinkConfig {
            addr: receiver.local_addr().unwrap(),
            format: NetworkFormat::Json,
            max_packet_size: 65_000,
        };

        let mut sink = NetworkSink::new("test_net", config).await.unwrap();
        sink.write(&ins_status()).await.unwrap();

        let mut buf = vec![0u8; 65_536];
        let len = tokio::time::timeout(Duration::from_secs(2), receiver.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let received: OutboundMessage = serde_json::from_slice(&buf[..len]).unwrap();
        assert_eq!(received.sequence, 4);
        assert!(matches!(
            received.message,
            ApolloMessage::InsStatus(ref s) if s.status_type.code() == 2
        ));
    }

    #[tokio::test]
    async fn test_oversized_packet_rejected() {
        let config = NetworkSinkConfig {
            addr: "127.0.0.1:19998".parse().unwrap(),
            format: NetworkFormat::Json,
            max_packet_size: 8,
        };
        let mut sink = NetworkSink::new("tiny", config).await.unwrap();
        assert!(matches!(
            sink.write(&ins_status()).await,
            Err(ContractError::SinkWrite { .. })
        ));
    }
}
