//! # Ingestion Pipeline
//!
//! Inbound state transport.
//!
//! Responsibilities:
//! - Receive simulator state lines from a `StateSource` (UDP / replay / mock)
//! - Wrap each delivery in a `StateMessage`
//! - Backpressure management and drop policy
//! - Send to downstream via async-channel
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionPipeline, BackpressureConfig, UdpStateSource};
//!
//! let source = UdpStateSource::new("/player_vehicle", "0.0.0.0:5005".parse()?);
//! let mut pipeline = IngestionPipeline::new(Box::new(source), BackpressureConfig::default());
//!
//! let rx = pipeline.take_receiver().unwrap();
//! pipeline.start()?;
//! while let Ok(message) = rx.recv().await {
//!     // Decode and translate
//! }
//! ```

mod config;
mod error;
mod pipeline;
mod sender;
mod source;
mod sources;

// Re-exports
pub use config::{BackpressureConfig, DropPolicy, IngestionMetrics, MetricsSnapshot};
pub use contracts::StateMessage;
pub use error::{IngestionError, Result};
pub use pipeline::{build_source, IngestionPipeline, DEFAULT_UDP_BIND};
pub use sender::StateSender;
pub use source::StateSource;
pub use sources::{MockStateConfig, MockStateSource, ReplayStateSource, UdpStateSource};
