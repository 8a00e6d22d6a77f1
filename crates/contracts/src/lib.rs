//! # Contracts
//!
//! Frozen interface contracts (ICD) between the simulator side and the
//! Apollo side of the bridge. All business crates depend on this crate,
//! reverse dependencies are prohibited.
//!
//! ## Time Model
//! - The simulator timestamp carried in the state line (seconds, f64) is the
//!   only clock that reaches Apollo message headers
//! - Wall-clock time only appears in `OutboundMessage::published_at`, which
//!   is transport metadata

mod apollo;
mod blueprint;
mod envelope;
mod error;
mod port;
mod sink;
mod state;

pub use apollo::*;
pub use blueprint::*;
pub use envelope::*;
pub use error::*;
pub use port::{BridgePorts, ChassisPort, Publisher};
pub use sink::*;
pub use state::*;
