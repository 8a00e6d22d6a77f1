//! Output ports - the bridge's view of the outbound transport
//!
//! The bridge holds one port per outbound channel and knows nothing about
//! how a port delivers.

use crate::{Chassis, ContractError, CorrectedImu, GnssBestPose, GnssStatus, Gps, InsStatus};

/// Typed, fire-and-forget publisher for one topic
///
/// `publish` must not block. An `Err` means the transport refused the
/// message; the caller decides whether to carry on.
pub trait Publisher<M>: Send {
    /// Topic this publisher delivers to
    fn topic(&self) -> &str;

    /// Hand one message to the transport
    fn publish(&self, message: M) -> Result<(), ContractError>;
}

/// Externally owned chassis record plus its publisher
pub trait ChassisPort: Send {
    /// Topic the chassis record is published on
    fn topic(&self) -> &str;

    /// Mutable access to the long-lived chassis record
    fn current(&mut self) -> &mut Chassis;

    /// Publish the current chassis record
    fn publish(&mut self) -> Result<(), ContractError>;
}

/// All ports the bridge publishes through on each tick
pub struct BridgePorts {
    pub gps: Box<dyn Publisher<Gps>>,
    pub corrected_imu: Box<dyn Publisher<CorrectedImu>>,
    pub gnss_status: Box<dyn Publisher<GnssStatus>>,
    pub ins_status: Box<dyn Publisher<InsStatus>>,
    pub gnss_best_pose: Box<dyn Publisher<GnssBestPose>>,
    pub chassis: Box<dyn ChassisPort>,
}
