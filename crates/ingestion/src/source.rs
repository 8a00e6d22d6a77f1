//! State source trait

use crate::error::Result;
use crate::sender::StateSender;

/// Inbound state source
///
/// Implement this for each transport the simulator state can arrive on:
/// 1. Open the transport
/// 2. Receive one text payload per delivery
/// 3. Hand it to the `StateSender` (which applies backpressure)
pub trait StateSource: Send + Sync {
    /// Inbound topic name
    fn topic(&self) -> &str;

    /// Start delivering into `sender`
    ///
    /// Spawns the receive task on the current tokio runtime. Transport setup
    /// errors are returned synchronously.
    fn start(&self, sender: StateSender) -> Result<()>;

    /// Stop delivering
    fn stop(&self);

    /// Check if the source is running
    fn is_running(&self) -> bool;
}
