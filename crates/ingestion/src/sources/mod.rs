//! State source implementations

mod mock;
mod replay;
mod udp;

use std::time::Duration;

use crate::error::{IngestionError, Result};

pub use mock::{MockStateConfig, MockStateSource};
pub use replay::ReplayStateSource;
pub use udp::UdpStateSource;

/// Period of one tick at `rate_hz`
///
/// Fails for rates whose period does not fit in a `Duration`.
pub(crate) fn period_from_rate(param: &str, rate_hz: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(1.0 / rate_hz).map_err(|e| {
        IngestionError::invalid_param(param, format!("no usable period for {rate_hz} Hz: {e}"))
    })
}
