//! Bridge - decode, translate and fan out one state line per tick

use contracts::{
    BridgePorts, ContractError, CorrectedImu, EulerAngles, GnssBestPose, GnssStatus, Gps, Header,
    InsStatus, OutputChannel, StateMessage, StatusConfig,
};
use tracing::{debug, info, instrument, warn};
use translator::Translator;

use crate::error::BridgeError;

/// `module_name` stamped into every published header
pub const MODULE_NAME: &str = "carla_apollo_bridge";

/// Outcome of one port publish
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutcome {
    pub channel: OutputChannel,
    pub topic: String,
    /// Transport error text, if the publish was refused
    pub error: Option<String>,
}

impl PublishOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// What one successfully decoded tick did
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Simulation timestamp of the state (index 17)
    pub timestamp_sec: f64,

    /// Forward speed written to the chassis
    pub forward_speed: f64,

    /// Apollo-frame Euler angles (degrees)
    pub euler: EulerAngles,

    /// One entry per port, in publish order
    pub outcomes: Vec<PublishOutcome>,
}

impl TickReport {
    pub fn published(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.published()
    }
}

/// Running totals over the bridge's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Inbound messages handled
    pub received: u64,
    /// Ticks that decoded and fanned out
    pub ticks: u64,
    /// Ticks dropped as malformed
    pub decode_errors: u64,
    /// Messages handed to the transport
    pub published: u64,
    /// Messages the transport refused
    pub publish_failures: u64,
}

/// The state-to-Apollo bridge
///
/// Ticks take `&mut self`: the chassis record is only ever touched by one
/// caller at a time.
pub struct Bridge {
    translator: Translator,
    ports: BridgePorts,
    status: StatusConfig,
    stats: BridgeStats,
}

impl Bridge {
    pub fn new(translator: Translator, ports: BridgePorts, status: StatusConfig) -> Self {
        Self {
            translator,
            ports,
            status,
            stats: BridgeStats::default(),
        }
    }

    pub fn stats(&self) -> BridgeStats {
        self.stats
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Handle one inbound payload
    ///
    /// A malformed payload publishes nothing and leaves the chassis record
    /// untouched. A refused publish is logged and reported; the remaining
    /// ports still publish.
    pub fn on_message(&mut self, payload: &str) -> Result<TickReport, BridgeError> {
        self.stats.received += 1;

        let (state, fix) = match self.translator.decode_and_translate(payload) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.stats.decode_errors += 1;
                warn!(error = %e, "malformed state line dropped");
                return Err(e.into());
            }
        };
        self.stats.ticks += 1;

        let mut outcomes = Vec::with_capacity(OutputChannel::ALL.len());
        let stamped = Header::stamped(fix.timestamp_sec, MODULE_NAME);

        let gps = Gps {
            header: stamped.clone(),
            localization: fix.pose,
        };
        let result = self.ports.gps.publish(gps);
        outcomes.push(self.outcome(OutputChannel::GpsOdometry, self.ports.gps.topic(), result));

        let imu = CorrectedImu {
            header: stamped,
            imu: fix.pose,
        };
        let result = self.ports.corrected_imu.publish(imu);
        outcomes.push(self.outcome(
            OutputChannel::CorrectedImu,
            self.ports.corrected_imu.topic(),
            result,
        ));

        let gnss_status = GnssStatus {
            header: Header::unstamped(MODULE_NAME),
            solution_completed: true,
        };
        let result = self.ports.gnss_status.publish(gnss_status);
        outcomes.push(self.outcome(
            OutputChannel::GnssStatus,
            self.ports.gnss_status.topic(),
            result,
        ));

        let ins_status = InsStatus {
            header: Header::unstamped(MODULE_NAME),
            status_type: self.status.ins_status_type,
        };
        let result = self.ports.ins_status.publish(ins_status);
        outcomes.push(self.outcome(
            OutputChannel::InsStatus,
            self.ports.ins_status.topic(),
            result,
        ));

        let best_pose = GnssBestPose {
            header: Header::unstamped(MODULE_NAME),
            measurement_time: self.status.gnss_best_pose_measurement_time,
        };
        let result = self.ports.gnss_best_pose.publish(best_pose);
        outcomes.push(self.outcome(
            OutputChannel::GnssBestPose,
            self.ports.gnss_best_pose.topic(),
            result,
        ));

        let chassis = self.ports.chassis.current();
        chassis.speed_mps = state.forward_speed;
        chassis.gear_location = self.status.chassis_gear;
        let result = self.ports.chassis.publish();
        outcomes.push(self.outcome(OutputChannel::Chassis, self.ports.chassis.topic(), result));

        let report = TickReport {
            timestamp_sec: fix.timestamp_sec,
            forward_speed: state.forward_speed,
            euler: fix.euler,
            outcomes,
        };
        let published = report.published() as u64;
        self.stats.published += published;
        self.stats.publish_failures += report.outcomes.len() as u64 - published;

        Ok(report)
    }

    fn outcome(
        &self,
        channel: OutputChannel,
        topic: &str,
        result: Result<(), ContractError>,
    ) -> PublishOutcome {
        let error = result.err().map(|e| {
            warn!(channel = %channel, topic, error = %e, "publish failed");
            e.to_string()
        });
        PublishOutcome {
            channel,
            topic: topic.to_string(),
            error,
        }
    }

    /// Handle every message until the inbound channel closes
    #[instrument(name = "bridge_run", skip(self, rx))]
    pub async fn run(&mut self, rx: async_channel::Receiver<StateMessage>) -> BridgeStats {
        info!("bridge started");

        while let Ok(message) = rx.recv().await {
            if let Ok(report) = self.on_message(&message.payload) {
                debug!(
                    sequence = message.sequence,
                    timestamp_sec = report.timestamp_sec,
                    published = report.published(),
                    "tick"
                );
            }
        }

        info!(
            ticks = self.stats.ticks,
            decode_errors = self.stats.decode_errors,
            "bridge input closed"
        );
        self.stats
    }
}
