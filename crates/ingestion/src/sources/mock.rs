//! Mock state source
//!
//! Synthetic vehicle driving a circle, for runs without a simulator.

use std::f64::consts::FRAC_PI_2;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use contracts::{Quaternion, Vector3, VehicleState};
use tracing::{debug, trace};

use crate::error::{IngestionError, Result};
use crate::sender::StateSender;
use crate::source::StateSource;

use super::period_from_rate;

/// Mock state source configuration
#[derive(Debug, Clone)]
pub struct MockStateConfig {
    /// Inbound topic
    pub topic: String,

    /// Publish frequency (Hz)
    pub frequency_hz: f64,

    /// Circle radius (m)
    pub radius_m: f64,

    /// Constant forward speed (m/s)
    pub speed_mps: f64,

    /// Circle centre in the simulator world frame
    pub center: (f64, f64),

    /// Stop after this many ticks (None = run until stopped)
    pub max_ticks: Option<u64>,
}

impl Default for MockStateConfig {
    fn default() -> Self {
        Self {
            topic: contracts::DEFAULT_STATE_TOPIC.to_string(),
            frequency_hz: 20.0,
            radius_m: 50.0,
            speed_mps: 8.0,
            center: (0.0, 0.0),
            max_ticks: None,
        }
    }
}

impl MockStateConfig {
    /// State of the synthetic vehicle at simulation time `t`
    ///
    /// Counter-clockwise circle; heading is tangent to it.
    pub fn state_at(&self, t: f64) -> VehicleState {
        let omega = if self.radius_m > 0.0 {
            self.speed_mps / self.radius_m
        } else {
            0.0
        };
        let theta = omega * t;
        let yaw = theta + FRAC_PI_2;
        let half = yaw / 2.0;

        VehicleState {
            position: Vector3::new(
                self.center.0 + self.radius_m * theta.cos(),
                self.center.1 + self.radius_m * theta.sin(),
                0.0,
            ),
            orientation: Quaternion::new(0.0, 0.0, half.sin(), half.cos()),
            angular_velocity: Vector3::new(0.0, 0.0, omega),
            linear_velocity: Vector3::new(self.speed_mps, 0.0, 0.0),
            linear_acceleration: Vector3::new(0.0, self.speed_mps * omega, 0.0),
            forward_speed: self.speed_mps,
            timestamp: t,
        }
    }
}

/// Mock state source
pub struct MockStateSource {
    config: MockStateConfig,
    running: Arc<AtomicBool>,
}

impl MockStateSource {
    pub fn new(config: MockStateConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &MockStateConfig {
        &self.config
    }
}

impl StateSource for MockStateSource {
    fn topic(&self) -> &str {
        &self.config.topic
    }

    fn start(&self, sender: StateSender) -> Result<()> {
        if !(self.config.frequency_hz > 0.0) {
            return Err(IngestionError::invalid_param(
                "frequency_hz",
                format!("must be > 0, got {}", self.config.frequency_hz),
            ));
        }
        let interval = period_from_rate("frequency_hz", self.config.frequency_hz)?;
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(IngestionError::AlreadyRunning {
                topic: self.config.topic.clone(),
            });
        }

        let config = self.config.clone();
        let running = self.running.clone();

        tokio::spawn(async move {
            let period = interval.as_secs_f64();
            let mut tick: u64 = 0;

            debug!(
                topic = %config.topic,
                frequency_hz = config.frequency_hz,
                "mock state source started"
            );

            while running.load(Ordering::Relaxed) {
                if config.max_ticks.is_some_and(|max| tick >= max) {
                    break;
                }

                let t = tick as f64 * period;
                if !sender.send(config.state_at(t).to_line()) {
                    break;
                }
                trace!(topic = %config.topic, tick, t, "mock state sent");

                tick += 1;
                tokio::time::sleep(interval).await;
            }

            running.store(false, Ordering::SeqCst);
            debug!(topic = %config.topic, ticks = tick, "mock state source stopped");
        });

        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
