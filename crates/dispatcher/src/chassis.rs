//! ChassisFaker - synthetic chassis collaborator
//!
//! Holds the long-lived chassis record. The bridge mutates it in place each
//! tick and asks it to republish.

use contracts::{Chassis, ChassisPort, ContractError, DrivingMode, GearPosition, Header, Publisher};

/// Synthetic chassis report source
pub struct ChassisFaker {
    chassis: Chassis,
    publisher: Box<dyn Publisher<Chassis>>,
}

impl ChassisFaker {
    /// Engine running, autonomous mode, in neutral until the first tick
    pub fn new(publisher: Box<dyn Publisher<Chassis>>, module_name: &str) -> Self {
        Self {
            chassis: Chassis {
                header: Header::unstamped(module_name),
                engine_started: true,
                gear_location: GearPosition::Neutral,
                driving_mode: DrivingMode::CompleteAutoDrive,
                ..Default::default()
            },
            publisher,
        }
    }

    pub fn chassis(&self) -> &Chassis {
        &self.chassis
    }
}

impl ChassisPort for ChassisFaker {
    fn topic(&self) -> &str {
        self.publisher.topic()
    }

    fn current(&mut self) -> &mut Chassis {
        &mut self.chassis
    }

    fn publish(&mut self) -> Result<(), ContractError> {
        self.publisher.publish(self.chassis.clone())
    }
}
