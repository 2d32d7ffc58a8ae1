use autopilot::{Board, Resources};

use crate::input::HostFeed;
use crate::sensors::{AttitudeSensor, Gyrometer, GyrometerConfig, Rangefinder};

/// Simulated flight controller board: host-fed stick input and sensors
/// sampling the simulated vehicle
pub struct SitlBoard {
    input: HostFeed,
    gyrometer: GyrometerConfig,
}

impl SitlBoard {
    pub fn new(input: HostFeed, gyrometer: GyrometerConfig) -> Self {
        SitlBoard { input, gyrometer }
    }
}

impl Board for SitlBoard {
    type Input = HostFeed;

    fn name(&self) -> &str {
        "SITL"
    }

    fn split_resources(self) -> Resources<HostFeed> {
        Resources {
            input: self.input,
            sensors: vec![
                Box::new(Gyrometer::new(self.gyrometer)),
                Box::new(AttitudeSensor),
                Box::new(Rangefinder::new()),
            ],
        }
    }
}
