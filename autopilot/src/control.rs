/// Normalized stick or controller demands.
///
/// Throttle is in [0, 1]; roll, pitch and yaw are nominally in [-1, 1].
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct Demand {
    pub throttle: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Demand {
    pub fn new(throttle: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        Demand {
            throttle,
            roll,
            pitch,
            yaw,
        }
    }

    /// (throttle, roll, pitch, yaw)
    pub fn as_array(&self) -> [f64; 4] {
        [self.throttle, self.roll, self.pitch, self.yaw]
    }
}
