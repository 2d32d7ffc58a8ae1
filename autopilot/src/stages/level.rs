use crate::stages::PidStage;
use crate::{Demand, VehicleState};

const MAX_ANGLE_DEGREES: f64 = 45.0;

/// Self-leveling: stick position selects a target angle, and the stage
/// emits the rate demand that drives the vehicle toward it.
#[derive(Debug, Clone, Copy)]
pub struct LevelStage {
    gain: f64,
    demands_to_angle: f64,
}

impl LevelStage {
    pub fn new(gain: f64) -> Self {
        LevelStage {
            gain,
            demands_to_angle: 2.0 * MAX_ANGLE_DEGREES.to_radians(),
        }
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }
}

impl Default for LevelStage {
    fn default() -> Self {
        LevelStage::new(0.1)
    }
}

impl PidStage for LevelStage {
    fn update(&mut self, demand: Demand, state: &VehicleState, _dt: f64) -> Demand {
        Demand {
            roll: self.gain * (demand.roll * self.demands_to_angle - state.roll),
            pitch: self.gain * (demand.pitch * self.demands_to_angle - state.pitch),
            ..demand
        }
    }

    // Proportional only
    fn reset(&mut self) {}
}
