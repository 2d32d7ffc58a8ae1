use dynamics::State;

use crate::VehicleState;

/// A simulated or physical sensor feeding the control loop.
///
/// Sensors are chained: each one overwrites the channels it measures in the
/// shared working state. The ground-truth state is handed in explicitly.
pub trait Sensor {
    /// Whether a valid reading exists. May perform one-time calibration.
    fn ready(&mut self, truth: &State, time: f64) -> bool;

    /// Overwrite this sensor's channels of `state`
    fn modify_state(&mut self, truth: &State, state: &mut VehicleState, time: f64);

    /// Drop readings buffered from before a vehicle reset. Calibration survives.
    fn reset(&mut self) {}
}
