use autopilot::{Sensor, VehicleState};
use dynamics::State;

/// Reports Euler angles recovered from the vehicle orientation quaternion
#[derive(Debug, Default, Clone, Copy)]
pub struct AttitudeSensor;

impl Sensor for AttitudeSensor {
    fn ready(&mut self, _truth: &State, _time: f64) -> bool {
        true
    }

    fn modify_state(&mut self, truth: &State, state: &mut VehicleState, _time: f64) {
        let (roll, pitch, yaw) = truth.quaternion.euler_angles();
        state.roll = roll;
        state.pitch = pitch;
        state.yaw = yaw;
    }
}
