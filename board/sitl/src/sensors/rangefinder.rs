use autopilot::{Sensor, VehicleState};
use dynamics::State;

// Beyond this tilt the beam no longer sees the ground
const MIN_TILT_COSINE: f64 = 0.1;

/// Downward-facing distance sensor.
///
/// The ground level is captured on the first reading and never re-captured.
/// Vertical speed comes from differencing successive altitudes.
#[derive(Debug, Default, Clone)]
pub struct Rangefinder {
    ground: Option<f64>,
    last: Option<(f64, f64)>,
}

impl Rangefinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Altitude captured as ground level, once calibrated
    pub fn ground(&self) -> Option<f64> {
        self.ground
    }
}

impl Sensor for Rangefinder {
    fn ready(&mut self, truth: &State, _time: f64) -> bool {
        if self.ground.is_none() {
            self.ground = Some(truth.altitude);
        }
        true
    }

    fn modify_state(&mut self, truth: &State, state: &mut VehicleState, time: f64) {
        let Some(ground) = self.ground else {
            return;
        };

        let euler = truth.euler_angles();
        let tilt = euler.x.cos() * euler.y.cos();
        if tilt < MIN_TILT_COSINE {
            return;
        }

        let altitude = (truth.altitude - ground) / tilt;
        if let Some((last_time, last_altitude)) = self.last {
            if time > last_time {
                state.variometer = (altitude - last_altitude) / (time - last_time);
            }
        }
        state.altitude = altitude;
        self.last = Some((time, altitude));
    }

    // Ground stays calibrated; the clock restarts so differencing must too
    fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynamics::{Pose, Vector3};

    fn at(altitude: f64, roll: f64) -> State {
        let pose = Pose::new(Vector3::new(0.0, 0.0, -altitude), Vector3::new(roll, 0.0, 0.0));
        State::from_parts(pose, Vector3::zeros(), Vector3::zeros())
    }

    fn read(sensor: &mut Rangefinder, truth: &State, state: &mut VehicleState, time: f64) {
        if sensor.ready(truth, time) {
            sensor.modify_state(truth, state, time);
        }
    }

    #[test]
    fn test_ground_is_captured_once() {
        let mut sensor = Rangefinder::new();
        let mut state = VehicleState::default();

        read(&mut sensor, &at(1.0, 0.0), &mut state, 0.0);
        assert_eq!(sensor.ground(), Some(1.0));
        assert_eq!(state.altitude, 0.0);

        read(&mut sensor, &at(3.0, 0.0), &mut state, 1.0);
        read(&mut sensor, &at(0.0, 0.0), &mut state, 2.0);
        assert_eq!(sensor.ground(), Some(1.0));
        assert_eq!(state.altitude, -1.0);
    }

    #[test]
    fn test_tilt_lengthens_the_range() {
        let mut sensor = Rangefinder::new();
        let mut state = VehicleState::default();
        read(&mut sensor, &at(0.0, 0.0), &mut state, 0.0);

        read(&mut sensor, &at(2.0, 0.5), &mut state, 0.1);
        assert!((state.altitude - 2.0 / 0.5f64.cos()).abs() < 1e-9);
    }

    #[test]
    fn test_variometer() {
        let mut sensor = Rangefinder::new();
        let mut state = VehicleState::default();
        read(&mut sensor, &at(0.0, 0.0), &mut state, 0.0);
        read(&mut sensor, &at(0.5, 0.0), &mut state, 0.5);
        assert!((state.variometer - 1.0).abs() < 1e-9);

        read(&mut sensor, &at(0.25, 0.0), &mut state, 1.0);
        assert!((state.variometer + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_inverted_keeps_previous_reading() {
        let mut sensor = Rangefinder::new();
        let mut state = VehicleState::default();
        read(&mut sensor, &at(0.0, 0.0), &mut state, 0.0);
        read(&mut sensor, &at(1.0, 0.0), &mut state, 0.1);

        read(&mut sensor, &at(5.0, 3.0), &mut state, 0.2);
        assert_eq!(state.altitude, 1.0);
    }

    #[test]
    fn test_reset_keeps_ground_and_restarts_variometer() {
        let mut sensor = Rangefinder::new();
        let mut state = VehicleState::default();
        read(&mut sensor, &at(0.0, 0.0), &mut state, 0.0);
        read(&mut sensor, &at(2.0, 0.0), &mut state, 5.0);

        sensor.reset();
        read(&mut sensor, &at(0.0, 0.0), &mut state, 0.0);
        read(&mut sensor, &at(0.1, 0.0), &mut state, 0.1);

        assert_eq!(sensor.ground(), Some(0.0));
        assert!((state.variometer - 1.0).abs() < 1e-9, "variometer {}", state.variometer);
    }
}
