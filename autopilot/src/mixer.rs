use crate::Demand;

/// How much each demand axis contributes to one motor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorDirection {
    pub throttle: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl MotorDirection {
    pub const fn new(throttle: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        MotorDirection {
            throttle,
            roll,
            pitch,
            yaw,
        }
    }
}

/// Maps demands to per-motor commands for an `N`-motor frame
#[derive(Debug, Clone)]
pub struct Mixer<const N: usize> {
    directions: [MotorDirection; N],
}

impl<const N: usize> Mixer<N> {
    pub const fn new(directions: [MotorDirection; N]) -> Self {
        Mixer { directions }
    }

    /// Raw motor values; callers clamp to the motor range
    pub fn combine(&self, demand: &Demand) -> [f64; N] {
        self.directions.map(|d| {
            demand.throttle * d.throttle + demand.roll * d.roll + demand.pitch * d.pitch + demand.yaw * d.yaw
        })
    }

    pub fn directions(&self) -> &[MotorDirection; N] {
        &self.directions
    }
}

impl Mixer<4> {
    /// Quad X in ArduPilot motor order: front right, rear left, front left, rear right
    pub const fn quad_xap() -> Self {
        Mixer::new([
            MotorDirection::new(1.0, -1.0, 1.0, 1.0),
            MotorDirection::new(1.0, 1.0, -1.0, 1.0),
            MotorDirection::new(1.0, 1.0, 1.0, -1.0),
            MotorDirection::new(1.0, -1.0, -1.0, -1.0),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Columns of the quad X table are orthogonal with squared norm 4
    fn recover(mixer: &Mixer<4>, motors: &[f64; 4]) -> Demand {
        let mut demand = Demand::default();
        for (m, d) in motors.iter().zip(mixer.directions()) {
            demand.throttle += m * d.throttle / 4.0;
            demand.roll += m * d.roll / 4.0;
            demand.pitch += m * d.pitch / 4.0;
            demand.yaw += m * d.yaw / 4.0;
        }
        demand
    }

    #[test]
    fn test_throttle_only_is_uniform() {
        let motors = Mixer::quad_xap().combine(&Demand::new(0.6, 0.0, 0.0, 0.0));
        assert_eq!(motors, [0.6; 4]);
    }

    #[test]
    fn test_demands_are_recoverable() {
        let mixer = Mixer::quad_xap();
        let demand = Demand::new(0.55, 0.1, -0.07, 0.03);
        let recovered = recover(&mixer, &mixer.combine(&demand));

        for (a, b) in recovered.as_array().iter().zip(demand.as_array()) {
            assert!((a - b).abs() < 1e-12, "{a} != {b}");
        }
    }

    #[test]
    fn test_roll_right_speeds_up_left_motors() {
        let motors = Mixer::quad_xap().combine(&Demand::new(0.5, 0.1, 0.0, 0.0));
        for (m, expected) in motors.iter().zip([0.4, 0.6, 0.6, 0.4]) {
            assert!((m - expected).abs() < 1e-12);
        }
    }
}
