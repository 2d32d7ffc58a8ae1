//! Vehicle topology as data.
//!
//! A [`Frame`] says how each motor's squared speed contributes to the roll,
//! pitch and yaw torques. Supporting a new airframe means supplying new
//! weights; the integrator never changes.

/// Per-motor torque weights for an `N`-motor airframe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame<const N: usize> {
    roll: [f64; N],
    pitch: [f64; N],
    yaw: [f64; N],
}

impl<const N: usize> Frame<N> {
    pub const fn new(roll: [f64; N], pitch: [f64; N], yaw: [f64; N]) -> Self {
        Self { roll, pitch, yaw }
    }

    /// Roll torque combination (positive rolls right)
    pub fn u2(&self, o: &[f64; N]) -> f64 {
        weighted_sum(&self.roll, o)
    }

    /// Pitch torque combination (positive pitches forward)
    pub fn u3(&self, o: &[f64; N]) -> f64 {
        weighted_sum(&self.pitch, o)
    }

    /// Yaw torque combination (positive yaws clockwise)
    pub fn u4(&self, o: &[f64; N]) -> f64 {
        weighted_sum(&self.yaw, o)
    }

    /// Spin direction of each rotor, taken from the sign of its yaw weight
    pub fn rotor_direction(&self, motor: usize) -> f64 {
        self.yaw[motor].signum()
    }
}

impl Frame<4> {
    /// Quad-X with ArduPilot motor numbering:
    /// 0 right front, 1 left rear, 2 left front, 3 right rear
    pub const fn quad_xap() -> Self {
        Self::new(
            [-1.0, 1.0, 1.0, -1.0],
            [-1.0, 1.0, -1.0, 1.0],
            [1.0, 1.0, -1.0, -1.0],
        )
    }
}

fn weighted_sum<const N: usize>(weights: &[f64; N], o: &[f64; N]) -> f64 {
    weights.iter().zip(o.iter()).map(|(w, x)| w * x).sum()
}
