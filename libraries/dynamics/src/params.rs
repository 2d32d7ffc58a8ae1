/// Physical constants of a multirotor, fixed for the lifetime of the vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Params {
    /// Thrust coefficient
    pub b: f64,
    /// Drag (yaw torque) coefficient
    pub d: f64,
    /// Mass in kilograms
    pub m: f64,
    /// Arm length in meters
    pub l: f64,
    /// Moment of inertia about body x
    pub ix: f64,
    /// Moment of inertia about body y
    pub iy: f64,
    /// Moment of inertia about body z
    pub iz: f64,
    /// Rotor inertia
    pub jr: f64,
    /// Motor speed at full command, in revolutions per minute
    pub maxrpm: f64,
}

impl Params {
    /// The 16.5 kg reference quad
    pub const fn big_quad() -> Self {
        Self {
            b: 5.30216718361085e-05,
            d: 2.23656692806239e-06,
            m: 16.47,
            l: 0.6,
            ix: 2.0,
            iy: 2.0,
            iz: 3.0,
            jr: 3.08013e-04,
            maxrpm: 15000.0,
        }
    }

    /// Rotor speed in rad/s for a normalized motor command
    pub fn motor_speed(&self, command: f64) -> f64 {
        command * self.maxrpm * core::f64::consts::PI / 30.0
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::big_quad()
    }
}
