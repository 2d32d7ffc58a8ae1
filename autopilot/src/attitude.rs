/// Sensed vehicle state the control loop trusts, refined by each sensor in turn
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    /// Euler angles in radians
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,

    /// Angular rates in radians per second
    pub roll_rate: f64,
    pub pitch_rate: f64,
    pub yaw_rate: f64,

    /// Height above the calibrated ground level in meters
    pub altitude: f64,

    /// Vertical speed in meters per second, positive up
    pub variometer: f64,
}
