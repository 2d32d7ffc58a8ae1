use nalgebra as na;

/// Position and orientation of the vehicle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Location in the NED frame (North, East, Down) in meters
    pub location: na::Vector3<f64>,

    /// Euler angles (roll, pitch, yaw) in radians
    pub rotation: na::Vector3<f64>,
}

impl Pose {
    pub fn new(location: na::Vector3<f64>, rotation: na::Vector3<f64>) -> Self {
        Self { location, rotation }
    }

    /// Level at the origin
    pub fn origin() -> Self {
        Self::default()
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            location: na::Vector3::zeros(),
            rotation: na::Vector3::zeros(),
        }
    }
}

/// Kinematic snapshot produced by the integrator each step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub pose: Pose,

    /// Velocity in the NED frame in meters per second
    pub inertial_velocity: na::Vector3<f64>,

    /// Euler angle rates (roll, pitch, yaw) in radians per second
    pub angular_velocity: na::Vector3<f64>,

    /// Orientation built from the pose's Euler angles
    pub quaternion: na::UnitQuaternion<f64>,

    /// Acceleration in the NED frame, zero while on the ground
    pub inertial_acceleration: na::Vector3<f64>,

    /// Height above the origin in meters (positive up)
    pub altitude: f64,

    pub airborne: bool,
}

impl State {
    /// Build a snapshot, deriving the quaternion and altitude from the pose
    pub fn from_parts(
        pose: Pose,
        inertial_velocity: na::Vector3<f64>,
        angular_velocity: na::Vector3<f64>,
    ) -> Self {
        let quaternion =
            na::UnitQuaternion::from_euler_angles(pose.rotation.x, pose.rotation.y, pose.rotation.z);
        Self {
            pose,
            inertial_velocity,
            angular_velocity,
            quaternion,
            inertial_acceleration: na::Vector3::zeros(),
            altitude: -pose.location.z,
            airborne: false,
        }
    }

    /// Euler angles (roll, pitch, yaw) in radians
    pub fn euler_angles(&self) -> na::Vector3<f64> {
        self.pose.rotation
    }

    /// Check that every component is finite
    pub fn is_valid(&self) -> bool {
        finite(&self.pose.location)
            && finite(&self.pose.rotation)
            && finite(&self.inertial_velocity)
            && finite(&self.angular_velocity)
            && self.altitude.is_finite()
    }
}

impl Default for State {
    fn default() -> Self {
        Self::from_parts(Pose::default(), na::Vector3::zeros(), na::Vector3::zeros())
    }
}

fn finite(v: &na::Vector3<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}
