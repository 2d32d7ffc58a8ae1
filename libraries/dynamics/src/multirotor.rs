use nalgebra as na;

use crate::error::{DynamicsError, DynamicsResult};
use crate::frame::Frame;
use crate::params::Params;
use crate::state::{Pose, State};

/// Standard gravity in m/s^2
pub const GRAVITY: f64 = 9.80665;

/// The 12-element kinematic state, or its time derivative
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Kinematics {
    location: na::Vector3<f64>,
    velocity: na::Vector3<f64>,
    rotation: na::Vector3<f64>,
    rotation_rate: na::Vector3<f64>,
}

impl Kinematics {
    fn advance(&self, derivative: &Kinematics, dt: f64) -> Kinematics {
        Kinematics {
            location: self.location + derivative.location * dt,
            velocity: self.velocity + derivative.velocity * dt,
            rotation: self.rotation + derivative.rotation * dt,
            rotation_rate: self.rotation_rate + derivative.rotation_rate * dt,
        }
    }

    fn first_non_finite(&self) -> Option<&'static str> {
        let finite = |v: &na::Vector3<f64>| v.iter().all(|x| x.is_finite());
        if !finite(&self.location) {
            Some("location")
        } else if !finite(&self.velocity) {
            Some("velocity")
        } else if !finite(&self.rotation) {
            Some("rotation")
        } else if !finite(&self.rotation_rate) {
            Some("rotation rate")
        } else {
            None
        }
    }
}

/// Net thrust and body torques for one set of motor commands
#[derive(Debug, Clone, Copy)]
struct Forces {
    thrust: f64,
    roll: f64,
    pitch: f64,
    yaw: f64,
    /// Signed sum of rotor speeds, drives the gyroscopic terms
    rotor_speed: f64,
}

/// Rigid-body multirotor integrated with forward Euler.
///
/// Follows the Bouabdallah quadrotor model: thrust along body z, torques from
/// the [`Frame`] combinations of squared rotor speeds, and gyroscopic coupling
/// through the rotor inertia.
pub struct MultirotorDynamics<const N: usize> {
    params: Params,
    frame: Frame<N>,
    motors: [f64; N],
    x: Kinematics,
    inertial_acceleration: na::Vector3<f64>,
    airborne: bool,
}

impl<const N: usize> MultirotorDynamics<N> {
    pub fn new(params: Params, frame: Frame<N>) -> Self {
        Self {
            params,
            frame,
            motors: [0.0; N],
            x: Kinematics::default(),
            inertial_acceleration: na::Vector3::zeros(),
            airborne: false,
        }
    }

    /// Place the vehicle at `pose`, at rest
    pub fn init(&mut self, pose: Pose) {
        self.x = Kinematics {
            location: pose.location,
            rotation: pose.rotation,
            ..Kinematics::default()
        };
        self.motors = [0.0; N];
        self.inertial_acceleration = na::Vector3::zeros();
        // Anything above the ground plane starts in free flight
        self.airborne = pose.location.z < 0.0;
    }

    /// Latest motor commands, normally in [0, 1]. Not clamped here.
    pub fn set_motors(&mut self, motors: &[f64; N]) {
        self.motors = *motors;
    }

    pub fn motors(&self) -> &[f64; N] {
        &self.motors
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn frame(&self) -> &Frame<N> {
        &self.frame
    }

    /// Advance the state by `dt` seconds.
    ///
    /// On error the previous state is kept.
    pub fn update(&mut self, dt: f64) -> DynamicsResult<()> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(DynamicsError::InvalidTimestep(dt));
        }

        let forces = self.forces();

        // Rotate the thrust vector into the inertial frame
        let thrust_accel = body_z_to_inertial(-forces.thrust / self.params.m, &self.x.rotation);
        let accel = na::Vector3::new(thrust_accel.x, thrust_accel.y, thrust_accel.z + GRAVITY);

        // Off the ground once net acceleration points up
        let airborne = self.airborne || accel.z < 0.0;
        if !airborne {
            self.inertial_acceleration = na::Vector3::zeros();
            return Ok(());
        }

        let derivative = self.derivative(&accel, &forces);
        let mut next = self.x.advance(&derivative, dt);

        if let Some(component) = next.first_non_finite() {
            return Err(DynamicsError::Diverged { component });
        }

        let mut landed = false;
        if next.location.z >= 0.0 && next.velocity.z > 0.0 {
            next.location.z = 0.0;
            next.velocity = na::Vector3::zeros();
            next.rotation.x = 0.0;
            next.rotation.y = 0.0;
            next.rotation_rate = na::Vector3::zeros();
            landed = true;
        }

        self.x = next;
        self.airborne = !landed;
        self.inertial_acceleration = if landed { na::Vector3::zeros() } else { accel };

        Ok(())
    }

    /// Copy out the current snapshot
    pub fn state(&self) -> State {
        let mut state = State::from_parts(
            Pose::new(self.x.location, self.x.rotation),
            self.x.velocity,
            self.x.rotation_rate,
        );
        state.inertial_acceleration = self.inertial_acceleration;
        state.airborne = self.airborne;
        state
    }

    fn forces(&self) -> Forces {
        let p = &self.params;

        let omegas = self.motors.map(|m| p.motor_speed(m));
        let omegas2 = omegas.map(|w| w * w);

        let rotor_speed = omegas
            .iter()
            .enumerate()
            .map(|(i, w)| self.frame.rotor_direction(i) * w)
            .sum();

        Forces {
            thrust: p.b * omegas2.iter().sum::<f64>(),
            roll: p.l * p.b * self.frame.u2(&omegas2),
            pitch: p.l * p.b * self.frame.u3(&omegas2),
            yaw: p.d * self.frame.u4(&omegas2),
            rotor_speed,
        }
    }

    fn derivative(&self, accel: &na::Vector3<f64>, forces: &Forces) -> Kinematics {
        let p = &self.params;
        let phidot = self.x.rotation_rate.x;
        let thedot = self.x.rotation_rate.y;
        let psidot = self.x.rotation_rate.z;
        let omega = forces.rotor_speed;

        let phi_ddot = psidot * thedot * (p.iy - p.iz) / p.ix - p.jr / p.ix * thedot * omega
            + forces.roll / p.ix;
        let theta_ddot = -(psidot * phidot * (p.iz - p.ix) / p.iy
            + p.jr / p.iy * phidot * omega
            + forces.pitch / p.iy);
        let psi_ddot = thedot * phidot * (p.ix - p.iy) / p.iz + forces.yaw / p.iz;

        Kinematics {
            location: self.x.velocity,
            velocity: *accel,
            rotation: self.x.rotation_rate,
            rotation_rate: na::Vector3::new(phi_ddot, theta_ddot, psi_ddot),
        }
    }
}

/// Scale the body z axis, expressed in the inertial frame, by `body_z`.
/// This is the rightmost column of the body-to-inertial rotation matrix.
fn body_z_to_inertial(body_z: f64, euler: &na::Vector3<f64>) -> na::Vector3<f64> {
    let (sph, cph) = euler.x.sin_cos();
    let (sth, cth) = euler.y.sin_cos();
    let (sps, cps) = euler.z.sin_cos();

    na::Vector3::new(
        sph * sps + cph * cps * sth,
        cph * sps * sth - cps * sph,
        cph * cth,
    ) * body_z
}
