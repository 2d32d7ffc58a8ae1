//! # Dynamics - multirotor rigid-body simulation
//!
//! Integrates the translational and rotational equations of motion of an
//! `N`-motor vehicle from normalized motor commands.
//!
//! ## Features
//!
//! - Fixed-step forward Euler integration, deterministic for a given input
//! - Vehicle topology supplied as data through [`Frame`]
//! - Motor count checked at compile time
//! - Non-finite results rejected instead of propagated
//!
//! ## Platform Support
//!
//! - **serde**: derive `Serialize`/`Deserialize` for [`Params`] so vehicles
//!   can be loaded from configuration files

mod error;
mod frame;
mod multirotor;
mod params;
mod state;

pub use error::{DynamicsError, DynamicsResult};
pub use frame::Frame;
pub use multirotor::{MultirotorDynamics, GRAVITY};
pub use params::Params;
pub use state::{Pose, State};

pub use nalgebra::{Quaternion, UnitQuaternion, Vector3};
