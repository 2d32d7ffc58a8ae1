//! # SITL - software-in-the-loop board
//!
//! Flies the autopilot against a simulated multirotor, either in one process
//! or across a UDP link to a separate dynamics process.
//!
//! ## Features
//!
//! - Simulated gyrometer, attitude sensor and rangefinder
//! - Host-fed input device with a scripted pilot for unattended runs
//! - Little-endian datagram codecs for motor commands and telemetry
//! - Worker-thread UDP links for both ends of the proxy
//! - JSON configuration with defaults for every field

mod board;
mod config;
mod input;
mod link;
mod packet;
mod sensors;
mod sim;

pub use board::SitlBoard;
pub use config::{LinkConfig, Mode, SitlConfig, TuningConfig};
pub use input::{FeedHandle, HostFeed, StickScript, StickStep};
pub use link::{ControllerLink, DatagramEmitter, DatagramListener, DynamicsLink, LinkCommand};
pub use packet::{Datagram, MotorPacket, PacketError, Telemetry};
pub use sensors::{AttitudeSensor, Gyrometer, GyrometerConfig, Rangefinder};
pub use sim::{RemotePilot, Simulation};
