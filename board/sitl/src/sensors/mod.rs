mod attitude;
mod gyrometer;
mod rangefinder;

pub use attitude::AttitudeSensor;
pub use gyrometer::{Gyrometer, GyrometerConfig};
pub use rangefinder::Rangefinder;
