mod attitude;
mod board;
mod control;
mod flight_manager;
mod mixer;
mod rc;
mod sensor;
mod stages;

pub use attitude::VehicleState;
pub use board::{Board, Resources};
pub use control::Demand;
pub use flight_manager::FlightManager;
pub use mixer::{Mixer, MotorDirection};
pub use rc::{
    lookup as lookup_profile, AuxState, ButtonAux, DeviceProfile, Receiver, CHANNEL_AUX1, CHANNEL_AUX2,
    CHANNEL_COUNT, CHANNEL_PITCH, CHANNEL_ROLL, CHANNEL_THROTTLE, CHANNEL_YAW, DEFAULT_FRAME_DIVISOR,
    PRODUCT_EXTREMEPRO3D, PRODUCT_F310, PRODUCT_PS3_CLONE, PRODUCT_PS4, PRODUCT_TARANIS, PRODUCT_XBOX360_CLONE,
    PROFILES,
};
pub use sensor::Sensor;
pub use pid::PIDError;
pub use stages::{
    AltitudeHoldGains, AltitudeHoldStage, LevelStage, PidCascade, PidStage, RateGains, RateStage,
};
