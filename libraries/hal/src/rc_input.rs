/// RC Input interface

/// Number of raw axes reported by an input device
pub const AXIS_COUNT: usize = 6;

/// Full-scale magnitude of a raw axis reading
pub const AXIS_FULL_SCALE: f64 = 32767.0;

/// One raw reading from a joystick, gamepad or USB transmitter
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    /// Axis values in device units, nominally ±32767 around the device baseline
    pub axes: [i32; AXIS_COUNT],

    /// Bitmask of currently pressed buttons
    pub buttons: u8,
}

impl RawSample {
    pub fn new(axes: [i32; AXIS_COUNT], buttons: u8) -> Self {
        Self { axes, buttons }
    }
}

/// Outcome of talking to the input device
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Device present and recognized
    Ok,
    /// No device attached, or it went away
    Missing,
    /// Device attached but its product id has no known axis layout
    UnrecognizedProduct,
}

impl DeviceStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, DeviceStatus::Ok)
    }
}

/// Platform capability for reading a raw input device.
///
/// Implementations must return immediately; a host that has no fresh sample
/// returns the last one it saw.
pub trait InputDevice {
    /// USB product id of the attached device, `None` if nothing is attached
    fn product_id(&mut self) -> Option<u16>;

    /// Current axes and buttons, `None` if the device is no longer available
    fn poll(&mut self) -> Option<RawSample>;
}
