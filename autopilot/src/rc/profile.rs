// Axis layouts of the supported joysticks, gamepads and USB transmitters

pub const PRODUCT_TARANIS: u16 = 0x5710;
pub const PRODUCT_PS3_CLONE: u16 = 0x0003;
pub const PRODUCT_XBOX360_CLONE: u16 = 0xfafe;
pub const PRODUCT_EXTREMEPRO3D: u16 = 0xc215;
pub const PRODUCT_F310: u16 = 0xc21d;
pub const PRODUCT_PS4: u16 = 0x09cc;

/// How one device maps onto receiver channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceProfile {
    pub name: &'static str,
    pub product_id: u16,

    /// Raw axis index for throttle, roll, pitch, yaw and aux
    pub axis_map: [usize; 5],

    /// Raw value the device reports at center stick
    pub baseline: i32,

    /// Throttle and pitch axes report up as negative
    pub reversed_verticals: bool,

    /// Throttle stick springs back to center, so altitude hold is always on
    pub springy_throttle: bool,

    /// Button masks selecting aux positions 0, 1 and 2, for devices without an aux axis
    pub button_map: Option<[u8; 3]>,
}

pub static PROFILES: [DeviceProfile; 6] = [
    DeviceProfile {
        name: "FrSky Taranis",
        product_id: PRODUCT_TARANIS,
        axis_map: [0, 1, 2, 5, 3],
        baseline: 0,
        reversed_verticals: false,
        springy_throttle: false,
        button_map: None,
    },
    DeviceProfile {
        name: "PS3 clone",
        product_id: PRODUCT_PS3_CLONE,
        axis_map: [1, 2, 3, 0, 0],
        baseline: 0,
        reversed_verticals: true,
        springy_throttle: true,
        button_map: Some([8, 2, 1]),
    },
    DeviceProfile {
        name: "XBox 360 clone",
        product_id: PRODUCT_XBOX360_CLONE,
        axis_map: [1, 3, 4, 0, 0],
        baseline: 0,
        reversed_verticals: true,
        springy_throttle: true,
        button_map: Some([8, 2, 1]),
    },
    DeviceProfile {
        name: "Logitech Extreme 3D Pro",
        product_id: PRODUCT_EXTREMEPRO3D,
        axis_map: [2, 0, 1, 3, 0],
        baseline: 0,
        reversed_verticals: true,
        springy_throttle: false,
        button_map: Some([1, 2, 4]),
    },
    DeviceProfile {
        name: "Logitech F310",
        product_id: PRODUCT_F310,
        axis_map: [1, 2, 3, 0, 0],
        baseline: 0,
        reversed_verticals: true,
        springy_throttle: true,
        button_map: Some([8, 2, 1]),
    },
    DeviceProfile {
        name: "PS4",
        product_id: PRODUCT_PS4,
        axis_map: [1, 2, 5, 0, 0],
        baseline: 0,
        reversed_verticals: true,
        springy_throttle: true,
        button_map: Some([8, 2, 1]),
    },
];

pub fn lookup(product_id: u16) -> Option<&'static DeviceProfile> {
    PROFILES.iter().find(|p| p.product_id == product_id)
}
