mod profile;
mod switch;

use hal::{DeviceStatus, InputDevice, RawSample, AXIS_FULL_SCALE};
use log::{debug, info, warn};

use crate::Demand;

pub use profile::{
    lookup, DeviceProfile, PRODUCT_EXTREMEPRO3D, PRODUCT_F310, PRODUCT_PS3_CLONE, PRODUCT_PS4, PRODUCT_TARANIS,
    PRODUCT_XBOX360_CLONE, PROFILES,
};
pub use switch::{AuxState, ButtonAux};

pub const CHANNEL_THROTTLE: usize = 0;
pub const CHANNEL_ROLL: usize = 1;
pub const CHANNEL_PITCH: usize = 2;
pub const CHANNEL_YAW: usize = 3;
pub const CHANNEL_AUX1: usize = 4;
pub const CHANNEL_AUX2: usize = 5;
pub const CHANNEL_COUNT: usize = 6;

/// A fresh frame is reported once every this many calls to `got_new_frame`
pub const DEFAULT_FRAME_DIVISOR: u64 = 3;

const CYCLIC_EXPO: f64 = 0.65;
const CYCLIC_RATE: f64 = 0.90;
const THROTTLE_EXPO: f64 = 0.20;
const THROTTLE_MID: f64 = 0.50;

/// Turns raw device readings into normalized demands and switch states.
///
/// The input device is polled at the host's own rate; this side emulates a
/// real receiver's output data rate by only reporting every few cycles.
pub struct Receiver<D: InputDevice> {
    device: D,
    profile: Option<&'static DeviceProfile>,
    buttons: Option<ButtonAux>,
    status: DeviceStatus,

    frame_divisor: u64,
    cycle: u64,

    rawvals: [f64; CHANNEL_COUNT],
    demands: Demand,
}

impl<D: InputDevice> Receiver<D> {
    pub fn new(device: D) -> Self {
        Self::with_frame_divisor(device, DEFAULT_FRAME_DIVISOR)
    }

    /// A divisor of zero is treated as one
    pub fn with_frame_divisor(device: D, frame_divisor: u64) -> Self {
        let mut rawvals = [0.0; CHANNEL_COUNT];
        rawvals[CHANNEL_AUX1] = -1.0;

        Receiver {
            device,
            profile: None,
            buttons: None,
            status: DeviceStatus::Missing,
            frame_divisor: frame_divisor.max(1),
            cycle: 0,
            rawvals,
            demands: Demand::default(),
        }
    }

    /// Identify the attached device and pick its axis layout
    ///
    /// An unknown product is reported once; retries while it stays attached log at debug level.
    pub fn begin(&mut self) -> DeviceStatus {
        let previous = self.status;
        self.profile = None;
        self.buttons = None;

        self.status = match self.device.product_id() {
            None => DeviceStatus::Missing,
            Some(product_id) => match profile::lookup(product_id) {
                Some(profile) => {
                    info!("Input device: {} ({:#06x})", profile.name, product_id);
                    self.profile = Some(profile);
                    self.buttons = profile.button_map.map(ButtonAux::new);
                    DeviceStatus::Ok
                }
                None => {
                    if previous == DeviceStatus::UnrecognizedProduct {
                        debug!("Input device {:#06x} still unrecognized", product_id);
                    } else {
                        warn!("Unrecognized input device product id {:#06x}", product_id);
                    }
                    DeviceStatus::UnrecognizedProduct
                }
            },
        };
        self.status
    }

    pub fn got_new_frame(&mut self) -> bool {
        self.cycle += 1;
        self.cycle % self.frame_divisor == 0
    }

    /// Poll the device and normalize its axes into raw channel values
    pub fn read_rawvals(&mut self) -> DeviceStatus {
        let Some(profile) = self.profile else {
            return self.status;
        };

        let Some(sample) = self.device.poll() else {
            self.profile = None;
            self.status = DeviceStatus::Missing;
            return self.status;
        };

        self.apply_sample(profile, sample);
        self.status = DeviceStatus::Ok;
        self.status
    }

    fn apply_sample(&mut self, profile: &DeviceProfile, sample: RawSample) {
        for (channel, &axis) in profile.axis_map.iter().enumerate() {
            let value = (sample.axes[axis] - profile.baseline) as f64 / AXIS_FULL_SCALE;
            self.rawvals[channel] = value.clamp(-1.0, 1.0);
        }

        if profile.reversed_verticals {
            self.rawvals[CHANNEL_THROTTLE] = -self.rawvals[CHANNEL_THROTTLE];
            self.rawvals[CHANNEL_PITCH] = -self.rawvals[CHANNEL_PITCH];
        }

        if let Some(buttons) = self.buttons.as_mut() {
            self.rawvals[CHANNEL_AUX1] = buttons.update(sample.buttons);
        }
    }

    /// Run one receiver cycle. Demands only change when a new frame arrives
    /// and the device read succeeds; otherwise the last demands are kept.
    pub fn update(&mut self) -> DeviceStatus {
        if self.profile.is_none() {
            self.begin();
        }

        if self.got_new_frame() && self.profile.is_some() && self.read_rawvals().is_ok() {
            self.demands = self.compute_demands();
        }

        self.status
    }

    fn compute_demands(&self) -> Demand {
        Demand {
            throttle: throttle_curve(self.rawvals[CHANNEL_THROTTLE]),
            roll: cyclic_curve(self.rawvals[CHANNEL_ROLL]) / 2.0,
            pitch: cyclic_curve(self.rawvals[CHANNEL_PITCH]) / 2.0,
            yaw: self.rawvals[CHANNEL_YAW] / 2.0,
        }
    }

    pub fn demands(&self) -> Demand {
        self.demands
    }

    pub fn rawvals(&self) -> &[f64; CHANNEL_COUNT] {
        &self.rawvals
    }

    pub fn aux1_state(&self) -> AuxState {
        match self.profile {
            Some(profile) if profile.springy_throttle => AuxState::AltitudeHold,
            _ => AuxState::from_rawval(self.rawvals[CHANNEL_AUX1]),
        }
    }

    /// The aux2 (arming) switch reads as on for every simulated device
    pub fn aux2_state(&self) -> bool {
        true
    }

    pub fn armed(&self) -> bool {
        self.aux2_state()
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn profile(&self) -> Option<&'static DeviceProfile> {
        self.profile
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

/// Expo curve for roll and pitch, odd in `x`
fn cyclic_curve(x: f64) -> f64 {
    (1.0 + CYCLIC_EXPO * (x * x - 1.0)) * x * CYCLIC_RATE
}

/// Map the throttle stick from [-1, 1] to [0, 1] with a soft middle
fn throttle_curve(x: f64) -> f64 {
    let t = (x + 1.0) / 2.0;
    let offset = t - THROTTLE_MID;
    let span = if offset > 0.0 { 1.0 - THROTTLE_MID } else { THROTTLE_MID };
    let ratio = offset / span;
    (THROTTLE_MID + offset * (1.0 - THROTTLE_EXPO + THROTTLE_EXPO * ratio * ratio)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDevice {
        product_id: Option<u16>,
        sample: Option<RawSample>,
        polls: usize,
    }

    impl FakeDevice {
        fn new(product_id: Option<u16>, sample: RawSample) -> Self {
            FakeDevice {
                product_id,
                sample: Some(sample),
                polls: 0,
            }
        }
    }

    impl InputDevice for FakeDevice {
        fn product_id(&mut self) -> Option<u16> {
            self.product_id
        }

        fn poll(&mut self) -> Option<RawSample> {
            self.polls += 1;
            self.sample
        }
    }

    mod warnings {
        use std::cell::Cell;

        use log::{Level, LevelFilter, Log, Metadata, Record};

        thread_local! {
            static COUNT: Cell<usize> = const { Cell::new(0) };
        }

        struct CountingLogger;

        impl Log for CountingLogger {
            fn enabled(&self, metadata: &Metadata) -> bool {
                metadata.level() <= Level::Warn
            }

            fn log(&self, record: &Record) {
                if record.level() == Level::Warn {
                    COUNT.with(|count| count.set(count.get() + 1));
                }
            }

            fn flush(&self) {}
        }

        static LOGGER: CountingLogger = CountingLogger;

        /// Warnings logged on the current thread while `f` runs
        pub fn count(f: impl FnOnce()) -> usize {
            let _ = log::set_logger(&LOGGER);
            log::set_max_level(LevelFilter::Warn);
            let before = COUNT.with(Cell::get);
            f();
            COUNT.with(Cell::get) - before
        }
    }

    fn taranis(axes: [i32; 6]) -> Receiver<FakeDevice> {
        let mut receiver = Receiver::new(FakeDevice::new(Some(PRODUCT_TARANIS), RawSample::new(axes, 0)));
        assert_eq!(receiver.begin(), DeviceStatus::Ok);
        receiver
    }

    #[test]
    fn test_frame_gating() {
        let mut receiver = taranis([0; 6]);
        let frames: Vec<bool> = (0..9).map(|_| receiver.got_new_frame()).collect();
        assert_eq!(
            frames,
            [false, false, true, false, false, true, false, false, true]
        );

        let mut receiver = taranis([0; 6]);
        assert_eq!((0..100).filter(|_| receiver.got_new_frame()).count(), 33);
    }

    #[test]
    fn test_update_polls_only_on_new_frames() {
        let mut receiver = taranis([0; 6]);
        for _ in 0..6 {
            assert_eq!(receiver.update(), DeviceStatus::Ok);
        }
        assert_eq!(receiver.device_mut().polls, 2);
    }

    #[test]
    fn test_center_sticks() {
        let mut receiver = taranis([0; 6]);
        receiver.read_rawvals();
        let demands = receiver.compute_demands();

        assert!((demands.throttle - 0.5).abs() < 1e-12);
        assert_eq!((demands.roll, demands.pitch, demands.yaw), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_full_deflection() {
        // throttle, roll, pitch, aux, -, yaw
        let mut receiver = taranis([32767, 32767, -32767, 20000, 0, -32767]);
        receiver.read_rawvals();
        let demands = receiver.compute_demands();

        assert!((demands.throttle - 1.0).abs() < 1e-12);
        assert!((demands.roll - CYCLIC_RATE / 2.0).abs() < 1e-12);
        assert!((demands.pitch + CYCLIC_RATE / 2.0).abs() < 1e-12);
        assert!((demands.yaw + 0.5).abs() < 1e-12);
        assert_eq!(receiver.aux1_state(), AuxState::AltitudeHold);
    }

    #[test]
    fn test_axes_are_clamped() {
        let mut receiver = taranis([-40000, 40000, 0, 0, 0, 0]);
        receiver.read_rawvals();

        assert_eq!(receiver.rawvals()[CHANNEL_THROTTLE], -1.0);
        assert_eq!(receiver.rawvals()[CHANNEL_ROLL], 1.0);
        assert!(receiver.compute_demands().throttle.abs() < 1e-12);
    }

    #[test]
    fn test_curves_are_monotonic() {
        let mut last_throttle = -1.0;
        let mut last_cyclic = -1.0;
        for i in -100..=100 {
            let x = i as f64 / 100.0;
            let throttle = throttle_curve(x);
            let cyclic = cyclic_curve(x);
            assert!(throttle >= last_throttle && (0.0..=1.0).contains(&throttle));
            assert!(cyclic >= last_cyclic);
            assert!((cyclic + cyclic_curve(-x)).abs() < 1e-12);
            last_throttle = throttle;
            last_cyclic = cyclic;
        }
    }

    #[test]
    fn test_reversed_verticals_and_buttons() {
        // PS4: throttle on axis 1, pitch on axis 5, up reads negative
        let mut axes = [0; 6];
        axes[1] = -32767;
        axes[5] = -16384;
        let mut receiver = Receiver::new(FakeDevice::new(Some(PRODUCT_PS4), RawSample::new(axes, 2)));
        receiver.begin();
        receiver.read_rawvals();

        assert_eq!(receiver.rawvals()[CHANNEL_THROTTLE], 1.0);
        assert!(receiver.rawvals()[CHANNEL_PITCH] > 0.49);
        assert_eq!(receiver.rawvals()[CHANNEL_AUX1], 0.0);
        // Springy throttle always reports altitude hold
        assert_eq!(receiver.aux1_state(), AuxState::AltitudeHold);
    }

    #[test]
    fn test_aux_defaults_to_rate_before_first_frame() {
        let receiver = Receiver::new(FakeDevice::new(Some(PRODUCT_TARANIS), RawSample::default()));
        assert_eq!(receiver.aux1_state(), AuxState::Rate);
        assert!(receiver.armed());
    }

    #[test]
    fn test_missing_device() {
        let mut receiver = Receiver::new(FakeDevice::new(None, RawSample::default()));
        assert_eq!(receiver.begin(), DeviceStatus::Missing);
        for _ in 0..6 {
            assert_eq!(receiver.update(), DeviceStatus::Missing);
        }
        assert_eq!(receiver.demands(), Demand::default());
    }

    #[test]
    fn test_unrecognized_product() {
        let mut receiver = Receiver::new(FakeDevice::new(Some(0x1234), RawSample::default()));
        assert_eq!(receiver.begin(), DeviceStatus::UnrecognizedProduct);
        assert_eq!(receiver.read_rawvals(), DeviceStatus::UnrecognizedProduct);
    }

    #[test]
    fn test_unrecognized_product_warns_once() {
        let mut receiver = Receiver::new(FakeDevice::new(Some(0x1234), RawSample::default()));
        let warned = warnings::count(|| {
            for _ in 0..1000 {
                receiver.update();
            }
        });
        assert_eq!(warned, 1);
        assert_eq!(receiver.status(), DeviceStatus::UnrecognizedProduct);

        // Swapping in another unknown device after an unplug warns again
        receiver.device_mut().product_id = None;
        receiver.update();
        receiver.device_mut().product_id = Some(0x4321);
        assert_eq!(
            warnings::count(|| {
                receiver.update();
            }),
            1
        );
    }

    #[test]
    fn test_unplug_keeps_last_demands_and_recovers() {
        let mut axes = [0; 6];
        axes[0] = 32767;
        let mut receiver = taranis(axes);
        for _ in 0..3 {
            receiver.update();
        }
        let held = receiver.demands();
        assert!((held.throttle - 1.0).abs() < 1e-12);

        receiver.device_mut().sample = None;
        for _ in 0..3 {
            receiver.update();
        }
        assert_eq!(receiver.status(), DeviceStatus::Missing);
        assert_eq!(receiver.demands(), held);

        receiver.device_mut().sample = Some(RawSample::default());
        for _ in 0..3 {
            receiver.update();
        }
        assert_eq!(receiver.status(), DeviceStatus::Ok);
        assert!((receiver.demands().throttle - 0.5).abs() < 1e-12);
    }
}
