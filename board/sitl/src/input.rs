use std::sync::{Arc, Mutex, PoisonError};

use autopilot::{
    lookup_profile, CHANNEL_AUX1, CHANNEL_PITCH, CHANNEL_ROLL, CHANNEL_THROTTLE, CHANNEL_YAW, PRODUCT_TARANIS,
};
use hal::{InputDevice, RawSample, AXIS_FULL_SCALE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy)]
struct Feed {
    product_id: Option<u16>,
    sample: Option<RawSample>,
}

/// Input device whose readings are pushed in by the host, from any thread
#[derive(Debug, Clone)]
pub struct HostFeed {
    feed: Arc<Mutex<Feed>>,
}

/// Writer side of a [`HostFeed`]
#[derive(Debug, Clone)]
pub struct FeedHandle {
    feed: Arc<Mutex<Feed>>,
}

impl HostFeed {
    /// A feed that reports `product_id`, with centered axes until the first push
    pub fn new(product_id: Option<u16>) -> (HostFeed, FeedHandle) {
        let feed = Arc::new(Mutex::new(Feed {
            product_id,
            sample: product_id.map(|_| RawSample::default()),
        }));
        (HostFeed { feed: feed.clone() }, FeedHandle { feed })
    }
}

impl FeedHandle {
    pub fn push(&self, sample: RawSample) {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).sample = Some(sample);
    }

    /// Simulate unplugging the device
    pub fn disconnect(&self) {
        let mut feed = self.feed.lock().unwrap_or_else(PoisonError::into_inner);
        feed.product_id = None;
        feed.sample = None;
    }

    pub fn connect(&self, product_id: u16) {
        let mut feed = self.feed.lock().unwrap_or_else(PoisonError::into_inner);
        feed.product_id = Some(product_id);
        feed.sample.get_or_insert_with(RawSample::default);
    }
}

impl InputDevice for HostFeed {
    fn product_id(&mut self) -> Option<u16> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).product_id
    }

    fn poll(&mut self) -> Option<RawSample> {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).sample
    }
}

/// Stick positions held until `until` seconds of simulation time.
///
/// All values are normalized to [-1, 1]; throttle -1 is idle, aux -1 selects
/// the rate stage and +1 altitude hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickStep {
    pub until: f64,
    pub throttle: f64,
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub aux: f64,
}

impl Default for StickStep {
    fn default() -> Self {
        StickStep {
            until: f64::INFINITY,
            throttle: -1.0,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            aux: 0.0,
        }
    }
}

/// Scripted pilot for unattended runs, played back as a transmitter
#[derive(Debug, Clone, Default)]
pub struct StickScript {
    steps: Vec<StickStep>,
}

impl StickScript {
    pub fn new(steps: Vec<StickStep>) -> Self {
        StickScript { steps }
    }

    /// The step in effect at `time`; past the end the last step holds
    pub fn step_at(&self, time: f64) -> StickStep {
        self.steps
            .iter()
            .find(|step| time < step.until)
            .or(self.steps.last())
            .copied()
            .unwrap_or_default()
    }

    /// Raw transmitter reading for `time`, laid out as the product this
    /// script plays back as
    pub fn sample(&self, time: f64) -> RawSample {
        let step = self.step_at(time);
        let mut channels = [0.0; 5];
        channels[CHANNEL_THROTTLE] = step.throttle;
        channels[CHANNEL_ROLL] = step.roll;
        channels[CHANNEL_PITCH] = step.pitch;
        channels[CHANNEL_YAW] = step.yaw;
        channels[CHANNEL_AUX1] = step.aux;

        let mut axes = [0; hal::AXIS_COUNT];
        if let Some(profile) = lookup_profile(Self::product_id()) {
            for (channel, &axis) in profile.axis_map.iter().enumerate() {
                let value = (channels[channel].clamp(-1.0, 1.0) * AXIS_FULL_SCALE).round() as i32;
                axes[axis] = value + profile.baseline;
            }
        }
        RawSample::new(axes, 0)
    }

    pub fn product_id() -> u16 {
        PRODUCT_TARANIS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autopilot::{AuxState, Receiver};

    #[test]
    fn test_feed_reaches_device() {
        let (mut device, handle) = HostFeed::new(Some(PRODUCT_TARANIS));
        assert_eq!(device.product_id(), Some(PRODUCT_TARANIS));
        assert_eq!(device.poll(), Some(RawSample::default()));

        let sample = RawSample::new([1, 2, 3, 4, 5, 6], 1);
        let writer = handle.clone();
        std::thread::spawn(move || writer.push(sample)).join().unwrap();
        assert_eq!(device.poll(), Some(sample));

        handle.disconnect();
        assert_eq!(device.product_id(), None);
        assert_eq!(device.poll(), None);
    }

    #[test]
    fn test_script_steps() {
        let script = StickScript::new(vec![
            StickStep {
                until: 1.0,
                throttle: 0.5,
                ..Default::default()
            },
            StickStep {
                until: 2.0,
                throttle: -0.5,
                ..Default::default()
            },
        ]);
        assert_eq!(script.step_at(0.0).throttle, 0.5);
        assert_eq!(script.step_at(1.5).throttle, -0.5);
        assert_eq!(script.step_at(10.0).throttle, -0.5);
        assert_eq!(StickScript::default().step_at(0.0), StickStep::default());
    }

    #[test]
    fn test_script_plays_back_through_receiver() {
        let script = StickScript::new(vec![StickStep {
            throttle: 1.0,
            roll: -1.0,
            aux: 1.0,
            ..Default::default()
        }]);
        let (device, handle) = HostFeed::new(Some(StickScript::product_id()));
        handle.push(script.sample(0.0));

        let mut receiver = Receiver::new(device);
        for _ in 0..3 {
            receiver.update();
        }
        let demands = receiver.demands();
        assert!((demands.throttle - 1.0).abs() < 1e-12);
        assert!((demands.roll + 0.45).abs() < 1e-12);
        assert_eq!(demands.pitch, 0.0);
        assert_eq!(receiver.aux1_state(), AuxState::AltitudeHold);
    }
}
