use std::collections::VecDeque;

use autopilot::{Sensor, VehicleState};
use dynamics::State;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GyrometerConfig {
    /// Half-width of the uniform noise added to each axis, in radians per second
    pub noise: f64,
    /// Samples of latency between truth and report
    pub delay: usize,
    pub seed: u64,
}

impl Default for GyrometerConfig {
    fn default() -> Self {
        GyrometerConfig {
            noise: 0.0,
            delay: 0,
            seed: 0,
        }
    }
}

/// Angular rate sensor with optional noise and latency
pub struct Gyrometer {
    noise: f64,
    delay: usize,
    rng: Xoshiro256PlusPlus,
    samples: VecDeque<[f64; 3]>,
}

impl Gyrometer {
    pub fn new(config: GyrometerConfig) -> Self {
        Gyrometer {
            noise: config.noise.abs(),
            delay: config.delay,
            rng: Xoshiro256PlusPlus::seed_from_u64(config.seed),
            samples: VecDeque::with_capacity(config.delay + 1),
        }
    }

    fn noise(&mut self) -> f64 {
        if self.noise > 0.0 {
            self.rng.gen_range(-self.noise..=self.noise)
        } else {
            0.0
        }
    }
}

impl Sensor for Gyrometer {
    // Samples on every tick so the delay line advances with time
    fn ready(&mut self, truth: &State, _time: f64) -> bool {
        let rates = truth.angular_velocity;
        let sample = [
            rates.x + self.noise(),
            rates.y + self.noise(),
            rates.z + self.noise(),
        ];
        self.samples.push_back(sample);
        self.samples.len() > self.delay
    }

    fn modify_state(&mut self, _truth: &State, state: &mut VehicleState, _time: f64) {
        while self.samples.len() > self.delay + 1 {
            self.samples.pop_front();
        }
        if let Some([roll_rate, pitch_rate, yaw_rate]) = self.samples.pop_front() {
            state.roll_rate = roll_rate;
            state.pitch_rate = pitch_rate;
            state.yaw_rate = yaw_rate;
        }
    }

    fn reset(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynamics::{Pose, Vector3};

    fn spinning(rate: f64) -> State {
        State::from_parts(Pose::origin(), Vector3::zeros(), Vector3::new(rate, -rate, 2.0 * rate))
    }

    #[test]
    fn test_noiseless_reports_truth() {
        let mut gyro = Gyrometer::new(GyrometerConfig::default());
        let mut state = VehicleState::default();
        let truth = spinning(0.5);

        assert!(gyro.ready(&truth, 0.0));
        gyro.modify_state(&truth, &mut state, 0.0);
        assert_eq!((state.roll_rate, state.pitch_rate, state.yaw_rate), (0.5, -0.5, 1.0));
    }

    #[test]
    fn test_noise_is_bounded_and_seeded() {
        let config = GyrometerConfig {
            noise: 0.01,
            delay: 0,
            seed: 7,
        };
        let mut a = Gyrometer::new(config);
        let mut b = Gyrometer::new(config);
        let truth = spinning(0.0);

        let mut differs = false;
        for i in 0..100 {
            let time = i as f64 * 0.001;
            let (mut sa, mut sb) = (VehicleState::default(), VehicleState::default());
            if a.ready(&truth, time) {
                a.modify_state(&truth, &mut sa, time);
            }
            if b.ready(&truth, time) {
                b.modify_state(&truth, &mut sb, time);
            }
            assert_eq!(sa, sb);
            assert!(sa.roll_rate.abs() <= 0.01 && sa.yaw_rate.abs() <= 0.01);
            differs |= sa.roll_rate != 0.0;
        }
        assert!(differs);
    }

    #[test]
    fn test_delay_line() {
        let mut gyro = Gyrometer::new(GyrometerConfig {
            delay: 2,
            ..Default::default()
        });
        let mut state = VehicleState::default();

        let mut reported = Vec::new();
        for i in 0..5 {
            let truth = spinning(i as f64);
            if gyro.ready(&truth, i as f64) {
                gyro.modify_state(&truth, &mut state, i as f64);
                reported.push(state.roll_rate);
            }
        }
        assert_eq!(reported, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_reset_drops_delayed_samples() {
        let mut gyro = Gyrometer::new(GyrometerConfig {
            delay: 2,
            ..Default::default()
        });
        let mut state = VehicleState::default();
        for i in 0..5 {
            let truth = spinning(1.0 + i as f64);
            if gyro.ready(&truth, i as f64) {
                gyro.modify_state(&truth, &mut state, i as f64);
            }
        }

        gyro.reset();
        let still = spinning(0.0);
        for i in 0..3 {
            if gyro.ready(&still, i as f64) {
                gyro.modify_state(&still, &mut state, i as f64);
                assert_eq!(state.roll_rate, 0.0, "stale rate after reset at tick {i}");
            }
        }
    }
}
