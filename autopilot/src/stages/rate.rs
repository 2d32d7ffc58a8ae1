use pid::{PIDError, PID};

use crate::stages::{bounded_pid, PidStage};
use crate::{Demand, VehicleState};

// Rates above this mean the pilot is flipping; integrating would only wind up
const BIG_GYRO_DEGREES_PER_SECOND: f64 = 40.0;
const BIG_YAW_DEMAND: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RateGains {
    pub cyclic_p: f64,
    pub cyclic_i: f64,
    pub cyclic_d: f64,
    pub yaw_p: f64,
    pub yaw_i: f64,
    /// Scale from stick demand to target rate in radians per second
    pub demands_to_rate: f64,
}

impl Default for RateGains {
    fn default() -> Self {
        RateGains {
            cyclic_p: 0.01,
            cyclic_i: 0.01,
            cyclic_d: 0.01,
            yaw_p: 0.025,
            yaw_i: 0.01,
            demands_to_rate: 8.0,
        }
    }
}

/// Innermost stage: tracks demanded angular rates against the gyro
#[derive(Debug, Clone)]
pub struct RateStage {
    roll: PID,
    pitch: PID,
    yaw: PID,
    demands_to_rate: f64,
}

impl RateStage {
    /// Fails if any gain is not a finite number
    pub fn new(gains: RateGains) -> Result<Self, PIDError> {
        if !gains.demands_to_rate.is_finite() {
            return Err(PIDError::InvalidGain(format!(
                "demands_to_rate value {} is not a valid number",
                gains.demands_to_rate
            )));
        }
        let cyclic = bounded_pid(gains.cyclic_p, gains.cyclic_i, gains.cyclic_d)?;

        Ok(RateStage {
            roll: cyclic.clone(),
            pitch: cyclic,
            yaw: bounded_pid(gains.yaw_p, gains.yaw_i, 0.0)?,
            demands_to_rate: gains.demands_to_rate,
        })
    }
}

impl PidStage for RateStage {
    fn update(&mut self, demand: Demand, state: &VehicleState, dt: f64) -> Demand {
        let big_rate = BIG_GYRO_DEGREES_PER_SECOND.to_radians();
        if state.roll_rate.abs() > big_rate || state.pitch_rate.abs() > big_rate {
            self.roll.reset_integral();
            self.pitch.reset_integral();
        }
        if demand.yaw.abs() > BIG_YAW_DEMAND {
            self.yaw.reset_integral();
        }

        let k = self.demands_to_rate;
        Demand {
            throttle: demand.throttle,
            roll: self.roll.update(demand.roll * k - state.roll_rate, dt),
            pitch: self.pitch.update(demand.pitch * k - state.pitch_rate, dt),
            yaw: self.yaw.update(demand.yaw * k - state.yaw_rate, dt),
        }
    }

    fn reset(&mut self) {
        self.roll.reset();
        self.pitch.reset();
        self.yaw.reset();
    }
}
