use pid::{PIDError, PID};

use crate::stages::{bounded_pid, PidStage};
use crate::{Demand, VehicleState};

const PILOT_VELZ_MAX: f64 = 2.5;
const STICK_DEADBAND: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AltitudeHoldGains {
    /// Altitude error (m) to target climb rate (m/s)
    pub altitude_p: f64,
    pub velocity_p: f64,
    pub velocity_i: f64,
    pub velocity_d: f64,
    /// Throttle that roughly balances gravity
    pub hover_throttle: f64,
    /// Below this altitude the stage passes throttle through
    pub min_altitude: f64,
}

impl Default for AltitudeHoldGains {
    fn default() -> Self {
        AltitudeHoldGains {
            altitude_p: 1.0,
            velocity_p: 0.2,
            velocity_i: 0.05,
            velocity_d: 0.0,
            hover_throttle: 0.56,
            min_altitude: 0.5,
        }
    }
}

/// Holds altitude with a centered throttle stick, and turns stick deflection
/// outside the deadband into a climb or sink rate.
#[derive(Debug, Clone)]
pub struct AltitudeHoldStage {
    velocity: PID,
    gains: AltitudeHoldGains,
    target: f64,
    in_band: bool,
}

impl AltitudeHoldStage {
    /// Fails if a velocity gain is not a finite number
    pub fn new(gains: AltitudeHoldGains) -> Result<Self, PIDError> {
        Ok(AltitudeHoldStage {
            velocity: bounded_pid(gains.velocity_p, gains.velocity_i, gains.velocity_d)?,
            gains,
            target: 0.0,
            in_band: false,
        })
    }

    /// Altitude captured when the stick last entered the deadband
    pub fn target(&self) -> f64 {
        self.target
    }
}

impl PidStage for AltitudeHoldStage {
    fn update(&mut self, demand: Demand, state: &VehicleState, dt: f64) -> Demand {
        if state.altitude < self.gains.min_altitude {
            self.in_band = false;
            return demand;
        }

        let stick = 2.0 * demand.throttle - 1.0;
        let in_band = stick.abs() < STICK_DEADBAND;
        if in_band && !self.in_band {
            self.target = state.altitude;
        }
        self.in_band = in_band;

        let target_velocity = if in_band {
            (self.gains.altitude_p * (self.target - state.altitude)).clamp(-PILOT_VELZ_MAX, PILOT_VELZ_MAX)
        } else {
            PILOT_VELZ_MAX * stick
        };
        let correction = self.velocity.update(target_velocity - state.variometer, dt);

        Demand {
            throttle: (self.gains.hover_throttle + correction).clamp(0.0, 1.0),
            ..demand
        }
    }

    fn reset(&mut self) {
        self.velocity.reset();
        self.in_band = false;
    }

    fn disengaged(&mut self) {
        self.in_band = false;
    }
}
