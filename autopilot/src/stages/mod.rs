mod althold;
mod level;
mod rate;

use pid::{PIDError, PID};

use crate::{AuxState, Demand, VehicleState};

pub use althold::{AltitudeHoldGains, AltitudeHoldStage};
pub use level::LevelStage;
pub use rate::{RateGains, RateStage};

// Bound on the integral term of every stage PID
const WINDUP_MAX: f64 = 0.4;

fn bounded_pid(kp: f64, ki: f64, kd: f64) -> Result<PID, PIDError> {
    let mut pid = PID::default();
    pid.set_kp(kp)?.set_ki(ki)?.set_kd(kd)?;
    pid.with_limits(WINDUP_MAX, 0.0)
}

/// One stage of the control cascade, transforming demands toward motor space
pub trait PidStage {
    fn update(&mut self, demand: Demand, state: &VehicleState, dt: f64) -> Demand;

    /// Clear integrators and derivative history
    fn reset(&mut self);

    /// Called on ticks where the aux switch leaves this stage out
    fn disengaged(&mut self) {}
}

struct OuterStage {
    engage_at: AuxState,
    stage: Box<dyn PidStage>,
}

/// Ordered PID stages selected by the aux switch.
///
/// Outer stages run in the order they were added, each when the aux switch is
/// at or above the position it was registered with. The rate stage always runs last.
pub struct PidCascade {
    outer: Vec<OuterStage>,
    rate: RateStage,
}

impl PidCascade {
    pub fn new(rate: RateStage) -> Self {
        PidCascade {
            outer: Vec::new(),
            rate,
        }
    }

    /// Rate, level from position 1, altitude hold from position 2
    pub fn standard() -> Result<Self, PIDError> {
        Ok(PidCascade::new(RateStage::new(RateGains::default())?)
            .with_stage(LevelStage::default(), AuxState::Level)
            .with_stage(AltitudeHoldStage::new(AltitudeHoldGains::default())?, AuxState::AltitudeHold))
    }

    pub fn with_stage(mut self, stage: impl PidStage + 'static, engage_at: AuxState) -> Self {
        self.add_stage(Box::new(stage), engage_at);
        self
    }

    pub fn add_stage(&mut self, stage: Box<dyn PidStage>, engage_at: AuxState) {
        self.outer.push(OuterStage { engage_at, stage });
    }

    /// Number of stages that would run at `aux`, the rate stage included
    pub fn active_stages(&self, aux: AuxState) -> usize {
        1 + self.outer.iter().filter(|s| aux >= s.engage_at).count()
    }

    pub fn update(&mut self, demand: Demand, state: &VehicleState, aux: AuxState, dt: f64) -> Demand {
        let mut demand = demand;
        for outer in self.outer.iter_mut() {
            if aux >= outer.engage_at {
                demand = outer.stage.update(demand, state, dt);
            } else {
                outer.stage.disengaged();
            }
        }
        self.rate.update(demand, state, dt)
    }

    pub fn reset(&mut self) {
        for outer in self.outer.iter_mut() {
            outer.stage.reset();
        }
        self.rate.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flying() -> VehicleState {
        VehicleState {
            roll: 0.1,
            pitch: -0.05,
            roll_rate: 0.2,
            pitch_rate: -0.1,
            yaw_rate: 0.05,
            altitude: 3.0,
            variometer: 0.2,
            ..Default::default()
        }
    }

    #[test]
    fn test_active_stage_counts() {
        let cascade = PidCascade::standard().unwrap();
        assert_eq!(cascade.active_stages(AuxState::Rate), 1);
        assert_eq!(cascade.active_stages(AuxState::Level), 2);
        assert_eq!(cascade.active_stages(AuxState::AltitudeHold), 3);
    }

    #[test]
    fn test_rate_position_runs_rate_stage_only() {
        let demand = Demand::new(0.6, 0.2, -0.1, 0.05);
        let state = flying();

        let mut cascade = PidCascade::standard().unwrap();
        let mut rate = RateStage::new(RateGains::default()).unwrap();
        for _ in 0..5 {
            let expected = rate.update(demand, &state, 0.01);
            assert_eq!(cascade.update(demand, &state, AuxState::Rate, 0.01), expected);
        }
    }

    #[test]
    fn test_level_position_feeds_level_into_rate() {
        let demand = Demand::new(0.6, 0.2, -0.1, 0.05);
        let state = flying();

        let mut cascade = PidCascade::standard().unwrap();
        let mut level = LevelStage::default();
        let mut rate = RateStage::new(RateGains::default()).unwrap();
        for _ in 0..5 {
            let expected = rate.update(level.update(demand, &state, 0.01), &state, 0.01);
            assert_eq!(cascade.update(demand, &state, AuxState::Level, 0.01), expected);
        }
    }

    #[test]
    fn test_altitude_hold_position_runs_all_stages_in_order() {
        let demand = Demand::new(0.5, 0.2, -0.1, 0.05);
        let state = flying();

        let mut cascade = PidCascade::standard().unwrap();
        let mut level = LevelStage::default();
        let mut althold = AltitudeHoldStage::new(AltitudeHoldGains::default()).unwrap();
        let mut rate = RateStage::new(RateGains::default()).unwrap();
        for _ in 0..5 {
            let outer = althold.update(level.update(demand, &state, 0.01), &state, 0.01);
            let expected = rate.update(outer, &state, 0.01);
            assert_eq!(cascade.update(demand, &state, AuxState::AltitudeHold, 0.01), expected);
        }
    }

    #[test]
    fn test_reset_restores_fresh_behavior() {
        let demand = Demand::new(0.6, 0.4, 0.2, 0.0);
        let state = flying();

        let mut cascade = PidCascade::standard().unwrap();
        let first = cascade.update(demand, &state, AuxState::Level, 0.01);
        for _ in 0..20 {
            cascade.update(demand, &state, AuxState::Level, 0.01);
        }
        assert_ne!(cascade.update(demand, &state, AuxState::Level, 0.01), first);

        cascade.reset();
        assert_eq!(cascade.update(demand, &state, AuxState::Level, 0.01), first);
    }
}
