use std::{path::Path, time::Duration};

use anyhow::{ensure, Context};
use autopilot::{
    AltitudeHoldGains, AltitudeHoldStage, AuxState, LevelStage, PIDError, PidCascade, RateGains, RateStage,
};
use dynamics::Params;
use serde::{Deserialize, Serialize};

use crate::input::StickStep;
use crate::sensors::GyrometerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Dynamics and controller in one process
    #[default]
    Local,
    /// Controller only, flying a dynamics process across UDP
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub host: String,
    pub motor_port: u16,
    pub telemetry_port: u16,
    /// Emitter send period in microseconds
    pub period_us: u64,
}

impl LinkConfig {
    pub fn period(&self) -> Duration {
        Duration::from_micros(self.period_us)
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            host: "127.0.0.1".to_owned(),
            motor_port: 5000,
            telemetry_port: 5001,
            period_us: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    pub rate: RateGains,
    pub level_gain: f64,
    pub altitude: AltitudeHoldGains,
}

impl Default for TuningConfig {
    fn default() -> Self {
        TuningConfig {
            rate: RateGains::default(),
            level_gain: 0.1,
            altitude: AltitudeHoldGains::default(),
        }
    }
}

impl TuningConfig {
    /// Rate always, level from aux position 1, altitude hold from position 2
    pub fn cascade(&self) -> Result<PidCascade, PIDError> {
        Ok(PidCascade::new(RateStage::new(self.rate)?)
            .with_stage(LevelStage::new(self.level_gain), AuxState::Level)
            .with_stage(AltitudeHoldStage::new(self.altitude)?, AuxState::AltitudeHold))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitlConfig {
    pub mode: Mode,
    pub link: LinkConfig,
    /// Integration step in seconds
    pub dt: f64,
    /// Simulated seconds to run, zero to run until stopped
    pub duration: f64,
    /// Pace the loop against the wall clock
    pub realtime: bool,
    /// Log telemetry every this many ticks, zero to disable
    pub log_every: u64,
    pub vehicle: Params,
    pub tuning: TuningConfig,
    pub gyrometer: GyrometerConfig,
    pub script: Vec<StickStep>,
}

impl Default for SitlConfig {
    fn default() -> Self {
        SitlConfig {
            mode: Mode::Local,
            link: LinkConfig::default(),
            dt: 0.001,
            duration: 10.0,
            realtime: true,
            log_every: 500,
            vehicle: Params::big_quad(),
            tuning: TuningConfig::default(),
            gyrometer: GyrometerConfig::default(),
            script: default_script(),
        }
    }
}

/// Sit on the ground, climb in altitude hold, then hold with a centered stick
fn default_script() -> Vec<StickStep> {
    vec![
        StickStep {
            until: 1.0,
            throttle: -1.0,
            aux: 1.0,
            ..Default::default()
        },
        StickStep {
            until: 3.0,
            throttle: 1.0,
            aux: 1.0,
            ..Default::default()
        },
        StickStep {
            until: f64::MAX,
            throttle: 0.0,
            aux: 1.0,
            ..Default::default()
        },
    ]
}

impl SitlConfig {
    /// Defaults when `path` is `None`, otherwise JSON with any field optional
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config = match path {
            None => SitlConfig::default(),
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                Self::from_json(&content).with_context(|| format!("Invalid config {}", path.display()))?
            }
        };
        Ok(config)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: SitlConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Config file path taken from the first command line argument
    pub fn from_args() -> anyhow::Result<Self> {
        let path = std::env::args().nth(1);
        Self::load(path.as_deref().map(Path::new))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.dt > 0.0 && self.dt.is_finite(), "dt must be positive, got {}", self.dt);
        ensure!(self.duration >= 0.0, "duration must not be negative, got {}", self.duration);
        ensure!(self.vehicle.m > 0.0, "vehicle mass must be positive");
        self.tuning.cascade().context("Invalid tuning")?;
        Ok(())
    }

    /// Number of ticks to run, `None` for unbounded
    pub fn ticks(&self) -> Option<u64> {
        (self.duration > 0.0).then(|| (self.duration / self.dt).round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(SitlConfig::from_json("{}").unwrap(), SitlConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = SitlConfig::from_json(
            r#"{
                "mode": "remote",
                "dt": 0.002,
                "link": { "motor_port": 6000 },
                "vehicle": { "m": 2.0 },
                "tuning": { "rate": { "yaw_p": 0.5 } },
                "gyrometer": { "noise": 0.01, "seed": 3 },
                "script": [ { "until": 2.0, "throttle": 0.5 } ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.mode, Mode::Remote);
        assert_eq!(config.dt, 0.002);
        assert_eq!(config.link.motor_port, 6000);
        assert_eq!(config.link.telemetry_port, 5001);
        assert_eq!(config.vehicle.m, 2.0);
        assert_eq!(config.vehicle.b, Params::big_quad().b);
        assert_eq!(config.tuning.rate.yaw_p, 0.5);
        assert_eq!(config.tuning.rate.demands_to_rate, 8.0);
        assert_eq!(config.gyrometer.seed, 3);
        assert_eq!(config.script.len(), 1);
        assert_eq!(config.script[0].aux, 0.0);
        assert_eq!(config.ticks(), Some(5000));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(SitlConfig::from_json(r#"{ "dt": 0.0 }"#).is_err());
        assert!(SitlConfig::from_json(r#"{ "duration": -1.0 }"#).is_err());
        assert!(SitlConfig::from_json(r#"{ "mode": "orbit" }"#).is_err());
        assert!(SitlConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_rejects_non_finite_gains() {
        let mut config = SitlConfig::default();
        assert!(config.tuning.cascade().is_ok());

        config.tuning.rate.cyclic_d = f64::INFINITY;
        assert!(config.tuning.cascade().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(SitlConfig::load(Some(Path::new("/nonexistent/sitl.json"))).is_err());
        assert!(SitlConfig::load(None).is_ok());
    }

    #[test]
    fn test_zero_duration_runs_forever() {
        let config = SitlConfig {
            duration: 0.0,
            ..Default::default()
        };
        assert_eq!(config.ticks(), None);
    }
}
