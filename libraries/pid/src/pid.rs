// PID controller with integral windup and output limits
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PIDError {
    #[error("Invalid gain configuration: {0}")]
    InvalidGain(String),

    #[error("Invalid max value: {0} must not be negative")]
    InvalidMaxValue(String),
}

#[derive(Debug, Clone, Default)]
pub struct PID {
    kp: f64,
    ki: f64,
    kd: f64,

    last_error: f64,
    integral: f64,
    max_integral: f64,
    max_output: f64,
}

impl PID {
    /// Create a new PID controller with the specified gains.
    ///
    /// Note: By default the integral and output are unbounded.
    /// Use `with_limits()` or the setter methods to add constraints.
    ///
    /// # Arguments
    ///
    /// * `kp` - Proportional gain
    /// * `ki` - Integral gain, applied per second of accumulated error
    /// * `kd` - Derivative gain, applied to the error rate of change
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            last_error: 0.0,
            integral: 0.0,
            max_integral: 0.0, // Zero means no integral limit
            max_output: 0.0,   // Zero means no output limit
        }
    }

    pub fn kp(&self) -> f64 {
        self.kp
    }

    pub fn ki(&self) -> f64 {
        self.ki
    }

    pub fn kd(&self) -> f64 {
        self.kd
    }

    pub fn max_integral(&self) -> f64 {
        self.max_integral
    }

    pub fn max_output(&self) -> f64 {
        self.max_output
    }

    /// Accumulated integral contribution, already scaled by `ki`
    pub fn integral(&self) -> f64 {
        self.integral
    }

    pub fn set_kp(&mut self, kp: f64) -> Result<&mut Self, PIDError> {
        self.kp = check_gain("kp", kp)?;
        Ok(self)
    }

    pub fn set_ki(&mut self, ki: f64) -> Result<&mut Self, PIDError> {
        self.ki = check_gain("ki", ki)?;
        Ok(self)
    }

    pub fn set_kd(&mut self, kd: f64) -> Result<&mut Self, PIDError> {
        self.kd = check_gain("kd", kd)?;
        Ok(self)
    }

    pub fn set_max_integral(&mut self, max_integral: f64) -> Result<&mut Self, PIDError> {
        self.max_integral = check_limit("max_integral", max_integral)?;
        self.integral = limit(self.integral, self.max_integral);
        Ok(self)
    }

    pub fn set_max_output(&mut self, max_output: f64) -> Result<&mut Self, PIDError> {
        self.max_output = check_limit("max_output", max_output)?;
        Ok(self)
    }

    pub fn with_limits(mut self, max_integral: f64, max_output: f64) -> Result<Self, PIDError> {
        self.set_max_integral(max_integral)?;
        self.set_max_output(max_output)?;
        Ok(self)
    }

    /// Run one step on `error` (setpoint minus measurement) over `dt` seconds.
    ///
    /// A non-positive or non-finite `dt` yields the proportional and stored
    /// integral terms only, without accumulating.
    pub fn update(&mut self, error: f64, dt: f64) -> f64 {
        // Validate inputs to prevent NaN propagation
        if !error.is_finite() {
            return 0.0;
        }

        let p = self.kp * error;

        if !(dt > 0.0 && dt.is_finite()) {
            self.last_error = error;
            return limit(p + self.integral, self.max_output);
        }

        let d = self.kd * (error - self.last_error) / dt;
        self.integral = limit(self.integral + self.ki * error * dt, self.max_integral);
        self.last_error = error;

        limit(p + self.integral + d, self.max_output)
    }

    /// Drop the accumulated integral but keep the derivative history
    pub fn reset_integral(&mut self) {
        self.integral = 0.0;
    }

    pub fn reset(&mut self) {
        self.last_error = 0.0;
        self.integral = 0.0;
    }
}

fn check_gain(name: &str, value: f64) -> Result<f64, PIDError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PIDError::InvalidGain(format!("{name} value {value} is not a valid number")))
    }
}

fn check_limit(name: &str, value: f64) -> Result<f64, PIDError> {
    if !value.is_finite() {
        return Err(PIDError::InvalidGain(format!("{name} value {value} is not a valid number")));
    }
    if value < 0.0 {
        return Err(PIDError::InvalidMaxValue(format!("{name} value {value}")));
    }
    Ok(value)
}

/// Clamp to ±`max`, where zero means unbounded
fn limit(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        value.clamp(-max, max)
    } else {
        value
    }
}
