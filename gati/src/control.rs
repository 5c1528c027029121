//! Turn controllers.
//!
//! A follower hands its controller the signed heading error in degrees
//! (positive means counter-clockwise to reach the target) and receives the
//! rotational component `vz` of the translation it emits.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maps a heading error to a rotational command.
pub trait TurnController {
    /// Rotational output for a signed heading error in degrees.
    fn calculate(&mut self, delta_deg: f64) -> f64;

    /// Drop any accumulated state. Called when a follower starts.
    fn reset(&mut self) {}
}

impl<T: TurnController + ?Sized> TurnController for Box<T> {
    fn calculate(&mut self, delta_deg: f64) -> f64 {
        (**self).calculate(delta_deg)
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Turn controller selection, as read from `[follower.turn]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnControllerConfig {
    Proportional {
        #[serde(default = "default_coefficient")]
        coefficient: f64,
        #[serde(default = "default_max_output")]
        max_output: f64,
    },
    Pid {
        kp: f64,
        #[serde(default)]
        ki: f64,
        #[serde(default)]
        kd: f64,
        #[serde(default = "default_max_output")]
        max_output: f64,
    },
}

fn default_coefficient() -> f64 {
    0.02
}

fn default_max_output() -> f64 {
    1.0
}

impl Default for TurnControllerConfig {
    fn default() -> Self {
        Self::Proportional {
            coefficient: default_coefficient(),
            max_output: default_max_output(),
        }
    }
}

impl TurnControllerConfig {
    /// Instantiate the configured controller.
    pub fn build(&self) -> Result<Box<dyn TurnController>, ConfigError> {
        Ok(match *self {
            Self::Proportional {
                coefficient,
                max_output,
            } => Box::new(ProportionalController::new(coefficient, max_output)?),
            Self::Pid {
                kp,
                ki,
                kd,
                max_output,
            } => Box::new(PidController::new(kp, ki, kd, max_output)?),
        })
    }
}

/// Output limits must be finite and positive; `f64::clamp` panics otherwise.
fn validate_max_output(max_output: f64) -> Result<f64, ConfigError> {
    if !max_output.is_finite() || max_output <= 0.0 {
        return Err(ConfigError::InvalidValue {
            field: "follower.turn.max_output",
            reason: format!("must be positive, got {}", max_output),
        });
    }
    Ok(max_output)
}

fn validate_gain(gain: f64) -> Result<f64, ConfigError> {
    if !gain.is_finite() {
        return Err(ConfigError::NonFinite("controller gain"));
    }
    Ok(gain)
}

/// `vz = clamp(coefficient * delta)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProportionalController {
    coefficient: f64,
    max_output: f64,
}

impl ProportionalController {
    pub fn new(coefficient: f64, max_output: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            coefficient: validate_gain(coefficient)?,
            max_output: validate_max_output(max_output)?,
        })
    }
}

impl Default for ProportionalController {
    fn default() -> Self {
        Self {
            coefficient: default_coefficient(),
            max_output: default_max_output(),
        }
    }
}

impl TurnController for ProportionalController {
    fn calculate(&mut self, delta_deg: f64) -> f64 {
        (self.coefficient * delta_deg).clamp(-self.max_output, self.max_output)
    }
}

/// PID on heading error, evaluated once per tick.
///
/// The integral term is bounded so that `ki * integral` alone can never
/// exceed the output limit.
#[derive(Clone, Debug, PartialEq)]
pub struct PidController {
    kp: f64,
    ki: f64,
    kd: f64,
    max_output: f64,
    integral: f64,
    previous: Option<f64>,
}

impl PidController {
    pub fn new(kp: f64, ki: f64, kd: f64, max_output: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            kp: validate_gain(kp)?,
            ki: validate_gain(ki)?,
            kd: validate_gain(kd)?,
            max_output: validate_max_output(max_output)?,
            integral: 0.0,
            previous: None,
        })
    }

    /// Accumulated integral term.
    pub fn integral(&self) -> f64 {
        self.integral
    }
}

impl TurnController for PidController {
    fn calculate(&mut self, delta_deg: f64) -> f64 {
        self.integral += delta_deg;
        if self.ki != 0.0 {
            let i_max = self.max_output / self.ki.abs();
            self.integral = self.integral.clamp(-i_max, i_max);
        }

        let derivative = self.previous.map_or(0.0, |prev| delta_deg - prev);
        self.previous = Some(delta_deg);

        let output = self.kp * delta_deg + self.ki * self.integral + self.kd * derivative;
        output.clamp(-self.max_output, self.max_output)
    }

    fn reset(&mut self) {
        self.integral = 0.0;
        self.previous = None;
    }
}
