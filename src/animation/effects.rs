//! Procedural parameter effects: eye blink and breathing.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::CoreModel;

pub const PARAM_ANGLE_X: &str = "ParamAngleX";
pub const PARAM_ANGLE_Y: &str = "ParamAngleY";
pub const PARAM_ANGLE_Z: &str = "ParamAngleZ";
pub const PARAM_BODY_ANGLE_X: &str = "ParamBodyAngleX";
pub const PARAM_EYE_BALL_X: &str = "ParamEyeBallX";
pub const PARAM_EYE_BALL_Y: &str = "ParamEyeBallY";
pub const PARAM_BREATH: &str = "ParamBreath";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlinkState {
    First,
    Interval,
    Closing,
    Closed,
    Opening,
}

/// Periodic eye blink written to every eye-blink parameter.
pub struct EyeBlink {
    ids: Vec<String>,
    state: BlinkState,
    next_blink_time: f32,
    state_start_time: f32,
    user_time: f32,
    blink_interval: f32,
    closing: f32,
    closed: f32,
    opening: f32,
    rng: StdRng,
}

impl EyeBlink {
    #[must_use]
    pub fn new(ids: Vec<String>, seed: u64) -> Self {
        Self {
            ids,
            state: BlinkState::First,
            next_blink_time: 0.0,
            state_start_time: 0.0,
            user_time: 0.0,
            blink_interval: 4.0,
            closing: 0.1,
            closed: 0.05,
            opening: 0.15,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[must_use]
    pub fn state(&self) -> BlinkState {
        self.state
    }

    pub fn set_blinking_interval(&mut self, seconds: f32) {
        self.blink_interval = seconds;
    }

    pub fn set_blinking_settings(&mut self, closing: f32, closed: f32, opening: f32) {
        self.closing = closing;
        self.closed = closed;
        self.opening = opening;
    }

    fn next_blinking_timing(&mut self) -> f32 {
        let r: f32 = self.rng.random();
        self.user_time + r * (2.0 * self.blink_interval - 1.0)
    }

    pub fn update_parameters(&mut self, model: &mut dyn CoreModel, dt: f32) {
        self.user_time += dt;

        let value = match self.state {
            BlinkState::Closing => {
                let t = (self.user_time - self.state_start_time) / self.closing;
                if t >= 1.0 {
                    self.state = BlinkState::Closed;
                    self.state_start_time = self.user_time;
                    0.0
                } else {
                    1.0 - t
                }
            }
            BlinkState::Closed => {
                let t = (self.user_time - self.state_start_time) / self.closed;
                if t >= 1.0 {
                    self.state = BlinkState::Opening;
                    self.state_start_time = self.user_time;
                }
                0.0
            }
            BlinkState::Opening => {
                let t = (self.user_time - self.state_start_time) / self.opening;
                if t >= 1.0 {
                    self.state = BlinkState::Interval;
                    self.next_blink_time = self.next_blinking_timing();
                    1.0
                } else {
                    t
                }
            }
            BlinkState::Interval => {
                if self.next_blink_time < self.user_time {
                    self.state = BlinkState::Closing;
                    self.state_start_time = self.user_time;
                }
                1.0
            }
            BlinkState::First => {
                self.state = BlinkState::Interval;
                self.next_blink_time = self.next_blinking_timing();
                1.0
            }
        };

        for id in &self.ids {
            model.set_parameter_value(id, value, 1.0);
        }
    }
}

/// One breathing oscillator: `offset + peak * sin(t / cycle)` added at `weight`.
#[derive(Debug, Clone, PartialEq)]
pub struct BreathParameter {
    pub id: String,
    pub offset: f32,
    pub peak: f32,
    pub cycle: f32,
    pub weight: f32,
}

impl BreathParameter {
    #[must_use]
    pub fn new(id: &str, offset: f32, peak: f32, cycle: f32, weight: f32) -> Self {
        Self {
            id: id.to_string(),
            offset,
            peak,
            cycle,
            weight,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Breath {
    parameters: Vec<BreathParameter>,
    current_time: f32,
}

impl Breath {
    #[must_use]
    pub fn new(parameters: Vec<BreathParameter>) -> Self {
        Self {
            parameters,
            current_time: 0.0,
        }
    }

    /// The head/body sway and chest breathing used for every model.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            BreathParameter::new(PARAM_ANGLE_X, 0.0, 15.0, 6.5345, 0.5),
            BreathParameter::new(PARAM_ANGLE_Y, 0.0, 8.0, 3.5345, 0.5),
            BreathParameter::new(PARAM_ANGLE_Z, 0.0, 10.0, 5.5345, 0.5),
            BreathParameter::new(PARAM_BODY_ANGLE_X, 0.0, 4.0, 15.5345, 0.5),
            BreathParameter::new(PARAM_BREATH, 0.5, 0.5, 3.2345, 1.0),
        ])
    }

    #[must_use]
    pub fn parameters(&self) -> &[BreathParameter] {
        &self.parameters
    }

    pub fn update_parameters(&mut self, model: &mut dyn CoreModel, dt: f32) {
        self.current_time += dt;
        let t = self.current_time * 2.0 * std::f32::consts::PI;
        for p in &self.parameters {
            model.add_parameter_value(&p.id, p.offset + p.peak * (t / p.cycle).sin(), p.weight);
        }
    }
}
