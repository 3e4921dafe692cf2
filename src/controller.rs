// Copyright © 2025 Hs293Go
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the "Software"),
// to deal in the Software without restriction, including without limitation
// the rights to use, copy, modify, merge, publish, distribute, sublicense,
// and/or sell copies of the Software, and to permit persons to whom the
// Software is furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included
// in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES
// OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT.
// IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
// DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT,
// TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE
// OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use num_traits::float::FloatCore;

use crate::config::{ActuatorConfig, ControllerConfig, PdPiConfig, PiPiConfig, PidConfig};
use crate::pid::{self, clamp, PidErrorState, PidGains};
use crate::state::{ControllerState, PdPiState, PiPiState, PidState};

/// Per-timestep measurements and command of one actuator, supplied by the host.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ActuatorInputs<F> {
    /// Position setpoint, or velocity setpoint for a cascade whose outer loop is bypassed.
    pub command: F,

    /// Measured position.
    pub position: F,

    /// Measured velocity.
    pub velocity: F,

    /// Gravity and bias force the host would need to apply to hold the actuator still. Only the
    /// cascades add it to their output.
    pub bias_force: F,
}

impl<F: FloatCore> ActuatorInputs<F> {
    /// Inputs with no bias force.
    pub fn new(command: F, position: F, velocity: F) -> Self {
        Self {
            command,
            position,
            velocity,
            bias_force: F::zero(),
        }
    }

    /// Sets the bias force.
    pub fn with_bias_force(mut self, bias_force: F) -> Self {
        self.bias_force = bias_force;
        self
    }
}

/// Single-loop position PID.
///
/// Runs one PID loop on position, persists all of its memory and saturates against the force
/// range. No bias compensation is applied.
pub fn single_pid<F: FloatCore>(
    config: &PidConfig<F>,
    state: &mut PidState<F>,
    inputs: &ActuatorInputs<F>,
    dt: F,
) -> F {
    let gains = PidGains {
        kp: config.kp,
        deadband: config.deadband,
        integral_clamp: config.integral_clamp,
        ti: config.ti,
        derivative_smoothing: config.derivative_smoothing,
        td: config.td,
    };
    let prev = PidErrorState {
        error: state.last_error,
        integral: state.integral,
        derivative: state.last_derivative,
    };

    let (output, next) = pid::compute(&gains, prev, inputs.command, inputs.position, dt);

    state.integral = next.integral;
    state.last_error = next.error;
    state.last_derivative = next.derivative;
    output
}

/// Runs the shared inner velocity PI and returns its output, persisting only its integral.
#[inline]
fn velocity_pi<F: FloatCore>(
    kp: F,
    ti: F,
    integral_clamp: F,
    integral: &mut F,
    setpoint: F,
    velocity: F,
    dt: F,
) -> F {
    let prev = PidErrorState {
        integral: *integral,
        ..PidErrorState::zero()
    };
    let (output, next) = pid::compute(
        &PidGains::pi(kp, ti, integral_clamp),
        prev,
        setpoint,
        velocity,
        dt,
    );
    *integral = next.integral;
    output
}

/// Position PI driving a velocity PI, with velocity setpoint smoothing and bias compensation.
///
/// With a zero outer gain the command is used directly as the velocity setpoint, which turns the
/// cascade into a pure velocity controller. The result is not saturated; see [`evaluate`].
pub fn pi_pi_cascade<F: FloatCore>(
    config: &PiPiConfig<F>,
    state: &mut PiPiState<F>,
    inputs: &ActuatorInputs<F>,
    dt: F,
) -> F {
    let desired_velocity = if config.kp_pos != F::zero() {
        let prev = PidErrorState {
            integral: state.integral_pos,
            ..PidErrorState::zero()
        };
        let (velocity, next) = pid::compute(
            &PidGains::pi(config.kp_pos, config.ti_pos, config.clamp_pos),
            prev,
            inputs.command,
            inputs.position,
            dt,
        );
        state.integral_pos = next.integral;
        velocity
    } else {
        inputs.command
    };
    let desired_velocity = clamp(desired_velocity, -config.max_velocity, config.max_velocity);

    let alpha = config.ema_smoothing;
    state.smoothed_vel = alpha * state.smoothed_vel + (F::one() - alpha) * desired_velocity;

    let output = velocity_pi(
        config.kp_vel,
        config.ti_vel,
        config.clamp_vel,
        &mut state.integral_vel,
        state.smoothed_vel,
        inputs.velocity,
        dt,
    );
    output + inputs.bias_force
}

/// Position PD driving a velocity PI, with position command smoothing and bias compensation.
///
/// The command is smoothed before the outer loop. With a zero outer gain the raw, unsmoothed
/// command is used as the velocity setpoint. The result is not saturated; see [`evaluate`].
pub fn pd_pi_cascade<F: FloatCore>(
    config: &PdPiConfig<F>,
    state: &mut PdPiState<F>,
    inputs: &ActuatorInputs<F>,
    dt: F,
) -> F {
    let alpha = config.ema_smoothing;
    state.smoothed_pos = alpha * state.smoothed_pos + (F::one() - alpha) * inputs.command;

    let desired_velocity = if config.kp_pos != F::zero() {
        let prev = PidErrorState {
            error: state.last_error,
            derivative: state.last_derivative,
            ..PidErrorState::zero()
        };
        let (velocity, next) = pid::compute(
            &PidGains::pd(config.kp_pos, config.td_pos, config.derivative_smoothing),
            prev,
            state.smoothed_pos,
            inputs.position,
            dt,
        );
        state.last_error = next.error;
        state.last_derivative = next.derivative;
        velocity
    } else {
        inputs.command
    };
    let desired_velocity = clamp(desired_velocity, -config.max_velocity, config.max_velocity);

    let output = velocity_pi(
        config.kp_vel,
        config.ti_vel,
        config.clamp_vel,
        &mut state.integral_vel,
        desired_velocity,
        inputs.velocity,
        dt,
    );
    output + inputs.bias_force
}

/// Computes the saturated force of one actuator and updates its persisted state.
///
/// Routes to [`single_pid`], [`pi_pi_cascade`] or [`pd_pi_cascade`] according to the configured
/// controller, then clamps the result to the force range. If `state` was written by a different
/// controller it is zeroed for the configured one before evaluation.
///
/// # Arguments
/// - `config`: The actuator configuration.
/// - `state`: The actuator's persisted state, updated in place.
/// - `inputs`: The actuator's command and measurements for this timestep.
/// - `dt`: The sample period. Must be positive; this is not checked.
///
/// # Returns
/// - The actuator force.
pub fn evaluate<F: FloatCore>(
    config: &ActuatorConfig<F>,
    state: &mut ControllerState<F>,
    inputs: &ActuatorInputs<F>,
    dt: F,
) -> F {
    let force = loop {
        match (&config.controller, &mut *state) {
            (ControllerConfig::Pid(c), ControllerState::Pid(s)) => {
                break single_pid(c, s, inputs, dt)
            }
            (ControllerConfig::PiPi(c), ControllerState::PiPi(s)) => {
                break pi_pi_cascade(c, s, inputs, dt)
            }
            (ControllerConfig::PdPi(c), ControllerState::PdPi(s)) => {
                break pd_pi_cascade(c, s, inputs, dt)
            }
            _ => reset_mismatched(config, state),
        }
    };
    config.force_range.saturate(force)
}

#[cold]
fn reset_mismatched<F: FloatCore>(config: &ActuatorConfig<F>, state: &mut ControllerState<F>) {
    tracing::warn!(
        configured = ?config.kind(),
        persisted = ?state.kind(),
        "controller state does not match configuration, resetting"
    );
    *state = ControllerState::zeroed(config.kind());
}
