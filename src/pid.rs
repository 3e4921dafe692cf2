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

/// Gains of a single PID loop.
///
/// The output law is `kp * (error + integral / ti + derivative * td)`, i.e. the proportional gain
/// scales all three terms. Every field is trusted: no value is rejected, degenerate values just
/// degenerate the corresponding term.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidGains<F> {
    /// Proportional gain, scaling the whole output.
    pub kp: F,

    /// Errors with a magnitude strictly below this threshold snap to exactly zero.
    pub deadband: F,

    /// Magnitude of the anti-windup clamp on the accumulated integral. A zero or negative clamp
    /// pins the integral to zero.
    pub integral_clamp: F,

    /// Integral time constant. Zero disables the integral path.
    pub ti: F,

    /// Smoothing factor of the single-pole filter on the derivative, in `[0, 1]`.
    /// 0 freezes the derivative at its previous value, 1 disables smoothing.
    pub derivative_smoothing: F,

    /// Derivative time constant. Zero disables the derivative path.
    pub td: F,
}

impl<F: FloatCore> Default for PidGains<F> {
    /// A pure proportional loop with unity gain.
    fn default() -> Self {
        Self {
            kp: F::one(),
            deadband: F::zero(),
            integral_clamp: F::zero(),
            ti: F::zero(),
            derivative_smoothing: F::zero(),
            td: F::zero(),
        }
    }
}

impl<F: FloatCore> PidGains<F> {
    /// PI loop without deadband: the derivative path is disabled.
    pub fn pi(kp: F, ti: F, integral_clamp: F) -> Self {
        Self {
            kp,
            integral_clamp,
            ti,
            ..Self::default()
        }
    }

    /// PD loop without deadband: the integral path is disabled.
    pub fn pd(kp: F, td: F, derivative_smoothing: F) -> Self {
        Self {
            kp,
            derivative_smoothing,
            td,
            ..Self::default()
        }
    }
}

/// Memory of a PID loop, threaded from one evaluation into the next.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct PidErrorState<F> {
    /// Error of the last evaluation, after the deadband.
    pub error: F,

    /// Accumulated and clamped integral of the error.
    pub integral: F,

    /// Smoothed derivative of the error.
    pub derivative: F,
}

impl<F: FloatCore> PidErrorState<F> {
    /// All-zero memory, as at the start of a control session.
    pub fn zero() -> Self {
        Self {
            error: F::zero(),
            integral: F::zero(),
            derivative: F::zero(),
        }
    }
}

/// Evaluates one step of a PID loop.
///
/// This function is functionally pure: the loop memory is passed in as `prev` and the updated
/// memory is returned alongside the output. The caller decides which fields of the returned state
/// it persists.
///
/// # Arguments
/// - `gains`: The loop gains.
/// - `prev`: The loop memory returned by the previous evaluation.
/// - `setpoint`: The reference value.
/// - `feedback`: The measured value.
/// - `dt`: The sample period. Must be positive; this is not checked.
///
/// # Returns
/// - The loop output and the new loop memory.
pub fn compute<F: FloatCore>(
    gains: &PidGains<F>,
    prev: PidErrorState<F>,
    setpoint: F,
    feedback: F,
    dt: F,
) -> (F, PidErrorState<F>) {
    let mut error = setpoint - feedback;
    if error.abs() < gains.deadband {
        error = F::zero();
    }

    // Single-pole low-pass filter on the backward difference
    let raw_derivative = (error - prev.error) / dt;
    let alpha = gains.derivative_smoothing;
    let derivative = (F::one() - alpha) * prev.derivative + alpha * raw_derivative;
    let d_term = derivative * gains.td;

    // Anti-windup acts on the accumulated integral, not on the output
    let limit = gains.integral_clamp.max(F::zero());
    let integral = clamp(prev.integral + error * dt, -limit, limit);
    let i_term = if gains.ti != F::zero() {
        integral / gains.ti
    } else {
        F::zero()
    };

    let output = gains.kp * (error + i_term + d_term);
    (
        output,
        PidErrorState {
            error,
            integral,
            derivative,
        },
    )
}

/// Clamps `value` into `[low, high]` without asserting `low <= high`.
///
/// When the bounds are inverted the result is `high`.
#[inline]
pub(crate) fn clamp<F: FloatCore>(value: F, low: F, high: F) -> F {
    value.max(low).min(high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_tolerates_inverted_bounds() {
        assert_eq!(clamp(3.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-3.0, -1.0, 1.0), -1.0);
        assert_eq!(clamp(0.5, -1.0, 1.0), 0.5);
        assert_eq!(clamp(0.5, 1.0, -1.0), -1.0);
    }

    #[test]
    fn test_negative_clamp_pins_integral() {
        let gains = PidGains::pi(1.0, 1.0, -3.0);
        let (_, state) = compute(&gains, PidErrorState::zero(), 10.0, 0.0, 0.1);
        assert_eq!(state.integral, 0.0);
    }
}
