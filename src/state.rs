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

use crate::config::ControllerKind;

/// Number of scalars a host reserves per actuator when it persists controller state flat.
pub const STATE_WIDTH: usize = 4;

/// Memory of the single-loop PID.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidState<F> {
    /// Accumulated, clamped integral of the position error.
    pub integral: F,
    /// Position error after the deadband, from the previous step.
    pub last_error: F,
    /// Smoothed error derivative from the previous step.
    pub last_derivative: F,
}

/// Memory of the PI-PI cascade. Neither loop keeps error or derivative memory.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PiPiState<F> {
    /// Integral of the outer position loop.
    pub integral_pos: F,
    /// Integral of the inner velocity loop.
    pub integral_vel: F,
    /// Smoothed velocity setpoint.
    pub smoothed_vel: F,
}

/// Memory of the PD-PI cascade.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PdPiState<F> {
    /// Outer loop position error from the previous step.
    pub last_error: F,
    /// Smoothed outer loop derivative from the previous step.
    pub last_derivative: F,
    /// Integral of the inner velocity loop.
    pub integral_vel: F,
    /// Smoothed position command.
    pub smoothed_pos: F,
}

/// Persisted state of one actuator, tagged by the controller that owns it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ControllerState<F> {
    /// State of a single-loop PID.
    Pid(PidState<F>),
    /// State of a PI-PI cascade.
    PiPi(PiPiState<F>),
    /// State of a PD-PI cascade.
    PdPi(PdPiState<F>),
}

impl<F: FloatCore> ControllerState<F> {
    /// All-zero state for a controller of the given kind.
    pub fn zeroed(kind: ControllerKind) -> Self {
        let z = F::zero();
        match kind {
            ControllerKind::Pid => ControllerState::Pid(PidState {
                integral: z,
                last_error: z,
                last_derivative: z,
            }),
            ControllerKind::PiPiCascade => ControllerState::PiPi(PiPiState {
                integral_pos: z,
                integral_vel: z,
                smoothed_vel: z,
            }),
            ControllerKind::PdPiCascade => ControllerState::PdPi(PdPiState {
                last_error: z,
                last_derivative: z,
                integral_vel: z,
                smoothed_pos: z,
            }),
        }
    }

    /// The controller this state belongs to.
    pub fn kind(&self) -> ControllerKind {
        match self {
            ControllerState::Pid(_) => ControllerKind::Pid,
            ControllerState::PiPi(_) => ControllerKind::PiPiCascade,
            ControllerState::PdPi(_) => ControllerKind::PdPiCascade,
        }
    }

    /// Writes the state into a flat slot of at least `STATE_WIDTH` scalars.
    ///
    /// Scalars the controller does not use are zeroed.
    ///
    /// # Panics
    /// If `slot` is shorter than `STATE_WIDTH`.
    pub fn write_slot(&self, slot: &mut [F]) {
        let z = F::zero();
        let values = match *self {
            ControllerState::Pid(s) => [s.integral, s.last_error, s.last_derivative, z],
            ControllerState::PiPi(s) => [s.integral_pos, s.integral_vel, s.smoothed_vel, z],
            ControllerState::PdPi(s) => [
                s.last_error,
                s.last_derivative,
                s.integral_vel,
                s.smoothed_pos,
            ],
        };
        let width = self.kind().state_width();
        slot[..width].copy_from_slice(&values[..width]);
        for unused in &mut slot[width..STATE_WIDTH] {
            *unused = z;
        }
    }

    /// Reads a flat slot written by [`ControllerState::write_slot`], interpreting it with the
    /// layout of `kind`.
    ///
    /// # Panics
    /// If `slot` is shorter than `STATE_WIDTH`.
    pub fn read_slot(kind: ControllerKind, slot: &[F]) -> Self {
        match kind {
            ControllerKind::Pid => ControllerState::Pid(PidState {
                integral: slot[0],
                last_error: slot[1],
                last_derivative: slot[2],
            }),
            ControllerKind::PiPiCascade => ControllerState::PiPi(PiPiState {
                integral_pos: slot[0],
                integral_vel: slot[1],
                smoothed_vel: slot[2],
            }),
            ControllerKind::PdPiCascade => ControllerState::PdPi(PdPiState {
                last_error: slot[0],
                last_derivative: slot[1],
                integral_vel: slot[2],
                smoothed_pos: slot[3],
            }),
        }
    }
}

impl<F: FloatCore> Default for ControllerState<F> {
    fn default() -> Self {
        Self::zeroed(ControllerKind::Pid)
    }
}
