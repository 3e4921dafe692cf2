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

use crate::config::{parse_actuators, ActuatorConfig, ConfigError, RawActuatorData};
use crate::controller::{evaluate, ActuatorInputs};
use crate::state::ControllerState;

/// Errors that prevent a control session from starting.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum SessionError {
    /// Fewer state slots than actuators were provided.
    #[cfg_attr(
        feature = "std",
        error("controller state storage too small: need {required}, have {available}")
    )]
    StateStorageTooSmall {
        /// Required number of slots.
        required: usize,
        /// Provided number of slots.
        available: usize,
    },

    /// The actuator configuration could not be parsed.
    #[cfg_attr(feature = "std", error("invalid actuator configuration: {0}"))]
    Config(#[cfg_attr(feature = "std", from)] ConfigError),
}

#[cfg(not(feature = "std"))]
impl From<ConfigError> for SessionError {
    fn from(err: ConfigError) -> Self {
        SessionError::Config(err)
    }
}

fn check_state_width<F>(
    num_actuators: usize,
    states: &[ControllerState<F>],
) -> Result<(), SessionError> {
    if states.len() < num_actuators {
        tracing::warn!(
            actuators = num_actuators,
            slots = states.len(),
            "controller state storage too small"
        );
        return Err(SessionError::StateStorageTooSmall {
            required: num_actuators,
            available: states.len(),
        });
    }
    Ok(())
}

/// The pair of evaluation functions a host simulator calls for every actuator and timestep.
///
/// The host computes the actuator force as `gain(id) * ctrl + bias(id, ..)`.
pub trait ActuatorCallbacks<F> {
    /// Gain multiplying the host's raw control signal.
    fn gain(&self, id: usize) -> F;

    /// Force added on top of the gain path.
    fn bias(&mut self, id: usize, inputs: &ActuatorInputs<F>, dt: F) -> F;
}

/// A running control session over a set of actuators.
///
/// The host owns the configuration and state storage; the session borrows both for its lifetime
/// and is the only writer of the state. Actuator ids index both slices.
#[derive(Debug)]
pub struct ControlSession<'a, F> {
    actuators: &'a [ActuatorConfig<F>],
    states: &'a mut [ControllerState<F>],
}

impl<'a, F: FloatCore> ControlSession<'a, F> {
    /// Starts a session, zeroing the persisted state of every actuator.
    ///
    /// # Arguments
    /// - `actuators`: One configuration per actuator.
    /// - `states`: Host-provided state storage, at least one slot per actuator. Extra slots are
    ///   left untouched.
    ///
    /// # Returns
    /// - The session if `states` is large enough.
    /// - `SessionError::StateStorageTooSmall` otherwise, in which case nothing is written.
    pub fn setup(
        actuators: &'a [ActuatorConfig<F>],
        states: &'a mut [ControllerState<F>],
    ) -> Result<Self, SessionError> {
        check_state_width(actuators.len(), states)?;

        let mut session = Self { actuators, states };
        session.reset_all();
        tracing::debug!(actuators = actuators.len(), "control session started");
        Ok(session)
    }

    /// Parses flat host data into `actuators`, then starts a session over it.
    ///
    /// Every storage width is checked before anything is written, so on error both `actuators`
    /// and `states` are left as they were.
    pub fn setup_raw(
        raw: &RawActuatorData<'_, F>,
        actuators: &'a mut [ActuatorConfig<F>],
        states: &'a mut [ControllerState<F>],
    ) -> Result<Self, SessionError> {
        check_state_width(actuators.len(), states)?;
        if let Err(err) = parse_actuators(raw, actuators) {
            tracing::warn!(error = ?err, "failed to parse actuator configuration");
            return Err(err.into());
        }
        Self::setup(actuators, states)
    }

    /// Number of actuators under control.
    pub fn num_actuators(&self) -> usize {
        self.actuators.len()
    }

    /// Configuration of actuator `id`.
    pub fn config(&self, id: usize) -> Option<&ActuatorConfig<F>> {
        self.actuators.get(id)
    }

    /// Persisted state of actuator `id`.
    pub fn state(&self, id: usize) -> Option<&ControllerState<F>> {
        self.states[..self.actuators.len()].get(id)
    }

    /// Computes the force of actuator `id` and advances its state by one timestep.
    ///
    /// # Panics
    /// If `id` is not less than `num_actuators()`.
    #[inline]
    pub fn step(&mut self, id: usize, inputs: &ActuatorInputs<F>, dt: F) -> F {
        evaluate(&self.actuators[id], &mut self.states[id], inputs, dt)
    }

    /// Steps every actuator, writing one force per actuator into `forces`.
    ///
    /// # Panics
    /// In debug builds, if `inputs` or `forces` is shorter than `num_actuators()`. Release builds
    /// only step the actuators that have both an input and an output slot.
    pub fn step_all(&mut self, inputs: &[ActuatorInputs<F>], dt: F, forces: &mut [F]) {
        debug_assert!(
            inputs.len() >= self.actuators.len() && forces.len() >= self.actuators.len(),
            "step_all needs one input and one force slot per actuator"
        );
        for (((config, state), inputs), force) in self
            .actuators
            .iter()
            .zip(self.states.iter_mut())
            .zip(inputs)
            .zip(forces.iter_mut())
        {
            *force = evaluate(config, state, inputs, dt);
        }
    }

    /// Zeroes the persisted state of actuator `id`. Out-of-range ids are ignored.
    pub fn reset(&mut self, id: usize) {
        if let Some(config) = self.actuators.get(id) {
            self.states[id] = ControllerState::zeroed(config.kind());
        }
    }

    /// Zeroes the persisted state of every actuator.
    pub fn reset_all(&mut self) {
        for (config, state) in self.actuators.iter().zip(self.states.iter_mut()) {
            *state = ControllerState::zeroed(config.kind());
        }
    }

    /// Disjoint `(config, state)` pairs, one per actuator.
    ///
    /// Each pair can be handed to [`evaluate`] independently, e.g. from different threads.
    pub fn slots_mut(
        &mut self,
    ) -> impl Iterator<Item = (&ActuatorConfig<F>, &mut ControllerState<F>)> + '_ {
        self.actuators.iter().zip(self.states.iter_mut())
    }
}

impl<F: FloatCore> ActuatorCallbacks<F> for ControlSession<'_, F> {
    /// Always zero: the host's default `gain * ctrl` path is replaced by the feedback law.
    fn gain(&self, _id: usize) -> F {
        F::zero()
    }

    fn bias(&mut self, id: usize, inputs: &ActuatorInputs<F>, dt: F) -> F {
        self.step(id, inputs, dt)
    }
}
