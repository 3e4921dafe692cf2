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

use crate::pid::clamp;

/// Number of gain scalars a host reserves per actuator in flat gain storage.
pub const GAIN_WIDTH: usize = 8;

/// Errors raised while turning host-provided configuration into typed records.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(thiserror::Error))]
pub enum ConfigError {
    /// The gain array of an actuator is shorter than its controller layout.
    #[cfg_attr(
        feature = "std",
        error("{kind:?} controller needs {required} gains, got {provided}")
    )]
    MissingGains {
        /// The controller the gains were parsed for.
        kind: ControllerKind,
        /// Number of gains the controller layout requires.
        required: usize,
        /// Number of gains that were provided.
        provided: usize,
    },

    /// Controller-type tag storage holds fewer entries than there are actuators.
    #[cfg_attr(
        feature = "std",
        error("controller tag storage too small: need {required}, have {available}")
    )]
    TagStorageTooSmall {
        /// Required number of entries.
        required: usize,
        /// Provided number of entries.
        available: usize,
    },

    /// Flat gain storage holds fewer than `GAIN_WIDTH` scalars per actuator.
    #[cfg_attr(
        feature = "std",
        error("gain storage too small: need {required}, have {available}")
    )]
    GainStorageTooSmall {
        /// Required number of scalars.
        required: usize,
        /// Provided number of scalars.
        available: usize,
    },

    /// Force-range storage holds fewer entries than there are actuators.
    #[cfg_attr(
        feature = "std",
        error("force range storage too small: need {required}, have {available}")
    )]
    ForceRangeStorageTooSmall {
        /// Required number of entries.
        required: usize,
        /// Provided number of entries.
        available: usize,
    },
}

/// The control topology of an actuator.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ControllerKind {
    /// Single-loop PID on position. Also selected by unrecognized tags.
    #[default]
    Pid,
    /// Position PI driving a velocity PI.
    PiPiCascade,
    /// Position PD driving a velocity PI.
    PdPiCascade,
}

impl ControllerKind {
    /// Maps a host controller-type tag to a controller kind.
    ///
    /// Tag 1 selects the PI-PI cascade and tag 2 the PD-PI cascade; every other tag selects the
    /// single-loop PID.
    pub fn from_tag(tag: i32) -> Self {
        match tag {
            1 => ControllerKind::PiPiCascade,
            2 => ControllerKind::PdPiCascade,
            _ => ControllerKind::Pid,
        }
    }

    /// The canonical tag of this controller kind.
    pub fn tag(self) -> i32 {
        match self {
            ControllerKind::Pid => 0,
            ControllerKind::PiPiCascade => 1,
            ControllerKind::PdPiCascade => 2,
        }
    }

    /// Number of leading gains the controller reads from a flat gain array.
    pub fn gain_count(self) -> usize {
        match self {
            ControllerKind::Pid => 6,
            ControllerKind::PiPiCascade | ControllerKind::PdPiCascade => 8,
        }
    }

    /// Number of persisted scalars the controller uses.
    pub fn state_width(self) -> usize {
        match self {
            ControllerKind::Pid | ControllerKind::PiPiCascade => 3,
            ControllerKind::PdPiCascade => 4,
        }
    }
}

fn check_gains<F>(kind: ControllerKind, gains: &[F]) -> Result<(), ConfigError> {
    if gains.len() < kind.gain_count() {
        return Err(ConfigError::MissingGains {
            kind,
            required: kind.gain_count(),
            provided: gains.len(),
        });
    }
    Ok(())
}

/// Gains of the single-loop position PID.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PidConfig<F> {
    /// Proportional gain.
    pub kp: F,
    /// Integral time constant, 0 disables the integral path.
    pub ti: F,
    /// Anti-windup clamp magnitude.
    pub integral_clamp: F,
    /// Derivative time constant.
    pub td: F,
    /// Derivative smoothing factor in `[0, 1]`.
    pub derivative_smoothing: F,
    /// Error deadband.
    pub deadband: F,
}

impl<F: FloatCore> PidConfig<F> {
    /// Reads `[kp, ti, integral_clamp, td, derivative_smoothing, deadband]`.
    pub fn from_gains(gains: &[F]) -> Result<Self, ConfigError> {
        check_gains(ControllerKind::Pid, gains)?;
        Ok(Self {
            kp: gains[0],
            ti: gains[1],
            integral_clamp: gains[2],
            td: gains[3],
            derivative_smoothing: gains[4],
            deadband: gains[5],
        })
    }
}

impl<F: FloatCore> Default for PidConfig<F> {
    fn default() -> Self {
        Self {
            kp: F::zero(),
            ti: F::zero(),
            integral_clamp: F::zero(),
            td: F::zero(),
            derivative_smoothing: F::zero(),
            deadband: F::zero(),
        }
    }
}

/// Gains of the position PI to velocity PI cascade.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PiPiConfig<F> {
    /// Outer proportional gain. Zero bypasses the outer loop.
    pub kp_pos: F,
    /// Outer integral time constant.
    pub ti_pos: F,
    /// Outer anti-windup clamp magnitude.
    pub clamp_pos: F,
    /// Inner proportional gain.
    pub kp_vel: F,
    /// Inner integral time constant.
    pub ti_vel: F,
    /// Inner anti-windup clamp magnitude.
    pub clamp_vel: F,
    /// Weight of the previous smoothed velocity setpoint, in `[0, 1]`.
    pub ema_smoothing: F,
    /// Symmetric limit on the desired velocity.
    pub max_velocity: F,
}

impl<F: FloatCore> PiPiConfig<F> {
    /// Reads `[kp_pos, ti_pos, clamp_pos, kp_vel, ti_vel, clamp_vel, ema_smoothing, max_velocity]`.
    pub fn from_gains(gains: &[F]) -> Result<Self, ConfigError> {
        check_gains(ControllerKind::PiPiCascade, gains)?;
        Ok(Self {
            kp_pos: gains[0],
            ti_pos: gains[1],
            clamp_pos: gains[2],
            kp_vel: gains[3],
            ti_vel: gains[4],
            clamp_vel: gains[5],
            ema_smoothing: gains[6],
            max_velocity: gains[7],
        })
    }
}

impl<F: FloatCore> Default for PiPiConfig<F> {
    fn default() -> Self {
        Self {
            kp_pos: F::zero(),
            ti_pos: F::zero(),
            clamp_pos: F::zero(),
            kp_vel: F::zero(),
            ti_vel: F::zero(),
            clamp_vel: F::zero(),
            ema_smoothing: F::zero(),
            max_velocity: F::zero(),
        }
    }
}

/// Gains of the position PD to velocity PI cascade.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PdPiConfig<F> {
    /// Outer proportional gain. Zero bypasses the outer loop.
    pub kp_pos: F,
    /// Outer derivative time constant.
    pub td_pos: F,
    /// Outer derivative smoothing factor in `[0, 1]`.
    pub derivative_smoothing: F,
    /// Inner proportional gain.
    pub kp_vel: F,
    /// Inner integral time constant.
    pub ti_vel: F,
    /// Inner anti-windup clamp magnitude.
    pub clamp_vel: F,
    /// Weight of the previous smoothed position command, in `[0, 1]`.
    pub ema_smoothing: F,
    /// Symmetric limit on the desired velocity.
    pub max_velocity: F,
}

impl<F: FloatCore> PdPiConfig<F> {
    /// Reads `[kp_pos, td_pos, derivative_smoothing, kp_vel, ti_vel, clamp_vel, ema_smoothing,
    /// max_velocity]`.
    pub fn from_gains(gains: &[F]) -> Result<Self, ConfigError> {
        check_gains(ControllerKind::PdPiCascade, gains)?;
        Ok(Self {
            kp_pos: gains[0],
            td_pos: gains[1],
            derivative_smoothing: gains[2],
            kp_vel: gains[3],
            ti_vel: gains[4],
            clamp_vel: gains[5],
            ema_smoothing: gains[6],
            max_velocity: gains[7],
        })
    }
}

impl<F: FloatCore> Default for PdPiConfig<F> {
    fn default() -> Self {
        Self {
            kp_pos: F::zero(),
            td_pos: F::zero(),
            derivative_smoothing: F::zero(),
            kp_vel: F::zero(),
            ti_vel: F::zero(),
            clamp_vel: F::zero(),
            ema_smoothing: F::zero(),
            max_velocity: F::zero(),
        }
    }
}

/// Typed controller configuration, one variant per topology.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ControllerConfig<F> {
    /// Single-loop position PID.
    Pid(PidConfig<F>),
    /// Position PI to velocity PI cascade.
    PiPi(PiPiConfig<F>),
    /// Position PD to velocity PI cascade.
    PdPi(PdPiConfig<F>),
}

impl<F: FloatCore> ControllerConfig<F> {
    /// Parses a flat gain array according to the layout of `kind`.
    pub fn from_gains(kind: ControllerKind, gains: &[F]) -> Result<Self, ConfigError> {
        Ok(match kind {
            ControllerKind::Pid => ControllerConfig::Pid(PidConfig::from_gains(gains)?),
            ControllerKind::PiPiCascade => ControllerConfig::PiPi(PiPiConfig::from_gains(gains)?),
            ControllerKind::PdPiCascade => ControllerConfig::PdPi(PdPiConfig::from_gains(gains)?),
        })
    }

    /// The topology of this configuration.
    pub fn kind(&self) -> ControllerKind {
        match self {
            ControllerConfig::Pid(_) => ControllerKind::Pid,
            ControllerConfig::PiPi(_) => ControllerKind::PiPiCascade,
            ControllerConfig::PdPi(_) => ControllerKind::PdPiCascade,
        }
    }
}

impl<F: FloatCore> Default for ControllerConfig<F> {
    fn default() -> Self {
        ControllerConfig::Pid(PidConfig::default())
    }
}

/// Saturation bounds of the final actuator force.
///
/// A range whose bounds are both zero means the force is unbounded.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ForceRange<F> {
    /// Lower bound.
    pub low: F,
    /// Upper bound.
    pub high: F,
}

impl<F: FloatCore> ForceRange<F> {
    /// Constructs a range from its bounds.
    pub fn new(low: F, high: F) -> Self {
        Self { low, high }
    }

    /// The both-zero range, which disables saturation.
    pub fn unbounded() -> Self {
        Self::new(F::zero(), F::zero())
    }

    /// Returns `true` unless both bounds are zero.
    pub fn is_bounded(&self) -> bool {
        self.low != F::zero() || self.high != F::zero()
    }

    /// Clamps `force` into the range, or passes it through if the range is unbounded.
    #[inline]
    pub fn saturate(&self, force: F) -> F {
        if self.is_bounded() {
            clamp(force, self.low, self.high)
        } else {
            force
        }
    }
}

impl<F: FloatCore> Default for ForceRange<F> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<F: FloatCore> From<[F; 2]> for ForceRange<F> {
    fn from([low, high]: [F; 2]) -> Self {
        Self::new(low, high)
    }
}

/// Everything the control law needs to know about one actuator.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ActuatorConfig<F> {
    /// Controller topology and gains.
    pub controller: ControllerConfig<F>,
    /// Force saturation bounds.
    pub force_range: ForceRange<F>,
}

impl<F: FloatCore> ActuatorConfig<F> {
    /// Constructs an actuator configuration.
    pub fn new(controller: ControllerConfig<F>, force_range: ForceRange<F>) -> Self {
        Self {
            controller,
            force_range,
        }
    }

    /// Parses raw host values: a controller-type tag, a flat gain array and a `[low, high]`
    /// force range.
    pub fn from_raw(tag: i32, gains: &[F], force_range: [F; 2]) -> Result<Self, ConfigError> {
        let kind = ControllerKind::from_tag(tag);
        if kind.tag() != tag {
            tracing::debug!(tag, "unrecognized controller tag, using single-loop PID");
        }
        Ok(Self::new(
            ControllerConfig::from_gains(kind, gains)?,
            force_range.into(),
        ))
    }

    /// The topology of this actuator.
    pub fn kind(&self) -> ControllerKind {
        self.controller.kind()
    }
}

impl<F: FloatCore> Default for ActuatorConfig<F> {
    /// A zero-gain single-loop PID with unbounded force.
    fn default() -> Self {
        Self::new(ControllerConfig::default(), ForceRange::unbounded())
    }
}

/// Actuator configuration as laid out by a host simulator: parallel flat arrays indexed by
/// actuator id.
#[derive(Copy, Clone, Debug)]
pub struct RawActuatorData<'a, F> {
    /// One controller-type tag per actuator.
    pub tags: &'a [i32],
    /// `GAIN_WIDTH` gains per actuator, row-major.
    pub gains: &'a [F],
    /// One `[low, high]` force range per actuator.
    pub force_ranges: &'a [[F; 2]],
}

impl<F: FloatCore> RawActuatorData<'_, F> {
    /// Checks that every array is wide enough for `num_actuators` actuators.
    pub fn check_width(&self, num_actuators: usize) -> Result<(), ConfigError> {
        if self.tags.len() < num_actuators {
            return Err(ConfigError::TagStorageTooSmall {
                required: num_actuators,
                available: self.tags.len(),
            });
        }
        let required = num_actuators * GAIN_WIDTH;
        if self.gains.len() < required {
            return Err(ConfigError::GainStorageTooSmall {
                required,
                available: self.gains.len(),
            });
        }
        if self.force_ranges.len() < num_actuators {
            return Err(ConfigError::ForceRangeStorageTooSmall {
                required: num_actuators,
                available: self.force_ranges.len(),
            });
        }
        Ok(())
    }
}

/// Parses raw host data into typed configuration, one record per element of `out`.
///
/// Widths are checked before anything is written, so `out` is left untouched on a width error.
pub fn parse_actuators<F: FloatCore>(
    raw: &RawActuatorData<'_, F>,
    out: &mut [ActuatorConfig<F>],
) -> Result<(), ConfigError> {
    raw.check_width(out.len())?;
    for (id, actuator) in out.iter_mut().enumerate() {
        let gains = &raw.gains[id * GAIN_WIDTH..(id + 1) * GAIN_WIDTH];
        *actuator = ActuatorConfig::from_raw(raw.tags[id], gains, raw.force_ranges[id])?;
    }
    Ok(())
}
