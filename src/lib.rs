#![warn(missing_docs)]

//! # Actuator PID Control Library
//!
//! This library computes per-actuator feedback forces for a physics simulation, replacing a
//! simulator's default torque model with closed-loop control.
//!
//! The simulator owns the model and the stepping loop. Once per timestep it hands each actuator's
//! command and measurements to this library and gets back a single scalar force.
//!
//! ## Features
//!
//! - A functionally pure PID primitive with:
//!   - Hard error deadband.
//!   - Anti reset-windup by clamping the accumulated integral.
//!   - Single-pole smoothing of the derivative term.
//!   - Integral path disabled by a zero integral time constant.
//!
//! - Three controller topologies, selected per actuator:
//!   - Single-loop position PID.
//!   - Position PI driving a velocity PI, with velocity setpoint smoothing.
//!   - Position PD driving a velocity PI, with position command smoothing.
//!
//!   Both cascades clamp the velocity setpoint and add the simulator's gravity/bias force.
//!
//! - Typed per-actuator configuration and state: a controller can only touch its own memory.
//!
//! - No allocation and no failure path inside the control loop. `no_std` compatible.
//!
//! ## Usage
//!
//! ### Control session
//!
//! The host provides storage for configuration and state; the session borrows both.
//!
//! ```rust
//! use actuator_pid::config::{ActuatorConfig, ControllerConfig, ForceRange, PidConfig};
//! use actuator_pid::controller::ActuatorInputs;
//! use actuator_pid::session::ControlSession;
//! use actuator_pid::state::ControllerState;
//!
//! let actuators = [ActuatorConfig::new(
//!     ControllerConfig::Pid(PidConfig {
//!         kp: 2.0,
//!         ..PidConfig::default()
//!     }),
//!     ForceRange::new(-1.0, 1.0),
//! )];
//! let mut states = [ControllerState::default(); 1];
//!
//! let mut session = ControlSession::setup(&actuators, &mut states).expect("Storage too small");
//!
//! let dt = 0.002;
//! let force = session.step(0, &ActuatorInputs::new(1.0, 0.0, 0.0), dt);
//! assert_eq!(force, 1.0); // 2.0 before saturation
//! ```
//!
//! ### Raw host data
//!
//! Hosts that store configuration as flat arrays can parse it at setup time. Controller tags are
//! 0 for PID, 1 for the PI-PI cascade and 2 for the PD-PI cascade.
//!
//! ```rust
//! use actuator_pid::config::{ActuatorConfig, ControllerKind, RawActuatorData, GAIN_WIDTH};
//! use actuator_pid::session::ControlSession;
//! use actuator_pid::state::ControllerState;
//!
//! let tags = [0, 1];
//! let gains: [f64; 2 * GAIN_WIDTH] = [
//!     10.0, 0.5, 1.0, 0.1, 0.5, 0.0, 0.0, 0.0, // PID
//!     5.0, 0.0, 0.0, 20.0, 0.5, 10.0, 0.5, 2.0, // PI-PI cascade
//! ];
//! let force_ranges = [[-50.0, 50.0], [0.0, 0.0]];
//! let raw = RawActuatorData {
//!     tags: &tags,
//!     gains: &gains,
//!     force_ranges: &force_ranges,
//! };
//!
//! let mut actuators = [ActuatorConfig::default(); 2];
//! let mut states = [ControllerState::default(); 2];
//! let session = ControlSession::setup_raw(&raw, &mut actuators, &mut states).unwrap();
//!
//! assert_eq!(session.config(1).unwrap().kind(), ControllerKind::PiPiCascade);
//! ```
//!
//! ### Functional PID primitive
//!
//! ```rust
//! use actuator_pid::pid::{self, PidErrorState, PidGains};
//!
//! let gains = PidGains::pi(2.0, 0.5, 10.0);
//! let (output, state) = pid::compute(&gains, PidErrorState::zero(), 1.0, 0.0, 0.01);
//! assert_eq!(state.integral, 0.01);
//! assert_eq!(output, 2.0 * (1.0 + 0.01 / 0.5));
//! ```
#![no_std]

#[cfg(feature = "std")]
extern crate std;

/// The PID primitive shared by every controller.
pub mod pid;

/// Typed actuator configuration and the parser for flat host data.
pub mod config;

/// Persisted per-actuator controller state.
pub mod state;

/// The three controllers and the dispatcher that selects between them.
pub mod controller;

/// Control session setup and per-timestep evaluation.
pub mod session;

#[doc(hidden)]
#[cfg(feature = "simulation")]
pub mod sim;

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;
