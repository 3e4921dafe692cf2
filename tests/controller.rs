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

use fixtures::test_actuators::*;

use actuator_pid::config::{ForceRange, PdPiConfig, PiPiConfig, PidConfig};
use actuator_pid::controller::{evaluate, pd_pi_cascade, pi_pi_cascade, ActuatorInputs};
use actuator_pid::state::{ControllerState, PdPiState, PiPiState, PidState};

use approx::assert_relative_eq;

mod test_single_pid {

    use super::*;

    fn proportional(kp: f64) -> PidConfig<f64> {
        PidConfig {
            kp,
            ..PidConfig::default()
        }
    }

    #[test]
    fn test_unsaturated_proportional_output() {
        let config = make_pid(proportional(2.0), ForceRange::unbounded());
        let mut state = zeroed_state(&config);

        let force = evaluate(&config, &mut state, &at_rest(1.0), DT);

        assert_eq!(force, 2.0);
    }

    #[test]
    fn test_saturated_proportional_output() {
        let config = make_pid(proportional(2.0), ForceRange::new(-1.0, 1.0));
        let mut state = zeroed_state(&config);

        assert_eq!(evaluate(&config, &mut state, &at_rest(1.0), DT), 1.0);
        assert_eq!(evaluate(&config, &mut state, &at_rest(-1.0), DT), -1.0);
        assert_eq!(evaluate(&config, &mut state, &at_rest(0.25), DT), 0.5);
    }

    #[test]
    fn test_asymmetric_force_range() {
        let config = make_pid(proportional(1.0), ForceRange::new(0.0, 3.0));
        let mut state = zeroed_state(&config);

        for (command, expected) in [(-5.0, 0.0), (1.5, 1.5), (10.0, 3.0)] {
            assert_eq!(evaluate(&config, &mut state, &at_rest(command), DT), expected);
        }
    }

    #[test]
    fn test_feedback_is_position_and_bias_is_ignored() {
        let config = make_pid(proportional(1.0), ForceRange::unbounded());
        let mut state = zeroed_state(&config);

        let inputs = ActuatorInputs::new(1.0, 0.25, 100.0).with_bias_force(50.0);
        assert_eq!(evaluate(&config, &mut state, &inputs, DT), 0.75);
    }

    #[test]
    fn test_state_is_persisted() {
        let config = make_pid(
            PidConfig {
                kp: 1.0,
                ti: 1.0,
                integral_clamp: 10.0,
                td: 1.0,
                derivative_smoothing: 0.5,
                deadband: 0.0,
            },
            ForceRange::unbounded(),
        );
        let mut state = zeroed_state(&config);

        evaluate(&config, &mut state, &at_rest(2.0), 0.5);

        assert_eq!(
            state,
            ControllerState::Pid(PidState {
                integral: 1.0,
                last_error: 2.0,
                last_derivative: 2.0,
            })
        );
    }
}

mod test_pi_pi_cascade {

    use super::*;

    fn velocity_only(max_velocity: f64) -> PiPiConfig<f64> {
        PiPiConfig {
            kp_pos: 0.0,
            kp_vel: 1.0,
            max_velocity,
            ..PiPiConfig::default()
        }
    }

    #[test]
    fn test_outer_bypass_uses_command_as_velocity() {
        let config = velocity_only(10.0);
        let mut state = PiPiState {
            // Stale outer memory has no effect when bypassed
            integral_pos: 42.0,
            integral_vel: 0.0,
            smoothed_vel: 0.0,
        };

        let force = pi_pi_cascade(&config, &mut state, &ActuatorInputs::new(3.0, 7.0, 0.0), DT);

        assert_eq!(state.smoothed_vel, 3.0);
        assert_eq!(state.integral_pos, 42.0);
        assert_eq!(force, 3.0);
    }

    #[test]
    fn test_desired_velocity_is_clamped() {
        let config = velocity_only(2.0);

        for (command, expected) in [(5.0, 2.0), (-5.0, -2.0), (1.5, 1.5)] {
            let mut state = PiPiState {
                integral_pos: 0.0,
                integral_vel: 0.0,
                smoothed_vel: 0.0,
            };
            let force = pi_pi_cascade(&config, &mut state, &at_rest(command), DT);
            assert_eq!(state.smoothed_vel, expected);
            assert_eq!(force, expected);
        }
    }

    #[test]
    fn test_outer_loop_clamped_velocity() {
        let config = PiPiConfig {
            kp_pos: 100.0,
            kp_vel: 1.0,
            max_velocity: 0.5,
            ..PiPiConfig::default()
        };
        let mut state = PiPiState {
            integral_pos: 0.0,
            integral_vel: 0.0,
            smoothed_vel: 0.0,
        };

        for command in [10.0, -3.0, 0.2, 1e6] {
            pi_pi_cascade(&config, &mut state, &at_rest(command), DT);
            assert!(state.smoothed_vel.abs() <= 0.5);
        }
    }

    #[test]
    fn test_outer_pi_persists_only_integral() {
        let config = PiPiConfig {
            kp_pos: 2.0,
            ti_pos: 1.0,
            clamp_pos: 10.0,
            kp_vel: 1.0,
            max_velocity: 100.0,
            ..PiPiConfig::default()
        };
        let mut state = PiPiState {
            integral_pos: 0.0,
            integral_vel: 0.0,
            smoothed_vel: 0.0,
        };

        let force = pi_pi_cascade(&config, &mut state, &at_rest(1.0), 0.5);

        // desired velocity = 2 * (1 + 0.5 / 1)
        assert_eq!(state.integral_pos, 0.5);
        assert_eq!(state.smoothed_vel, 3.0);
        assert_eq!(force, 3.0);
    }

    #[test]
    fn test_velocity_setpoint_smoothing() {
        let mut config = velocity_only(10.0);
        config.ema_smoothing = 0.75;
        let mut state = PiPiState {
            integral_pos: 0.0,
            integral_vel: 0.0,
            smoothed_vel: 2.0,
        };

        pi_pi_cascade(&config, &mut state, &at_rest(6.0), DT);
        assert_relative_eq!(state.smoothed_vel, 0.75 * 2.0 + 0.25 * 6.0);

        // Full smoothing holds the setpoint
        config.ema_smoothing = 1.0;
        let held = state.smoothed_vel;
        pi_pi_cascade(&config, &mut state, &at_rest(-6.0), DT);
        assert_eq!(state.smoothed_vel, held);
    }

    #[test]
    fn test_inner_pi_tracks_velocity_feedback() {
        let config = PiPiConfig {
            kp_vel: 4.0,
            ti_vel: 0.5,
            clamp_vel: 1.0,
            max_velocity: 10.0,
            ..PiPiConfig::default()
        };
        let mut state = PiPiState {
            integral_pos: 0.0,
            integral_vel: 0.0,
            smoothed_vel: 0.0,
        };

        let force = pi_pi_cascade(&config, &mut state, &ActuatorInputs::new(2.0, 0.0, 1.5), 0.1);

        // velocity error = 0.5, integral = 0.05
        assert_relative_eq!(state.integral_vel, 0.05);
        assert_relative_eq!(force, 4.0 * (0.5 + 0.05 / 0.5));
    }

    #[test]
    fn test_bias_force_is_added() {
        let config = velocity_only(10.0);

        for bias in [-9.81, 0.0, 3.0] {
            let mut state = PiPiState {
                integral_pos: 0.0,
                integral_vel: 0.0,
                smoothed_vel: 0.0,
            };
            let inputs = at_rest(1.0).with_bias_force(bias);
            assert_eq!(pi_pi_cascade(&config, &mut state, &inputs, DT), 1.0 + bias);
        }
    }

    #[test]
    fn test_bias_then_saturation() {
        let mut config = make_pi_pi(velocity_only(10.0));
        config.force_range = ForceRange::new(-2.0, 2.0);
        let mut state = zeroed_state(&config);

        let inputs = at_rest(1.5).with_bias_force(1.0);
        assert_eq!(evaluate(&config, &mut state, &inputs, DT), 2.0);
    }
}

mod test_pd_pi_cascade {

    use super::*;

    fn zero_state() -> PdPiState<f64> {
        PdPiState {
            last_error: 0.0,
            last_derivative: 0.0,
            integral_vel: 0.0,
            smoothed_pos: 0.0,
        }
    }

    #[test]
    fn test_outer_bypass_uses_raw_command() {
        let config = PdPiConfig {
            kp_pos: 0.0,
            kp_vel: 1.0,
            ema_smoothing: 0.75,
            max_velocity: 10.0,
            ..PdPiConfig::default()
        };
        let mut state = PdPiState {
            // Stale outer memory has no effect when bypassed
            last_error: 5.0,
            last_derivative: -5.0,
            ..zero_state()
        };

        let force = pd_pi_cascade(&config, &mut state, &at_rest(4.0), DT);

        // The smoothed command is still updated but the raw command drives the inner loop
        assert_eq!(state.smoothed_pos, 1.0);
        assert_eq!(state.last_error, 5.0);
        assert_eq!(state.last_derivative, -5.0);
        assert_eq!(force, 4.0);
    }

    #[test]
    fn test_outer_pd_uses_smoothed_command() {
        let config = PdPiConfig {
            kp_pos: 2.0,
            td_pos: 0.1,
            derivative_smoothing: 1.0,
            kp_vel: 1.0,
            ema_smoothing: 0.5,
            max_velocity: 100.0,
            ..PdPiConfig::default()
        };
        let mut state = zero_state();

        let force = pd_pi_cascade(&config, &mut state, &at_rest(4.0), 0.5);

        // smoothed = 2, error = 2, derivative = 2 / 0.5 = 4
        assert_eq!(state.smoothed_pos, 2.0);
        assert_eq!(state.last_error, 2.0);
        assert_eq!(state.last_derivative, 4.0);
        assert_relative_eq!(force, 2.0 * (2.0 + 4.0 * 0.1));
    }

    #[test]
    fn test_desired_velocity_is_clamped() {
        let config = PdPiConfig {
            kp_pos: 1000.0,
            kp_vel: 1.0,
            max_velocity: 0.5,
            ..PdPiConfig::default()
        };

        for (command, expected) in [(3.0, 0.5), (-3.0, -0.5)] {
            let mut state = zero_state();
            assert_eq!(
                pd_pi_cascade(&config, &mut state, &at_rest(command), DT),
                expected
            );
        }
    }

    #[test]
    fn test_inner_pi_and_bias() {
        let config = PdPiConfig {
            kp_vel: 2.0,
            ti_vel: 1.0,
            clamp_vel: 0.01,
            max_velocity: 10.0,
            ..PdPiConfig::default()
        };
        let mut state = zero_state();

        let inputs = ActuatorInputs::new(1.0, 0.0, 0.0).with_bias_force(-3.0);
        let force = pd_pi_cascade(&config, &mut state, &inputs, 0.1);

        // integral 0.1 clamped to 0.01
        assert_eq!(state.integral_vel, 0.01);
        assert_relative_eq!(force, 2.0 * (1.0 + 0.01) - 3.0);
    }
}

mod test_dispatch {

    use super::*;

    #[test]
    fn test_dispatch_follows_configuration() {
        let pid = make_pid(
            PidConfig {
                kp: 1.0,
                ..PidConfig::default()
            },
            ForceRange::unbounded(),
        );
        let pi_pi = make_pi_pi(PiPiConfig {
            kp_vel: 1.0,
            max_velocity: 10.0,
            ..PiPiConfig::default()
        });
        let pd_pi = make_pd_pi(PdPiConfig {
            kp_vel: 1.0,
            max_velocity: 10.0,
            ..PdPiConfig::default()
        });

        let inputs = ActuatorInputs::new(2.0, 0.5, 0.0).with_bias_force(1.0);

        // PID acts on position error and ignores the bias
        let mut state = zeroed_state(&pid);
        assert_eq!(evaluate(&pid, &mut state, &inputs, DT), 1.5);

        // The cascades bypass their outer loop and add the bias
        let mut state = zeroed_state(&pi_pi);
        assert_eq!(evaluate(&pi_pi, &mut state, &inputs, DT), 3.0);
        assert!(matches!(state, ControllerState::PiPi(_)));

        let mut state = zeroed_state(&pd_pi);
        assert_eq!(evaluate(&pd_pi, &mut state, &inputs, DT), 3.0);
        assert!(matches!(state, ControllerState::PdPi(_)));
    }
}
