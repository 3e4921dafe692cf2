//! Holds a gravity-loaded pendulum at a target angle with each controller type
//! This example requires the `--features simulation` flag to be enabled.
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

use nalgebra as na;

use actuator_pid::config::{ActuatorConfig, GAIN_WIDTH};
use actuator_pid::controller::evaluate;
use actuator_pid::sim;
use actuator_pid::state::ControllerState;

const FIXED_STEP_SIZE_S: f64 = 0.001;
const DURATION_S: f64 = 4.0;

pub fn main() {
    #[rustfmt::skip]
    let gains: [(i32, [f64; GAIN_WIDTH]); 3] = [
        (0, [60.0, 0.3, 1.0, 0.1, 0.5, 0.0, 0.0, 0.0]),
        (1, [5.0, 1.0, 0.2, 20.0, 0.5, 10.0, 0.5, 3.0]),
        (2, [5.0, 0.05, 0.5, 20.0, 0.5, 10.0, 0.9, 3.0]),
    ];

    let mdl = sim::Pendulum {
        mass: 1.0,
        length: 0.5,
        damping: 0.05,
        gravity: 9.81,
    };
    let square = sim::SignalGenerator::new(sim::WaveForm::Square, 0.4, 0.6);

    for (tag, gains) in gains {
        let config = match ActuatorConfig::from_raw(tag, &gains, [-20.0, 20.0]) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("invalid configuration for tag {tag}: {err}");
                continue;
            }
        };
        let mut state = ControllerState::zeroed(config.kind());
        let mut x = na::Vector2::<f64>::zeros();
        let mut peak_torque: f64 = 0.0;

        let n_steps = (DURATION_S / FIXED_STEP_SIZE_S) as usize;
        for i in 0..n_steps {
            let time = i as f64 * FIXED_STEP_SIZE_S;
            let setpoint = square.generate(time);
            let torque = evaluate(&config, &mut state, &mdl.inputs(x, setpoint), FIXED_STEP_SIZE_S);
            peak_torque = peak_torque.max(torque.abs());
            x = sim::rk4_step(|x| mdl.f(x, torque), x, FIXED_STEP_SIZE_S);

            if i % 500 == 0 {
                println!(
                    "{:?} t={time:.2}s setpoint={setpoint:+.3} q={:+.4} q'={:+.4} torque={torque:+.3}",
                    config.kind(),
                    x[0],
                    x[1],
                );
            }
        }

        println!(
            "{:?} final q={:+.4}, peak torque {peak_torque:.2} within {:?}",
            config.kind(),
            x[0],
            config.force_range,
        );
    }
}
