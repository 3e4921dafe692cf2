use crate::controller::ActuatorInputs;
use nalgebra as na;

pub enum WaveForm {
    Sine,
    Square,
}

pub struct SignalGenerator {
    fcn: fn(f64) -> f64,
    amplitude: f64,
    offset: f64,
}

impl SignalGenerator {
    pub fn new(waveform: WaveForm, amplitude: f64, offset: f64) -> Self {
        Self {
            fcn: match waveform {
                WaveForm::Sine => f64::sin,
                WaveForm::Square => |x| x.sin().signum(),
            },
            amplitude,
            offset,
        }
    }

    pub fn generate(&self, time: f64) -> f64 {
        self.amplitude * (self.fcn)(time) + self.offset
    }
}

/// One classic Runge-Kutta step of `x' = f(x)` over a step of `h` seconds.
pub fn rk4_step<F>(f: F, x: na::Vector2<f64>, h: f64) -> na::Vector2<f64>
where
    F: Fn(na::Vector2<f64>) -> na::Vector2<f64>,
{
    let k1 = f(x);
    let k2 = f(x + k1 * (0.5 * h));
    let k3 = f(x + k2 * (0.5 * h));
    let k4 = f(x + k3 * h);
    x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (h / 6.0)
}

/// A point mass on a massless rod, hinged at a revolute joint with viscous damping.
///
/// The joint angle is measured from the downward vertical, so gravity pulls the mass back to
/// `q = 0`.
pub struct Pendulum {
    pub mass: f64,
    pub length: f64,
    pub damping: f64,
    pub gravity: f64,
}

impl Pendulum {
    /// Implements the joint-space dynamics
    ///
    /// m l² q'' + b q' + m g l sin(q) = τ
    ///
    /// on the state `x = [q, q']`.
    pub fn f(&self, x: na::Vector2<f64>, torque: f64) -> na::Vector2<f64> {
        let inertia = self.mass * self.length.powi(2);
        let accel = (torque - self.damping * x[1] - self.bias_force(x)) / inertia;
        na::vector![x[1], accel]
    }

    /// Gravity torque the joint must supply to hold the current angle. Passive damping is not
    /// part of the bias.
    pub fn bias_force(&self, x: na::Vector2<f64>) -> f64 {
        self.mass * self.gravity * self.length * x[0].sin()
    }

    /// Builds controller inputs from the current state.
    pub fn inputs(&self, x: na::Vector2<f64>, command: f64) -> ActuatorInputs<f64> {
        ActuatorInputs::new(command, x[0], x[1]).with_bias_force(self.bias_force(x))
    }
}
