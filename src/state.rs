//! Bell state representation
//!
//! - `Measurement`: one gyro sample `(t, rate)`
//! - `BellState`: snapshot of the observer record (angle, rate, torque constant)

/// One angular-rate sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    /// Sample time [s]
    pub t: f64,
    /// Measured angular rate [rad/s]
    pub rate: f64,
}

impl Measurement {
    pub fn new(t: f64, rate: f64) -> Self {
        Self { t, rate }
    }
}

/// Snapshot of the bell observer record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BellState {
    /// Time of the last accepted sample [s]
    pub t: f64,
    /// Estimated angle [rad], 0 at bottom dead center
    pub theta: f64,
    /// Estimated rate [rad/s]
    pub omega: f64,
    /// Torque constant Mg/I [1/s^2]
    pub mg_i: f64,
    /// Last raw measured rate [rad/s]
    pub last_rate: f64,
}

impl BellState {
    pub fn new(t: f64, theta: f64, omega: f64, mg_i: f64, last_rate: f64) -> Self {
        Self {
            t,
            theta,
            omega,
            mg_i,
            last_rate,
        }
    }

    /// Bell at rest at `rest_angle`, already moving at `rate`.
    pub fn at_rest(t: f64, rest_angle: f64, rate: f64, mg_i: f64) -> Self {
        Self::new(t, rest_angle, rate, mg_i, rate)
    }

    pub fn angle_degrees(&self) -> f64 {
        self.theta.to_degrees()
    }
}
