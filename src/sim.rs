//! Simulation harness for the bell observer
//!
//! Generates a synthetic swing from the nonlinear pendulum
//! `theta'' = -k * sin(theta)`, samples its rate like a gyro would and runs
//! the observer over it.

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

use crate::error::{Result, StrikeError};
use crate::observer::BellObserver;
use crate::params::BellParams;

/// RK4 substeps per gyro sample
const SUBSTEPS: usize = 20;

/// True pendulum state
#[derive(Debug, Clone, Copy)]
pub struct TrueState {
    pub theta: f64,
    pub omega: f64,
}

impl TrueState {
    pub fn new(theta: f64, omega: f64) -> Self {
        Self { theta, omega }
    }

    /// Advance by `dt` with one RK4 step of `theta'' = -k * sin(theta)`.
    pub fn rk4_step(&mut self, k: f64, dt: f64) {
        let f = |theta: f64, omega: f64| (omega, -k * theta.sin());

        let (k1t, k1w) = f(self.theta, self.omega);
        let (k2t, k2w) = f(self.theta + dt / 2.0 * k1t, self.omega + dt / 2.0 * k1w);
        let (k3t, k3w) = f(self.theta + dt / 2.0 * k2t, self.omega + dt / 2.0 * k2w);
        let (k4t, k4w) = f(self.theta + dt * k3t, self.omega + dt * k3w);

        self.theta += dt / 6.0 * (k1t + 2.0 * k2t + 2.0 * k3t + k4t);
        self.omega += dt / 6.0 * (k1w + 2.0 * k2w + 2.0 * k3w + k4w);
    }
}

/// Simulation configuration
#[derive(Debug, Clone)]
pub struct PendulumConfig {
    /// Gyro sample period [s]
    pub dt: f64,
    /// Simulated time [s]
    pub duration: f64,
    /// True torque constant k [1/s^2]
    pub torque_constant: f64,
    /// Release angle [rad], bell released from rest
    pub initial_angle: f64,
    /// Gyro noise standard deviation [rad/s]
    pub noise_sigma: f64,
    /// Start of a sensor dropout [s], if any
    pub dropout_at: Option<f64>,
    /// Length of the dropout [s]
    pub dropout_gap: f64,
    pub seed: u64,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,
            duration: 120.0,
            torque_constant: 12.25,
            initial_angle: 2.5,
            noise_sigma: 0.0,
            dropout_at: None,
            dropout_gap: 1.5,
            seed: 42,
        }
    }
}

impl PendulumConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(StrikeError::invalid_config("dt must be finite and > 0"));
        }
        if !(self.duration.is_finite() && self.duration >= self.dt) {
            return Err(StrikeError::invalid_config("duration must be >= dt"));
        }
        if !(self.torque_constant.is_finite() && self.torque_constant > 0.0) {
            return Err(StrikeError::invalid_config(
                "torque_constant must be finite and > 0",
            ));
        }
        if !self.initial_angle.is_finite() {
            return Err(StrikeError::invalid_config("initial_angle must be finite"));
        }
        if !(self.dropout_gap.is_finite() && self.dropout_gap >= 0.0) {
            return Err(StrikeError::invalid_config(
                "dropout_gap must be finite and >= 0",
            ));
        }
        Ok(())
    }

    fn in_dropout(&self, t: f64) -> bool {
        self.dropout_at
            .is_some_and(|start| t >= start && t < start + self.dropout_gap)
    }
}

/// Simulation results for one delivered gyro sample
#[derive(Debug, Clone, Serialize)]
pub struct SimStep {
    pub t: f64,
    pub theta_true: f64,
    pub omega_true: f64,
    pub measured: f64,
    pub theta_est: f64,
    pub omega_est: f64,
    pub mg_i: f64,
    pub err_theta: f64,
    pub err_omega: f64,
}

/// Run the observer over a simulated swing.
pub fn run_simulation(config: &PendulumConfig, params: BellParams) -> Result<Vec<SimStep>> {
    config.validate()?;
    let mut rng = rand::rngs::StdRng::seed_from_u64(config.seed);
    let noise_dist = Normal::new(0.0, config.noise_sigma)
        .map_err(|e| StrikeError::invalid_config(format!("noise_sigma: {e}")))?;

    let mut truth = TrueState::new(config.initial_angle, 0.0);
    let mut observer = BellObserver::new(params, 0.0)?;

    let steps = (config.duration / config.dt).round() as usize;
    let h = config.dt / SUBSTEPS as f64;
    let mut results = Vec::with_capacity(steps);

    for step in 1..=steps {
        for _ in 0..SUBSTEPS {
            truth.rk4_step(config.torque_constant, h);
        }
        let t = step as f64 * config.dt;
        if config.in_dropout(t) {
            continue;
        }

        let measured = truth.omega + noise_dist.sample(&mut rng);
        observer.update(t, measured);
        let est = observer.state();

        results.push(SimStep {
            t,
            theta_true: truth.theta,
            omega_true: truth.omega,
            measured,
            theta_est: est.theta,
            omega_est: est.omega,
            mg_i: est.mg_i,
            err_theta: est.theta - truth.theta,
            err_omega: est.omega - truth.omega,
        });
    }

    Ok(results)
}

/// Calculate RMS error
pub fn rms_error(errors: &[f64]) -> f64 {
    if errors.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = errors.iter().map(|&e| e * e).sum();
    (sum_sq / errors.len() as f64).sqrt()
}

/// Largest absolute error
pub fn max_abs_error(errors: &[f64]) -> f64 {
    errors.iter().map(|e| e.abs()).fold(0.0f64, f64::max)
}
