//! Bell observer implementation
//!
//! Tracks swing angle, swing rate and the torque constant Mg/I of a bell from
//! a stream of gyro rate samples. Each sample goes through:
//!
//! 1. dropout check (reset on a large time gap)
//! 2. raw angular acceleration into a sliding line fit
//! 3. one explicit Euler step of `theta'' = -Mg/I * sin(theta)`
//! 4. fast-motion corrections: angle pull toward bottom dead center when the
//!    fitted acceleration changes sign, and torque constant adaptation
//! 5. trapezoidal angle integration
//! 6. complementary blend of forecast and measured rate

use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::params::BellParams;
use crate::state::{BellState, Measurement};
use crate::window::RollingLinearFit;

/// What a single [`BellObserver::update`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The time gap exceeded the dropout threshold and the record was reset.
    Reset,
    /// The sample was older than the last one and was dropped.
    OutOfOrder,
    /// Normal tracking step.
    Tracked {
        /// Fitted acceleration changed sign and the angle was attenuated.
        bdc_crossing: bool,
        /// The torque constant was adapted.
        torque_adjusted: bool,
    },
}

/// Bell observer
///
/// Owns its record exclusively and is mutated only through
/// [`update`](Self::update) and [`reset`](Self::reset). Callers feeding it
/// from several sources must serialize calls themselves.
#[derive(Debug, Clone)]
pub struct BellObserver {
    /// Observer parameters
    params: BellParams,
    /// Current record
    state: BellState,
    /// Line fit over `(t, measured angular acceleration)`
    accel: RollingLinearFit,
}

impl BellObserver {
    /// Create a new observer at time `t0`, bell at rest.
    pub fn new(params: BellParams, t0: f64) -> Result<Self> {
        params.validate()?;
        let accel = RollingLinearFit::new(params.window_capacity)?;
        Ok(Self {
            state: BellState::at_rest(t0, params.rest_angle, 0.0, params.initial_torque),
            params,
            accel,
        })
    }

    /// Seed the record directly. The acceleration window is left untouched.
    pub fn init(&mut self, initial_state: BellState) {
        self.state = initial_state;
    }

    /// Reinitialize at time `t` with the bell at rest angle, moving at `rate`.
    pub fn reset(&mut self, t: f64, rate: f64) {
        self.state = BellState::at_rest(
            t,
            self.params.rest_angle,
            rate,
            self.params.initial_torque,
        );
        self.accel.clear();
    }

    /// Process one gyro sample.
    pub fn update(&mut self, t: f64, rate: f64) -> StepOutcome {
        let p = self.params;
        let dt = t - self.state.t;

        if dt > p.dropout_gap {
            debug!(t, gap = dt, "sensor dropout, resetting bell estimate");
            self.reset(t, rate);
            return StepOutcome::Reset;
        }
        if dt < 0.0 {
            warn!(t, last_t = self.state.t, "dropping out-of-order gyro sample");
            return StepOutcome::OutOfOrder;
        }

        let d_rate = rate - self.state.last_rate;
        if dt > 0.0 {
            self.accel.add(t, d_rate / dt);
        }

        let sin_theta = self.state.theta.sin();
        let forward_omega = self.state.omega - self.state.mg_i * dt * sin_theta;

        let mut bdc_crossing = false;
        let mut torque_adjusted = false;
        // Near the top of the swing the rope dominates; only correct when fast.
        if dt > 0.0 && rate.abs() > p.min_correction_rate {
            let acc0 = self.accel.estimate(self.state.t);
            let acc1 = self.accel.estimate(t);
            if acc0 * acc1 <= 0.0 {
                self.state.theta *= p.bdc_attenuation;
                bdc_crossing = true;
                trace!(t, acc0, acc1, theta = self.state.theta, "bdc crossing");
            }

            let sin_theta = self.state.theta.sin();
            if sin_theta.abs() > p.min_sin_theta {
                let apparent = -d_rate / (dt * sin_theta);
                self.state.mg_i = p.torque_policy.adapt(self.state.mg_i, apparent);
                torque_adjusted = true;
                trace!(t, apparent, mg_i = self.state.mg_i, "torque constant adapted");
            }
        }

        self.state.theta += dt * (self.state.omega + forward_omega) / 2.0;
        self.state.omega = p.alpha_omega * forward_omega + (1.0 - p.alpha_omega) * rate;
        self.state.last_rate = rate;
        self.state.t = t;

        StepOutcome::Tracked {
            bdc_crossing,
            torque_adjusted,
        }
    }

    /// Process a [`Measurement`].
    pub fn observe(&mut self, m: Measurement) -> StepOutcome {
        self.update(m.t, m.rate)
    }

    /// Estimated angle in degrees
    pub fn angle(&self) -> f64 {
        self.state.angle_degrees()
    }

    /// Estimated rate in rad/s
    pub fn rate(&self) -> f64 {
        self.state.omega
    }

    pub fn torque_constant(&self) -> f64 {
        self.state.mg_i
    }

    /// Get the current state
    pub fn state(&self) -> BellState {
        self.state
    }

    pub fn params(&self) -> &BellParams {
        &self.params
    }

    /// The acceleration line fit
    pub fn window(&self) -> &RollingLinearFit {
        &self.accel
    }
}
