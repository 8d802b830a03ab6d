//! Sliding-window least-squares line fit
//!
//! Keeps the last `capacity` `(x, y)` samples in a ring buffer together with
//! running sums, so the fit can be updated in O(1) per sample.

use crate::error::{Result, StrikeError};

/// Relative tolerance used by [`RollingLinearFit::check`].
pub const CHECK_TOLERANCE: f64 = 1e-8;

/// Fixed-capacity online linear regression over the most recent samples.
///
/// Two evaluation paths are kept on purpose:
/// - [`slope`](Self::slope) reads the running accumulators, which are updated
///   by subtract-on-evict and can drift over very long streams.
/// - [`estimate`](Self::estimate) re-sums the buffered samples directly.
///
/// [`check`](Self::check) and [`accumulator_drift`](Self::accumulator_drift)
/// compare the two.
///
/// # Degenerate fits
///
/// When every buffered `x` is equal (which includes a window holding one
/// sample), or `n·Σxx − Σx·Σx` is indistinguishable from zero at the
/// rounding level of its terms, the fit has no slope. `slope` and `estimate`
/// then return `f64::NAN` rather than a finite value.
#[derive(Debug, Clone)]
pub struct RollingLinearFit {
    capacity: usize,
    x: Vec<f64>,
    y: Vec<f64>,
    /// Slot the next sample is written to once the buffer is full.
    next: usize,
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_xy: f64,
}

impl RollingLinearFit {
    /// Default window size used by the bell observer.
    pub const DEFAULT_CAPACITY: usize = 20;

    /// Create an empty fit over at most `capacity` samples.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(StrikeError::invalid_config(
                "window capacity must be at least 1",
            ));
        }
        Ok(Self::empty(capacity))
    }

    fn empty(capacity: usize) -> Self {
        Self {
            capacity,
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            next: 0,
            sum_x: 0.0,
            sum_y: 0.0,
            sum_xx: 0.0,
            sum_xy: 0.0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered samples, never more than `capacity`.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.x.len() == self.capacity
    }

    /// Drop every sample, keeping the capacity.
    pub fn clear(&mut self) {
        self.x.clear();
        self.y.clear();
        self.next = 0;
        self.sum_x = 0.0;
        self.sum_y = 0.0;
        self.sum_xx = 0.0;
        self.sum_xy = 0.0;
    }

    /// Add one sample, evicting the oldest one when the window is full.
    pub fn add(&mut self, x: f64, y: f64) {
        if self.is_full() {
            let old_x = self.x[self.next];
            let old_y = self.y[self.next];
            self.sum_x -= old_x;
            self.sum_y -= old_y;
            self.sum_xx -= old_x * old_x;
            self.sum_xy -= old_x * old_y;
            self.x[self.next] = x;
            self.y[self.next] = y;
        } else {
            self.x.push(x);
            self.y.push(y);
        }
        self.next = (self.next + 1) % self.capacity;

        self.sum_x += x;
        self.sum_y += y;
        self.sum_xx += x * x;
        self.sum_xy += x * y;
    }

    /// Buffered samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let start = if self.is_full() { self.next } else { 0 };
        let len = self.len();
        (0..len).map(move |k| {
            let i = (start + k) % len;
            (self.x[i], self.y[i])
        })
    }

    /// Least-squares slope from the running accumulators.
    ///
    /// Returns `0.0` for an empty window and `NaN` for a degenerate fit.
    pub fn slope(&self) -> f64 {
        let n = self.len() as f64;
        if self.is_empty() {
            return 0.0;
        }
        let denom = n * self.sum_xx - self.sum_x * self.sum_x;
        if self.x_is_constant() || is_degenerate(n, denom, self.sum_xx) {
            return f64::NAN;
        }
        (n * self.sum_xy - self.sum_x * self.sum_y) / denom
    }

    /// Least-squares prediction of `y` at `x`, summed directly over the buffer.
    ///
    /// The samples are translated so that `x` sits at the origin before
    /// summing; the prediction is unchanged by the shift but large `x` values
    /// (absolute timestamps) no longer cancel catastrophically.
    ///
    /// Returns `0.0` for an empty window and `NaN` for a degenerate fit.
    pub fn estimate(&self, x: f64) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let n = self.len() as f64;
        let (mut su, mut sy, mut suu, mut suy) = (0.0, 0.0, 0.0, 0.0);
        for (&xi, &yi) in self.x.iter().zip(self.y.iter()) {
            let u = xi - x;
            su += u;
            sy += yi;
            suu += u * u;
            suy += u * yi;
        }
        let denom = n * suu - su * su;
        if self.x_is_constant() || is_degenerate(n, denom, suu) {
            return f64::NAN;
        }
        // ((n·0 − Σu)·Σuy + (Σuu − 0·Σu)·Σy) / denom
        (suu * sy - su * suy) / denom
    }

    fn x_is_constant(&self) -> bool {
        self.x.iter().all(|&xi| xi == self.x[0])
    }

    /// Rebuild a fresh fit from the retained samples and compare predictions
    /// at `x` within [`CHECK_TOLERANCE`].
    pub fn check(&self, x: f64) -> bool {
        let mut rebuilt = Self::empty(self.capacity);
        for (xi, yi) in self.samples() {
            rebuilt.add(xi, yi);
        }
        relative_eq(self.estimate(x), rebuilt.estimate(x), CHECK_TOLERANCE)
    }

    /// Worst relative deviation of the four running sums from an exact
    /// re-summation of the buffer.
    pub fn accumulator_drift(&self) -> f64 {
        let (mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0);
        let (mut ax, mut ay, mut axy) = (0.0, 0.0, 0.0);
        for (&xi, &yi) in self.x.iter().zip(self.y.iter()) {
            sx += xi;
            sy += yi;
            sxx += xi * xi;
            sxy += xi * yi;
            ax += xi.abs();
            ay += yi.abs();
            axy += (xi * yi).abs();
        }
        [
            drift(self.sum_x, sx, ax),
            drift(self.sum_y, sy, ay),
            drift(self.sum_xx, sxx, sxx),
            drift(self.sum_xy, sxy, axy),
        ]
        .into_iter()
        .fold(0.0, f64::max)
    }
}

impl Default for RollingLinearFit {
    fn default() -> Self {
        Self::empty(Self::DEFAULT_CAPACITY)
    }
}

/// `n·Σxx − Σx·Σx` is never negative; anything within a few ulps of
/// `n·Σxx` is cancellation noise.
fn is_degenerate(n: f64, denom: f64, sum_xx: f64) -> bool {
    denom <= 4.0 * f64::EPSILON * n * sum_xx.abs()
}

fn drift(running: f64, exact: f64, scale: f64) -> f64 {
    let deviation = (running - exact).abs();
    if deviation == 0.0 {
        0.0
    } else {
        deviation / scale.max(f64::MIN_POSITIVE)
    }
}

fn relative_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return a.is_nan() && b.is_nan();
    }
    (a - b).abs() <= tol * a.abs().max(b.abs()).max(f64::MIN_POSITIVE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_exact_line() {
        let mut fit = RollingLinearFit::new(20).unwrap();
        fit.add(1.0, 1.0);
        fit.add(2.0, 2.0);
        fit.add(3.0, 3.0);
        fit.add(4.0, 4.0);
        assert_eq!(fit.slope(), 1.0);
        assert_eq!(fit.estimate(5.0), 5.0);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            RollingLinearFit::new(0),
            Err(StrikeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_window_is_zero() {
        let fit = RollingLinearFit::new(4).unwrap();
        assert_eq!(fit.slope(), 0.0);
        assert_eq!(fit.estimate(3.0), 0.0);
    }

    #[test]
    fn test_degenerate_fit_is_nan() {
        let mut fit = RollingLinearFit::new(4).unwrap();
        fit.add(2.0, 1.0);
        assert!(fit.slope().is_nan());
        assert!(fit.estimate(3.0).is_nan());

        fit.add(2.0, 5.0);
        fit.add(2.0, -3.0);
        assert!(fit.slope().is_nan());
        assert!(fit.estimate(2.0).is_nan());
    }

    #[test]
    fn test_repeated_inexact_x_is_nan() {
        for (x, n) in [(0.7, 5), (1000.02, 6), (0.7, 3)] {
            let mut fit = RollingLinearFit::new(20).unwrap();
            for k in 0..n {
                fit.add(x, k as f64);
            }
            assert!(fit.slope().is_nan(), "x={x} n={n} slope={}", fit.slope());
            assert!(fit.estimate(x + 1.0).is_nan());
        }

        // Constant x reached through eviction, with residue in the sums.
        let mut fit = RollingLinearFit::new(3).unwrap();
        for i in 1..=3 {
            fit.add(i as f64 * 0.1, 1.0);
        }
        for k in 0..3 {
            fit.add(0.7, k as f64);
        }
        assert!(fit.slope().is_nan());
        assert!(fit.estimate(0.7).is_nan());
    }

    #[test]
    fn test_eviction_is_fifo() {
        let mut fit = RollingLinearFit::new(3).unwrap();
        for i in 1..=4 {
            fit.add(i as f64, 10.0 * i as f64);
        }
        assert_eq!(fit.len(), 3);
        let kept: Vec<_> = fit.samples().collect();
        assert_eq!(kept, vec![(2.0, 20.0), (3.0, 30.0), (4.0, 40.0)]);
        assert_eq!(fit.slope(), 10.0);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut fit = RollingLinearFit::new(5).unwrap();
        for i in 0..7 {
            fit.add(i as f64, 1.0);
        }
        fit.clear();
        assert!(fit.is_empty());
        assert_eq!(fit.capacity(), 5);
        assert_eq!(fit.slope(), 0.0);
        assert_eq!(fit.samples().count(), 0);
    }

    #[test]
    fn test_long_stream_stays_consistent() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut fit = RollingLinearFit::new(20).unwrap();
        for i in 0..50_000 {
            fit.add(i as f64 + rng.gen::<f64>(), i as f64 + rng.gen::<f64>());
        }
        assert_eq!(fit.len(), 20);
        assert!(fit.check(50_000.0));
        assert!(fit.accumulator_drift() < 1e-9);
    }
}
