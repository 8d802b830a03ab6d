//! Strike - bell swing estimation
//!
//! Online estimation of a swinging bell's angle, rate and torque constant
//! (Mg/I) from a noisy, irregularly time-stamped gyro rate stream. A sliding
//! least-squares fit over measured angular acceleration finds bottom dead
//! center, which anchors the integrated angle against drift.

pub mod error;
pub mod observer;
pub mod params;
pub mod replay;
pub mod sim;
pub mod state;
pub mod window;

// Re-export main types
pub use error::StrikeError;
pub use observer::{BellObserver, StepOutcome};
pub use params::{BellParams, TorquePolicy};
pub use replay::{read_log, replay, ReplaySummary};
pub use state::{BellState, Measurement};
pub use window::RollingLinearFit;
