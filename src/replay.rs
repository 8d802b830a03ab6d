//! Sensor log ingestion and replay
//!
//! The recorded log is whitespace delimited. A line is a gyro sample only when
//! its second field is `GYR`; field 0 is the time in integer milliseconds and
//! field 4 the angular rate in rad/s. Every other line is skipped.

use std::io::BufRead;

use crate::error::{Result, StrikeError};
use crate::observer::{BellObserver, StepOutcome};
use crate::state::Measurement;

/// Tag marking a gyro line
pub const GYRO_TAG: &str = "GYR";

/// Parse one log line. `line_no` is only used for error messages.
///
/// Returns `Ok(None)` for lines that are not gyro samples.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Measurement>> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 2 || fields[1] != GYRO_TAG {
        return Ok(None);
    }
    if fields.len() < 5 {
        return Err(StrikeError::parse(
            line_no,
            format!("gyro line has {} fields, expected at least 5", fields.len()),
        ));
    }

    let millis: i64 = fields[0].parse().map_err(|e| {
        StrikeError::parse(line_no, format!("bad timestamp {:?}: {e}", fields[0]))
    })?;
    let rate: f64 = fields[4]
        .parse()
        .map_err(|e| StrikeError::parse(line_no, format!("bad rate {:?}: {e}", fields[4])))?;

    Ok(Some(Measurement::new(millis as f64 / 1000.0, rate)))
}

/// Read every gyro sample from a log.
pub fn read_log<R: BufRead>(reader: R) -> Result<Vec<Measurement>> {
    let mut samples = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(m) = parse_line(&line, idx + 1)? {
            samples.push(m);
        }
    }
    Ok(samples)
}

/// Counters collected while replaying samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub samples: usize,
    pub resets: usize,
    pub out_of_order: usize,
    pub bdc_crossings: usize,
    pub torque_updates: usize,
}

impl ReplaySummary {
    pub fn record(&mut self, outcome: StepOutcome) {
        self.samples += 1;
        match outcome {
            StepOutcome::Reset => self.resets += 1,
            StepOutcome::OutOfOrder => self.out_of_order += 1,
            StepOutcome::Tracked {
                bdc_crossing,
                torque_adjusted,
            } => {
                self.bdc_crossings += usize::from(bdc_crossing);
                self.torque_updates += usize::from(torque_adjusted);
            }
        }
    }
}

/// Feed `samples` through `observer` in order.
pub fn replay(observer: &mut BellObserver, samples: &[Measurement]) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for &m in samples {
        summary.record(observer.observe(m));
    }
    summary
}
