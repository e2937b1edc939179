use crate::foundation::error::{SongvidError, SongvidResult};

/// Tolerance used when comparing durations in seconds.
pub const DURATION_EPSILON: f64 = 1e-6;

/// Trailing remainders at or below this many seconds are float noise, not truncation.
pub const TRUNCATION_REPORT_THRESHOLD: f64 = 0.1;

/// Half-open time interval `[start, end)` in seconds.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Interval {
    /// Inclusive start.
    pub start: f64,
    /// Exclusive end.
    pub end: f64,
}

impl Interval {
    /// Create a validated interval with finite bounds and `0 <= start < end`.
    pub fn new(start: f64, end: f64) -> SongvidResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(SongvidError::validation("interval bounds must be finite"));
        }
        if start < 0.0 || start >= end {
            return Err(SongvidError::validation(format!(
                "interval must satisfy 0 <= start < end, got [{start}, {end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Interval length in seconds.
    pub fn len(self) -> f64 {
        self.end - self.start
    }

    /// Return `true` when `t` lies in `[start, end)`.
    pub fn contains(self, t: f64) -> bool {
        self.start <= t && t < self.end
    }

    /// Midpoint of the interval.
    pub fn midpoint(self) -> f64 {
        self.start + self.len() / 2.0
    }
}

/// Return `true` when two durations are equal within [`DURATION_EPSILON`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= DURATION_EPSILON
}

/// Validate a user-facing duration: finite and strictly positive.
pub fn ensure_positive_duration(what: &str, seconds: f64) -> SongvidResult<f64> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(SongvidError::validation(format!(
            "{what} must be a finite positive number of seconds, got {seconds}"
        )));
    }
    Ok(seconds)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/time.rs"]
mod tests;
