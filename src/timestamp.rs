//! Colon-delimited caption timestamps (`HH:MM:SS.mmm`, `MM:SS.mmm`, `SS.mmm`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, SummaryError};

/// Convert a colon-delimited timestamp to seconds.
///
/// Fields are read right to left: the last field is seconds (fractions
/// allowed), each field before it is worth 60 times the next one. Any
/// number of fields is accepted, so `"1:30"` and `"00:01:30.000"` both
/// yield `90.0`.
pub fn to_seconds(timestamp: &str) -> Result<f64> {
    let trimmed = timestamp.trim();
    if trimmed.is_empty() {
        return Err(SummaryError::format("empty timestamp"));
    }

    let mut total = 0.0;
    for (i, field) in trimmed.split(':').rev().enumerate() {
        let value: f64 = field.trim().parse().map_err(|_| {
            SummaryError::format(format!("non-numeric field '{}' in timestamp '{}'", field, trimmed))
        })?;
        if !value.is_finite() || value < 0.0 {
            return Err(SummaryError::format(format!(
                "field '{}' in timestamp '{}' is out of range",
                field, trimmed
            )));
        }
        total += value * 60f64.powi(i as i32);
    }

    Ok(total)
}

/// Point in a media timeline, parsed from a caption timing line
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Timestamp(Duration);

impl Timestamp {
    pub fn from_secs_f64(seconds: f64) -> Result<Self> {
        Duration::try_from_secs_f64(seconds)
            .map(Self)
            .map_err(|e| SummaryError::format(format!("invalid time value {}: {}", seconds, e)))
    }

    pub fn parse(timestamp: &str) -> Result<Self> {
        Self::from_secs_f64(to_seconds(timestamp)?)
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0.as_secs_f64()
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl From<Duration> for Timestamp {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl FromStr for Timestamp {
    type Err = SummaryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_seconds = self.0.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        let milliseconds = self.0.subsec_millis();

        write!(f, "{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
    }
}
