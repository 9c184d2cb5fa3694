use std::fmt;

use chrono::{DateTime, Utc};
use geo::Point;
use serde::Serialize;

/// A single GPS fix read from the source text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    /// Seconds since the unix epoch, possibly fractional.
    pub timestamp: f64,
    pub time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub odometer: Option<i64>,
}

impl Sample {
    /// Returns None if any value is not finite or the timestamp has no calendar time.
    pub fn new(timestamp: f64, latitude: f64, longitude: f64, odometer: Option<i64>) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        let time = derive_time(timestamp)?;
        Some(Self {
            timestamp,
            time,
            latitude,
            longitude,
            odometer,
        })
    }

    pub fn point(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.6}, {:.6})",
            self.time.format("%Y-%m-%d %H:%M:%S"),
            self.latitude,
            self.longitude
        )?;
        if let Some(odometer) = self.odometer {
            write!(f, " odometer {odometer}")?;
        }
        Ok(())
    }
}

pub fn derive_time(timestamp: f64) -> Option<DateTime<Utc>> {
    if !timestamp.is_finite() {
        return None;
    }
    let secs = timestamp.floor();
    if secs < i64::MIN as f64 || secs > i64::MAX as f64 {
        return None;
    }
    // rounding can carry a whole second into the nanos
    let nanos = ((timestamp - secs) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos)
}

/// Inverse of [`derive_time`].
pub fn to_timestamp(time: &DateTime<Utc>) -> f64 {
    time.timestamp() as f64 + f64::from(time.timestamp_subsec_nanos()) / 1e9
}
