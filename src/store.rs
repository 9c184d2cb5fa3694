use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    bounds::{Bounds, BoundsConfig},
    loader,
    sample::{to_timestamp, Sample},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    pub min: DateTime<Utc>,
    pub max: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewStats {
    pub total: usize,
    pub visible: usize,
}

/// The loaded track, always sorted by timestamp.
#[derive(Debug, Clone)]
pub struct Trajectory {
    samples: Vec<Sample>,
    fallback_bounds: Bounds,
}

impl Trajectory {
    pub fn new(samples: Vec<Sample>) -> Self {
        let mut trajectory = Self {
            samples: Vec::new(),
            fallback_bounds: BoundsConfig::default().into(),
        };
        trajectory.replace(samples);
        trajectory
    }

    pub fn from_text(text: &str) -> Self {
        // loader output is already sorted, replace() keeps that cheap
        Self::new(loader::parse(text))
    }

    pub fn with_fallback_bounds(mut self, bounds: Bounds) -> Self {
        self.fallback_bounds = bounds;
        self
    }

    /// Swaps in a freshly loaded track.
    pub fn replace(&mut self, mut samples: Vec<Sample>) {
        samples.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        self.samples = samples;
    }

    pub fn get_all(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples with `start <= timestamp <= end`. A missing bound means no filtering at all.
    pub fn filter_by_time_range(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> &[Sample] {
        let (Some(start), Some(end)) = (start, end) else {
            return &self.samples;
        };
        let (start, end) = (to_timestamp(&start), to_timestamp(&end));

        let lo = self.samples.partition_point(|s| s.timestamp < start);
        let hi = self.samples.partition_point(|s| s.timestamp <= end);
        if lo >= hi {
            return &[];
        }
        &self.samples[lo..hi]
    }

    /// Falls back to the current time for both ends when there is no data.
    pub fn get_time_range(&self) -> TimeRange {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) => TimeRange {
                min: first.time,
                max: last.time,
            },
            _ => {
                let now = Utc::now();
                TimeRange { min: now, max: now }
            }
        }
    }

    /// Falls back to the configured box when there is no data.
    pub fn get_bounds(&self) -> Bounds {
        let mut samples = self.samples.iter();
        let Some(first) = samples.next() else {
            return self.fallback_bounds;
        };

        let mut bounds = Bounds::from_point(first.latitude, first.longitude);
        for s in samples {
            bounds.add(s.latitude, s.longitude);
        }
        bounds
    }

    pub fn endpoints(&self) -> Option<(&Sample, &Sample)> {
        Some((self.samples.first()?, self.samples.last()?))
    }

    pub fn stats(&self, visible: &[Sample]) -> ViewStats {
        ViewStats {
            total: self.samples.len(),
            visible: visible.len(),
        }
    }
}
