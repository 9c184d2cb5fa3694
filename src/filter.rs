use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// Rejected user actions. Nothing changes state when one of these is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("please select both a start and an end time")]
    MissingTimeBounds,
    #[error("{0:?} is not a valid time, expected YYYY-MM-DDTHH:MM")]
    InvalidTime(String),
    #[error("the start time must be before the end time")]
    InvertedTimeRange,
    #[error("there is no data to play back")]
    EmptyTrajectory,
    #[error("playback speed must be a positive number, got {0}")]
    InvalidRate(f64),
}

impl ValidationError {
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingTimeBounds => "missingTimeBounds",
            ValidationError::InvalidTime(_) => "invalidTime",
            ValidationError::InvertedTimeRange => "invertedTimeRange",
            ValidationError::EmptyTrajectory => "emptyTrajectory",
            ValidationError::InvalidRate(_) => "invalidRate",
        }
    }
}

const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const INPUT_FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

/// A validated filter request, `start` strictly before `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvertedTimeRange);
        }
        Ok(Self { start, end })
    }

    /// Validates what the user typed into the start/end controls.
    pub fn from_inputs(start: Option<&str>, end: Option<&str>) -> Result<Self, ValidationError> {
        fn present(x: Option<&str>) -> Option<&str> {
            x.map(str::trim).filter(|x| !x.is_empty())
        }

        let (Some(start), Some(end)) = (present(start), present(end)) else {
            return Err(ValidationError::MissingTimeBounds);
        };
        Self::new(parse_time_input(start)?, parse_time_input(end)?)
    }
}

/// Accepts `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC) or RFC 3339.
pub fn parse_time_input(input: &str) -> Result<DateTime<Utc>, ValidationError> {
    let input = input.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(input) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(input, INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(input, INPUT_FORMAT_SECONDS))
        .map(|naive| naive.and_utc())
        .map_err(|_| ValidationError::InvalidTime(input.to_string()))
}

/// Renders a time the way the filter controls expect it, truncated to the minute.
pub fn format_time_input(time: &DateTime<Utc>) -> String {
    time.format(INPUT_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_inputs() {
        let w = TimeWindow::from_inputs(Some("2025-08-07T05:09"), Some("2025-08-07T05:20")).unwrap();
        assert_eq!(w.start.timestamp(), 1754543340);
        assert_eq!(w.end.timestamp(), 1754544000);

        let w = TimeWindow::from_inputs(Some("2025-08-07T05:09:21Z"), Some("2025-08-07T08:20:00+03:00"))
            .unwrap();
        assert_eq!(w.start.timestamp(), 1754543361);
        assert_eq!(w.end.timestamp(), 1754544000);

        let w = TimeWindow::from_inputs(Some("2025-08-07T05:09:21"), Some(" 2025-08-07T05:10 ")).unwrap();
        assert_eq!(w.start.timestamp(), 1754543361);
    }

    #[test]
    fn rejected() {
        assert_eq!(
            TimeWindow::from_inputs(None, Some("2025-08-07T05:20")),
            Err(ValidationError::MissingTimeBounds)
        );
        assert_eq!(
            TimeWindow::from_inputs(Some("2025-08-07T05:20"), Some("  ")),
            Err(ValidationError::MissingTimeBounds)
        );
        assert_eq!(
            TimeWindow::from_inputs(Some(""), None),
            Err(ValidationError::MissingTimeBounds)
        );
        assert_eq!(
            TimeWindow::from_inputs(Some("2025-08-07T05:20"), Some("2025-08-07T05:20")),
            Err(ValidationError::InvertedTimeRange)
        );
        assert_eq!(
            TimeWindow::from_inputs(Some("2025-08-07T05:21"), Some("2025-08-07T05:20")),
            Err(ValidationError::InvertedTimeRange)
        );
        assert_eq!(
            TimeWindow::from_inputs(Some("yesterday"), Some("2025-08-07T05:20")),
            Err(ValidationError::InvalidTime("yesterday".into()))
        );
    }

    #[test]
    fn messages() {
        assert_eq!(
            ValidationError::MissingTimeBounds.to_string(),
            "please select both a start and an end time"
        );
        assert_eq!(
            ValidationError::InvertedTimeRange.to_string(),
            "the start time must be before the end time"
        );
        assert_eq!(
            ValidationError::EmptyTrajectory.to_string(),
            "there is no data to play back"
        );
    }

    #[test]
    fn input_format() {
        let time = crate::sample::derive_time(1754543792.0).unwrap();
        assert_eq!(format_time_input(&time), "2025-08-07T05:16");
        assert_eq!(
            parse_time_input(&format_time_input(&time)).unwrap().timestamp(),
            1754543760
        );
    }
}
