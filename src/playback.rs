//! Step-by-step replay of a track.
//!
//! [`Sequencer`] is the bare state machine, it knows nothing about timers. The
//! [`crate::player::Player`] owns the single timer that calls [`Sequencer::tick`].

use std::{fmt, sync::Arc, time::Duration};

use serde::Deserialize;

use crate::{filter::ValidationError, sample::Sample};

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Tick interval at rate 1.
    pub base_interval_ms: u64,
    /// Lower limit on the tick interval, whatever the rate.
    pub min_interval_ms: u64,
    pub default_rate: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            base_interval_ms: 1000,
            min_interval_ms: 100,
            default_rate: 1.0,
        }
    }
}

impl PlaybackConfig {
    pub fn interval(&self, rate: f64) -> Result<Duration, ValidationError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(ValidationError::InvalidRate(rate));
        }
        let nanos = (self.base_interval_ms as f64 * 1_000_000.0 / rate).round();
        let scaled = Duration::from_nanos(nanos.min(u64::MAX as f64) as u64);
        // tokio intervals panic on a zero period
        Ok(scaled.max(Duration::from_millis(self.min_interval_ms.max(1))))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    Sample {
        index: usize,
        total: usize,
        sample: Sample,
    },
    /// The cursor ran past the end, the sequencer is idle again.
    Finished,
    /// Nothing to do: idle, or the tick belongs to an earlier run.
    Idle,
}

/// "3 of 10" while running, "-" when idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position(Option<(usize, usize)>);

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some((shown, total)) => write!(f, "{shown} of {total}"),
            None => f.write_str("-"),
        }
    }
}

#[derive(Debug)]
pub struct Sequencer {
    config: PlaybackConfig,
    samples: Arc<[Sample]>,
    cursor: usize,
    state: PlaybackState,
    run: u64,
}

impl Sequencer {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            samples: Vec::<Sample>::new().into(),
            cursor: 0,
            state: PlaybackState::Idle,
            run: 0,
        }
    }

    /// Starts a new run from the first sample and returns its tick interval.
    pub fn start(&mut self, samples: impl Into<Arc<[Sample]>>, rate: f64) -> Result<Duration, ValidationError> {
        let samples = samples.into();
        if samples.is_empty() {
            return Err(ValidationError::EmptyTrajectory);
        }
        let interval = self.config.interval(rate)?;

        self.samples = samples;
        self.cursor = 0;
        self.state = PlaybackState::Running;
        self.run += 1;
        Ok(interval)
    }

    /// Returns whether playback was running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.state == PlaybackState::Running;
        self.state = PlaybackState::Idle;
        self.cursor = 0;
        was_running
    }

    pub fn tick(&mut self) -> Tick {
        self.tick_run(self.run)
    }

    /// Like [`Sequencer::tick`], but only advances if `run` is still the current run.
    pub fn tick_run(&mut self, run: u64) -> Tick {
        if self.state != PlaybackState::Running || run != self.run {
            return Tick::Idle;
        }
        if self.cursor >= self.samples.len() {
            self.stop();
            return Tick::Finished;
        }

        let index = self.cursor;
        self.cursor += 1;
        Tick::Sample {
            index,
            total: self.samples.len(),
            sample: self.samples[index].clone(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn current_index(&self) -> usize {
        self.cursor
    }

    pub fn run(&self) -> u64 {
        self.run
    }

    pub fn samples(&self) -> Arc<[Sample]> {
        self.samples.clone()
    }

    pub fn position(&self) -> Position {
        match self.state {
            PlaybackState::Running => Position(Some((self.cursor, self.samples.len()))),
            PlaybackState::Idle => Position(None),
        }
    }
}
