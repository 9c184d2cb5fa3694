use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info};

use crate::{
    filter::ValidationError,
    playback::{PlaybackConfig, Position, Sequencer, Tick},
    sample::Sample,
};

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Started { total: usize, interval: Duration },
    Tick { index: usize, total: usize, sample: Sample },
    Finished,
    Stopped,
}

/// Drives a [`Sequencer`] from a single tokio timer.
///
/// Must be used from within a tokio runtime.
pub struct Player {
    sequencer: Arc<Mutex<Sequencer>>,
    timer: Option<JoinHandle<()>>,
    events: UnboundedSender<PlaybackEvent>,
    config: PlaybackConfig,
    rate: f64,
}

impl Player {
    pub fn new(config: PlaybackConfig) -> (Self, UnboundedReceiver<PlaybackEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let player = Self {
            sequencer: Arc::new(Mutex::new(Sequencer::new(config))),
            timer: None,
            events,
            config,
            rate: config.default_rate,
        };
        (player, rx)
    }

    /// Starts from the first sample, replacing any playback in progress.
    ///
    /// A rejected start leaves the current playback untouched.
    pub fn start(&mut self, samples: impl Into<Arc<[Sample]>>, rate: f64) -> Result<Duration, ValidationError> {
        let samples = samples.into();
        let total = samples.len();
        if samples.is_empty() {
            return Err(ValidationError::EmptyTrajectory);
        }
        self.config.interval(rate)?;

        self.cancel_timer();
        let (interval, run) = {
            let mut sequencer = lock(&self.sequencer);
            let interval = sequencer.start(samples, rate)?;
            (interval, sequencer.run())
        };
        self.rate = rate;

        info!(total, ?interval, rate, "playback started");
        let _ = self.events.send(PlaybackEvent::Started { total, interval });
        self.timer = Some(tokio::spawn(run_timer(
            self.sequencer.clone(),
            self.events.clone(),
            run,
            interval,
        )));
        Ok(interval)
    }

    pub fn stop(&mut self) {
        self.cancel_timer();
        if lock(&self.sequencer).stop() {
            info!("playback stopped");
            let _ = self.events.send(PlaybackEvent::Stopped);
        }
    }

    /// Changes the speed. A running playback restarts from the first sample at the new speed.
    pub fn set_rate(&mut self, rate: f64) -> Result<(), ValidationError> {
        self.config.interval(rate)?;
        let samples = {
            let sequencer = lock(&self.sequencer);
            sequencer.is_running().then(|| sequencer.samples())
        };

        match samples {
            Some(samples) => {
                self.stop();
                self.start(samples, rate)?;
            }
            None => self.rate = rate,
        }
        Ok(())
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn is_running(&self) -> bool {
        lock(&self.sequencer).is_running()
    }

    pub fn position(&self) -> Position {
        lock(&self.sequencer).position()
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}

async fn run_timer(
    sequencer: Arc<Mutex<Sequencer>>,
    events: UnboundedSender<PlaybackEvent>,
    run: u64,
    interval: Duration,
) {
    let mut ticks = time::interval_at(Instant::now() + interval, interval);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticks.tick().await;
        let tick = lock(&sequencer).tick_run(run);
        let event = match tick {
            Tick::Sample { index, total, sample } => PlaybackEvent::Tick { index, total, sample },
            Tick::Finished => {
                info!("playback finished");
                let _ = events.send(PlaybackEvent::Finished);
                return;
            }
            Tick::Idle => {
                debug!(run, "timer outlived its run");
                return;
            }
        };

        if events.send(event).is_err() {
            // nobody is listening anymore
            lock(&sequencer).stop();
            return;
        }
    }
}

fn lock(sequencer: &Mutex<Sequencer>) -> MutexGuard<'_, Sequencer> {
    sequencer.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| Sample::new(1754543300.0 + i as f64, 49.9, 36.3, None).unwrap())
            .collect()
    }

    async fn next_index(rx: &mut UnboundedReceiver<PlaybackEvent>) -> usize {
        match rx.recv().await {
            Some(PlaybackEvent::Tick { index, .. }) => index,
            other => panic!("expected a tick, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_interval() {
        let (mut player, mut rx) = Player::new(PlaybackConfig::default());
        let begin = Instant::now();
        assert_eq!(player.start(samples(10), 1.0), Ok(Duration::from_millis(1000)));
        assert_eq!(
            rx.recv().await,
            Some(PlaybackEvent::Started {
                total: 10,
                interval: Duration::from_millis(1000)
            })
        );

        for i in 0..10 {
            assert_eq!(next_index(&mut rx).await, i);
            assert_eq!(begin.elapsed(), Duration::from_millis(1000 * (i as u64 + 1)));
            assert_eq!(player.position().to_string(), format!("{} of 10", i + 1));
        }

        assert_eq!(rx.recv().await, Some(PlaybackEvent::Finished));
        assert_eq!(begin.elapsed(), Duration::from_millis(11_000));
        assert!(!player.is_running());
        assert_eq!(player.position().to_string(), "-");
    }

    #[tokio::test(start_paused = true)]
    async fn fast_rate_hits_the_floor() {
        let (mut player, mut rx) = Player::new(PlaybackConfig::default());
        let begin = Instant::now();
        assert_eq!(player.start(samples(10), 20.0), Ok(Duration::from_millis(100)));
        rx.recv().await;

        for i in 0..10 {
            assert_eq!(next_index(&mut rx).await, i);
            assert_eq!(begin.elapsed(), Duration::from_millis(100 * (i as u64 + 1)));
        }
        assert_eq!(rx.recv().await, Some(PlaybackEvent::Finished));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_change_restarts() {
        let (mut player, mut rx) = Player::new(PlaybackConfig::default());
        let begin = Instant::now();
        player.start(samples(3), 1.0).unwrap();
        rx.recv().await;
        assert_eq!(next_index(&mut rx).await, 0);
        assert_eq!(next_index(&mut rx).await, 1);

        player.set_rate(20.0).unwrap();
        assert_eq!(player.rate(), 20.0);
        assert_eq!(rx.recv().await, Some(PlaybackEvent::Stopped));
        assert_eq!(
            rx.recv().await,
            Some(PlaybackEvent::Started {
                total: 3,
                interval: Duration::from_millis(100)
            })
        );

        for i in 0..3 {
            assert_eq!(next_index(&mut rx).await, i);
            assert_eq!(begin.elapsed(), Duration::from_millis(2000 + 100 * (i as u64 + 1)));
        }
        assert_eq!(rx.recv().await, Some(PlaybackEvent::Finished));

        // the old timer must not come back
        time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_keeps_one_timer() {
        let (mut player, mut rx) = Player::new(PlaybackConfig::default());
        player.start(samples(2), 1.0).unwrap();
        rx.recv().await;
        assert_eq!(next_index(&mut rx).await, 0);

        let first = player.timer.as_ref().unwrap().abort_handle();
        player.start(samples(2), 2.0).unwrap();
        assert!(matches!(rx.recv().await, Some(PlaybackEvent::Started { total: 2, .. })));
        time::sleep(Duration::from_millis(1)).await;
        assert!(first.is_finished());
        assert_eq!(next_index(&mut rx).await, 0);
        assert_eq!(next_index(&mut rx).await, 1);
        assert_eq!(rx.recv().await, Some(PlaybackEvent::Finished));

        time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stop() {
        let (mut player, mut rx) = Player::new(PlaybackConfig::default());
        player.stop();
        assert!(rx.try_recv().is_err());

        player.start(samples(5), 1.0).unwrap();
        rx.recv().await;
        assert_eq!(next_index(&mut rx).await, 0);

        player.stop();
        player.stop();
        assert_eq!(rx.recv().await, Some(PlaybackEvent::Stopped));
        assert!(!player.is_running());
        assert_eq!(player.position().to_string(), "-");

        time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_start() {
        let (mut player, mut rx) = Player::new(PlaybackConfig::default());
        assert_eq!(
            player.start(Vec::<Sample>::new(), 1.0),
            Err(ValidationError::EmptyTrajectory)
        );
        assert!(!player.is_running());
        assert!(rx.try_recv().is_err());

        assert_eq!(player.set_rate(-2.0), Err(ValidationError::InvalidRate(-2.0)));
        assert_eq!(player.rate(), 1.0);
        player.set_rate(4.0).unwrap();
        assert_eq!(player.rate(), 4.0);
        assert!(rx.try_recv().is_err());

        // a running playback survives a rejected start
        player.start(samples(2), 1.0).unwrap();
        rx.recv().await;
        assert!(player.start(Vec::<Sample>::new(), 1.0).is_err());
        assert!(player.start(samples(3), 0.0).is_err());
        assert_eq!(player.position().to_string(), "0 of 2");
        assert_eq!(next_index(&mut rx).await, 0);
        assert_eq!(next_index(&mut rx).await, 1);
        assert_eq!(rx.recv().await, Some(PlaybackEvent::Finished));
    }
}
