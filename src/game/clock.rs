//! Countdown / stopwatch primitive broadcasting over a watch channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// The session's single timing source.
///
/// A clock runs either a countdown (value falls to zero) or a stopwatch
/// (value grows), publishing the current value in milliseconds once per tick
/// over a watch channel. Each session owns one clock; starting a new run
/// implicitly replaces the previous one.
#[derive(Debug)]
pub struct Clock {
    tick: Duration,
    value: watch::Sender<u64>,
    paused: Arc<AtomicBool>,
    ticker: Option<JoinHandle<()>>,
}

impl Clock {
    /// Clock ticking at `tick` intervals, initially stopped at zero.
    pub fn new(tick: Duration) -> Self {
        let (value, _receiver) = watch::channel(0);
        Self {
            tick,
            value,
            paused: Arc::new(AtomicBool::new(true)),
            ticker: None,
        }
    }

    /// Start a countdown from `duration_ms` down to zero, replacing any
    /// previous run.
    pub fn start_countdown(&mut self, duration_ms: u64) -> watch::Receiver<u64> {
        self.halt_ticker();
        self.value.send_replace(duration_ms);
        self.paused.store(false, Ordering::SeqCst);

        let tick = self.tick;
        let tick_ms = tick.as_millis() as u64;
        let value = self.value.clone();
        let paused = self.paused.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            // The first interval tick resolves immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if paused.load(Ordering::SeqCst) {
                    continue;
                }
                let next = value.borrow().saturating_sub(tick_ms);
                value.send_replace(next);
                if next == 0 {
                    break;
                }
            }
        }));

        self.subscribe()
    }

    /// Start a stopwatch counting up from zero, replacing any previous run.
    pub fn start_stopwatch(&mut self) -> watch::Receiver<u64> {
        self.halt_ticker();
        self.value.send_replace(0);
        self.paused.store(false, Ordering::SeqCst);

        let tick = self.tick;
        let tick_ms = tick.as_millis() as u64;
        let value = self.value.clone();
        let paused = self.paused.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.tick().await;
            loop {
                interval.tick().await;
                if paused.load(Ordering::SeqCst) {
                    continue;
                }
                let next = value.borrow().saturating_add(tick_ms);
                value.send_replace(next);
            }
        }));

        self.subscribe()
    }

    /// Suspend ticking; the current value is retained.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    /// Resume ticking after a pause.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    /// End the current run and reset the value to zero.
    pub fn stop(&mut self) {
        self.halt_ticker();
        self.paused.store(true, Ordering::SeqCst);
        self.value.send_replace(0);
    }

    /// Whether a run is active and not paused.
    pub fn is_running(&self) -> bool {
        self.ticker.is_some() && !self.paused.load(Ordering::SeqCst)
    }

    /// Live value stream; one message per tick.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.value.subscribe()
    }

    /// Current countdown value in milliseconds.
    pub fn remaining_ms(&self) -> u64 {
        *self.value.borrow()
    }

    /// Current stopwatch value in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        *self.value.borrow()
    }

    fn halt_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.halt_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn countdown_reaches_zero_and_stops() {
        let mut clock = Clock::new(Duration::from_millis(1000));
        let mut ticks = clock.start_countdown(3000);

        let mut seen = Vec::new();
        while ticks.changed().await.is_ok() {
            seen.push(*ticks.borrow());
            if *ticks.borrow() == 0 {
                break;
            }
        }
        assert_eq!(seen, vec![2000, 1000, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_retains_the_value() {
        let mut clock = Clock::new(Duration::from_millis(1000));
        let mut ticks = clock.start_countdown(5000);

        ticks.changed().await.unwrap();
        assert_eq!(clock.remaining_ms(), 4000);

        clock.pause();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(clock.remaining_ms(), 4000);

        clock.resume();
        ticks.changed().await.unwrap();
        assert_eq!(clock.remaining_ms(), 3000);
    }

    #[tokio::test(start_paused = true)]
    async fn starting_again_replaces_the_previous_run() {
        let mut clock = Clock::new(Duration::from_millis(1000));
        let mut first = clock.start_countdown(10_000);
        first.changed().await.unwrap();

        let mut second = clock.start_countdown(2000);
        second.changed().await.unwrap();
        assert_eq!(*second.borrow(), 1000);

        // The first subscription now observes the replacement run's values.
        assert_eq!(*first.borrow_and_update(), 1000);
    }

    #[tokio::test(start_paused = true)]
    async fn stopwatch_counts_up() {
        let mut clock = Clock::new(Duration::from_millis(1000));
        let mut ticks = clock.start_stopwatch();

        ticks.changed().await.unwrap();
        ticks.changed().await.unwrap();
        assert_eq!(clock.elapsed_ms(), 2000);

        clock.stop();
        assert_eq!(clock.elapsed_ms(), 0);
        assert!(!clock.is_running());
    }
}
