use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

pub const PULSE_INTERVAL: Duration = Duration::from_secs(1);

pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance_seconds(&self, seconds: i64) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += ChronoDuration::seconds(seconds);
    }

    pub fn set(&self, value: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now = value;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Whole seconds from `start` to `end`, never negative.
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    end.signed_duration_since(start).num_seconds().max(0)
}

/// Background pulse source. The thread never touches scheduler state; it only
/// invokes `on_pulse`, which is expected to post a message to the owning loop.
#[derive(Debug)]
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Starts pulsing every `interval`. The thread exits when `on_pulse`
    /// returns false or the ticker is stopped.
    pub fn spawn<F>(interval: Duration, mut on_pulse: F) -> io::Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("break-ticker".to_string())
            .spawn(move || {
                let mut next = Instant::now() + interval;
                loop {
                    thread::sleep(next.saturating_duration_since(Instant::now()));
                    if thread_stop.load(Ordering::SeqCst) {
                        break;
                    }
                    if !on_pulse() {
                        debug!("pulse receiver gone, ticker exiting");
                        break;
                    }
                    next += interval;
                }
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::{elapsed_seconds, Clock, ManualClock, Ticker};
    use chrono::{DateTime, Utc};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn manual_clock_advances_only_on_request() {
        let clock = ManualClock::default();
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.advance_seconds(45);
        assert_eq!(elapsed_seconds(start, clock.now()), 45);
    }

    #[test]
    fn elapsed_is_clamped_at_zero() {
        let later = DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(10);
        assert_eq!(elapsed_seconds(later, DateTime::<Utc>::UNIX_EPOCH), 0);
    }

    #[test]
    fn ticker_posts_pulses_until_stopped() {
        let (tx, rx) = mpsc::channel();
        let mut ticker =
            Ticker::spawn(Duration::from_millis(5), move || tx.send(()).is_ok()).expect("spawn");

        for _ in 0..3 {
            rx.recv_timeout(Duration::from_secs(2)).expect("pulse");
        }
        ticker.stop();

        while rx.try_recv().is_ok() {}
        std::thread::sleep(Duration::from_millis(30));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn ticker_exits_when_receiver_is_dropped() {
        let (tx, rx) = mpsc::channel::<()>();
        drop(rx);
        let mut ticker =
            Ticker::spawn(Duration::from_millis(1), move || tx.send(()).is_ok()).expect("spawn");
        ticker.stop();
    }
}
