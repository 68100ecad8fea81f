use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Source of "now" for everything that measures typing time.
pub trait TimeSource {
    fn now(&self) -> Timestamp;
}

/// Wall clock used by the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for tests and headless runs. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance_ms((secs * 1000.0).round() as i64);
    }

    pub fn set(&self, at: Timestamp) {
        self.now.store(at, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Start/stop timer for one round.
///
/// Running means started and not yet stopped. Stopping keeps the start so the
/// judged duration can still be read back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stopwatch {
    started_at: Option<Timestamp>,
    stopped_at: Option<Timestamp>,
}

impl Stopwatch {
    pub fn start(&mut self, now: Timestamp) {
        self.started_at = Some(now);
        self.stopped_at = None;
    }

    pub fn stop(&mut self, now: Timestamp) {
        if self.started_at.is_some() {
            self.stopped_at = Some(now);
        }
    }

    /// Undo a stop, keeping the original start.
    pub fn resume(&mut self) {
        self.stopped_at = None;
    }

    /// Forget the start but keep a recorded stop, used once a round has been
    /// judged correct and its input released.
    pub fn release_start(&mut self) {
        self.started_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some() && self.stopped_at.is_none()
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn stopped_at(&self) -> Option<Timestamp> {
        self.stopped_at
    }
}

/// Elapsed seconds for display: tenths of a second, rounded.
pub fn display_elapsed(start: Timestamp, now: Timestamp) -> f64 {
    ((now - start) as f64 / 100.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advances_shared_time() {
        let clock = ManualClock::new(1_000);
        let other = clock.clone();

        clock.advance_ms(250);
        assert_eq!(other.now(), 1_250);

        other.advance_secs(1.5);
        assert_eq!(clock.now(), 2_750);

        clock.set(10);
        assert_eq!(other.now(), 10);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now() > 1_577_836_800_000);
    }

    #[test]
    fn test_stopwatch_lifecycle() {
        let mut sw = Stopwatch::default();
        assert!(!sw.is_running());

        sw.start(1_000);
        assert!(sw.is_running());

        sw.stop(4_000);
        assert!(!sw.is_running());
        assert_eq!(sw.stopped_at(), Some(4_000));

        sw.resume();
        assert!(sw.is_running());
        assert_eq!(sw.started_at(), Some(1_000));
        assert_eq!(sw.stopped_at(), None);
    }

    #[test]
    fn test_stop_without_start_is_ignored() {
        let mut sw = Stopwatch::default();
        sw.stop(100);
        assert_eq!(sw.stopped_at(), None);
    }

    #[test]
    fn test_release_start_keeps_stop() {
        let mut sw = Stopwatch::default();
        sw.start(0);
        sw.stop(2_000);
        sw.release_start();

        assert_eq!(sw.started_at(), None);
        assert_eq!(sw.stopped_at(), Some(2_000));
        assert!(!sw.is_running());
    }

    #[test]
    fn test_display_elapsed_rounds_to_tenths() {
        assert_eq!(display_elapsed(0, 0), 0.0);
        assert_eq!(display_elapsed(0, 1_234), 1.2);
        assert_eq!(display_elapsed(0, 1_250), 1.3);
        assert_eq!(display_elapsed(1_000, 1_060), 0.1);
    }
}
