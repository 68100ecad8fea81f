use std::time::Duration;

use tracing::debug;

use crate::clock::{display_elapsed, Stopwatch, Timestamp};
use crate::scoring;

/// How long Enter is ignored after a result appears, in milliseconds.
pub const DEFAULT_GRACE_WINDOW_MS: u64 = 900;
/// Refresh rate of the displayed elapsed time while the clock runs.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 60;

/// Last judged outcome of a round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgeResult {
    pub correct: bool,
    /// Seconds from the first keystroke to the judged submit.
    pub time: f64,
    pub accuracy: f64,
    pub speed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Typing,
    #[strum(serialize = "Judged-Wrong")]
    JudgedWrong,
    #[strum(serialize = "Judged-Correct")]
    JudgedCorrect,
}

/// Raw input events forwarded by the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    TextChanged(String),
    CompositionStart,
    CompositionEnd(String),
    /// Enter or an equivalent explicit trigger.
    Submit,
    /// The restart button.
    Restart,
    Tick,
}

/// Work the caller has to carry out after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RecordCompleted { sentence: String, time: f64 },
    FocusInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub grace_window: Duration,
    pub tick_interval: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            grace_window: Duration::from_millis(DEFAULT_GRACE_WINDOW_MS),
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
        }
    }
}

/// One typing session against a fixed target sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    target: String,
    input: String,
    stopwatch: Stopwatch,
    result: Option<JudgeResult>,
    composing: bool,
    /// Buffer as it stood when the current composition began.
    composed_from: Option<String>,
    unlock_at: Option<Timestamp>,
    elapsed: f64,
    timing: SessionTiming,
}

impl Session {
    pub fn new(target: impl Into<String>) -> Self {
        Self::with_timing(target, SessionTiming::default())
    }

    pub fn with_timing(target: impl Into<String>, timing: SessionTiming) -> Self {
        Self {
            target: target.into(),
            input: String::new(),
            stopwatch: Stopwatch::default(),
            result: None,
            composing: false,
            composed_from: None,
            unlock_at: None,
            elapsed: 0.0,
            timing,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn result(&self) -> Option<&JudgeResult> {
        self.result.as_ref()
    }

    /// Display-only elapsed seconds, one decimal place.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        self.stopwatch.started_at()
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        self.stopwatch.stopped_at()
    }

    pub fn is_clock_running(&self) -> bool {
        self.stopwatch.is_running()
    }

    pub fn restart_locked(&self, now: Timestamp) -> bool {
        self.unlock_at.is_some_and(|at| now < at)
    }

    pub fn phase(&self) -> Phase {
        match (self.result, self.stopwatch.started_at()) {
            (Some(r), _) if r.correct => Phase::JudgedCorrect,
            (Some(_), _) => Phase::JudgedWrong,
            (None, Some(_)) => Phase::Typing,
            (None, None) => Phase::Idle,
        }
    }

    /// When the caller should deliver the next `Tick`.
    ///
    /// Every tick interval while the clock runs, once at the end of a pending
    /// grace window, and never otherwise.
    pub fn next_wakeup(&self, now: Timestamp) -> Option<Duration> {
        if self.stopwatch.is_running() {
            return Some(self.timing.tick_interval);
        }
        match self.unlock_at {
            Some(at) if at > now => Some(Duration::from_millis((at - now) as u64)),
            _ => None,
        }
    }

    pub fn handle(&mut self, event: SessionEvent, now: Timestamp) -> Vec<Effect> {
        match event {
            SessionEvent::TextChanged(value) => {
                self.text_changed(value, now);
                vec![]
            }
            SessionEvent::CompositionStart => {
                self.composition_start(now);
                vec![]
            }
            SessionEvent::CompositionEnd(value) => {
                self.composition_end(value, now);
                vec![]
            }
            SessionEvent::Submit => self.submit(now),
            SessionEvent::Restart => self.restart(),
            SessionEvent::Tick => {
                self.tick(now);
                vec![]
            }
        }
    }

    fn is_judged_correct(&self) -> bool {
        self.result.is_some_and(|r| r.correct)
    }

    fn start_clock_if_fresh(&mut self, now: Timestamp) {
        if self.stopwatch.started_at().is_none() && self.result.is_none() {
            self.stopwatch.start(now);
        }
    }

    /// Drop a shown result but keep the clock going from the original start.
    fn clear_result(&mut self) {
        self.result = None;
        self.unlock_at = None;
        self.stopwatch.resume();
    }

    fn text_changed(&mut self, value: String, now: Timestamp) {
        if self.is_judged_correct() {
            return;
        }

        if self.composing {
            self.input = value;
            return;
        }

        if self.result.is_some() && value != self.input {
            debug!("edit after a wrong attempt, clock keeps running");
            self.clear_result();
            self.input = value;
            return;
        }

        if !value.is_empty() {
            self.start_clock_if_fresh(now);
        }
        self.input = value;
    }

    fn composition_start(&mut self, now: Timestamp) {
        if self.is_judged_correct() {
            return;
        }
        self.composing = true;
        self.composed_from = Some(self.input.clone());
        self.start_clock_if_fresh(now);
    }

    fn composition_end(&mut self, value: String, now: Timestamp) {
        self.composing = false;
        let before = self
            .composed_from
            .take()
            .unwrap_or_else(|| self.input.clone());
        if self.is_judged_correct() {
            return;
        }

        if !value.is_empty() {
            self.start_clock_if_fresh(now);
        }

        // raw changes during the composition were only buffered, so compare
        // against the text from before it started
        if self.result.is_some() && value != before {
            self.clear_result();
        }
        self.input = value;
    }

    fn submit(&mut self, now: Timestamp) -> Vec<Effect> {
        if self.composing {
            let buffered = self.input.clone();
            self.composition_end(buffered, now);
        }

        match self.result {
            None => self.judge(now),
            Some(r) if r.correct => {
                if self.restart_locked(now) {
                    debug!("submit ignored during grace window");
                    vec![]
                } else {
                    self.restart()
                }
            }
            Some(_) => {
                self.input.clear();
                self.clear_result();
                vec![Effect::FocusInput]
            }
        }
    }

    fn judge(&mut self, now: Timestamp) -> Vec<Effect> {
        let Some(start) = self.stopwatch.started_at() else {
            return vec![];
        };
        if self.input.trim().is_empty() {
            return vec![];
        }

        let time = (now - start) as f64 / 1000.0;
        let score = scoring::score(&self.target, &self.input, time);
        self.result = Some(JudgeResult {
            correct: score.correct,
            time,
            accuracy: score.accuracy,
            speed: score.speed,
        });
        let grace = i64::try_from(self.timing.grace_window.as_millis()).unwrap_or(i64::MAX);
        self.unlock_at = Some(now.saturating_add(grace));
        debug!(
            correct = score.correct,
            time,
            accuracy = score.accuracy,
            speed = score.speed,
            "judged attempt"
        );

        if !score.correct {
            return vec![Effect::FocusInput];
        }

        self.stopwatch.stop(now);
        self.stopwatch.release_start();
        self.input.clear();
        self.elapsed = display_elapsed(start, now);

        vec![Effect::RecordCompleted {
            sentence: self.target.clone(),
            time,
        }]
    }

    fn restart(&mut self) -> Vec<Effect> {
        debug!("session restarted");
        *self = Self::with_timing(std::mem::take(&mut self.target), self.timing);
        vec![Effect::FocusInput]
    }

    fn tick(&mut self, now: Timestamp) {
        if let (true, Some(start)) = (self.stopwatch.is_running(), self.stopwatch.started_at()) {
            self.elapsed = display_elapsed(start, now);
        }
        if self.unlock_at.is_some_and(|at| at <= now) {
            self.unlock_at = None;
        }
    }
}

/// Pure form of [`Session::handle`].
pub fn reduce(state: &Session, event: SessionEvent, now: Timestamp) -> (Session, Vec<Effect>) {
    let mut next = state.clone();
    let effects = next.handle(event, now);
    (next, effects)
}
