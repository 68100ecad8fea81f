use std::time::Duration;

use tracing::{debug, info};

use crate::clock::TimeSource;
use crate::config::Config;
use crate::records::{LeaderboardEntry, Record, RecordError, RecordStore};
use crate::sentences::SentenceSet;
use crate::session::{Effect, Phase, Session, SessionEvent, SessionTiming};
use crate::storage::BlobStore;

/// Wires one live [`Session`] to the record store.
///
/// Every `on_*` method is a UI event. Correct judgments become records here,
/// and restarts draw the next sentence when rotation is on.
#[derive(Debug)]
pub struct Game<S: BlobStore, C: TimeSource> {
    session: Session,
    records: RecordStore<S>,
    sentences: SentenceSet,
    clock: C,
    timing: SessionTiming,
    rotate_sentences: bool,
    leaderboard_size: usize,
}

impl<S: BlobStore, C: TimeSource> Game<S, C> {
    pub fn new(sentences: SentenceSet, records: RecordStore<S>, clock: C, config: &Config) -> Self {
        let timing = config.session_timing();
        let session = Session::with_timing(sentences.pick(None), timing);
        Self {
            session,
            records,
            sentences,
            clock,
            timing,
            rotate_sentences: config.rotate_sentences,
            leaderboard_size: config.leaderboard_size,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn records(&self) -> &RecordStore<S> {
        &self.records
    }

    pub fn restart_locked(&self) -> bool {
        self.session.restart_locked(self.clock.now())
    }

    pub fn next_wakeup(&self) -> Option<Duration> {
        self.session.next_wakeup(self.clock.now())
    }

    pub fn leaderboard(&self) -> Vec<LeaderboardEntry<'_>> {
        self.records.leaderboard(self.leaderboard_size)
    }

    pub fn on_text_changed(&mut self, value: impl Into<String>) -> Vec<Effect> {
        self.dispatch(SessionEvent::TextChanged(value.into()))
    }

    pub fn on_composition_start(&mut self) -> Vec<Effect> {
        self.dispatch(SessionEvent::CompositionStart)
    }

    pub fn on_composition_end(&mut self, value: impl Into<String>) -> Vec<Effect> {
        self.dispatch(SessionEvent::CompositionEnd(value.into()))
    }

    /// Enter: judge, retry after a miss, or advance after a success.
    pub fn on_submit_requested(&mut self) -> Vec<Effect> {
        let was_correct = self.session.phase() == Phase::JudgedCorrect;
        let effects = self.dispatch(SessionEvent::Submit);
        if was_correct && self.session.phase() == Phase::Idle {
            self.next_round();
        }
        effects
    }

    pub fn on_restart_requested(&mut self) -> Vec<Effect> {
        let effects = self.dispatch(SessionEvent::Restart);
        self.next_round();
        effects
    }

    pub fn on_tick(&mut self) {
        self.dispatch(SessionEvent::Tick);
    }

    pub fn on_delete_record(&mut self, id: &str) -> Result<Record, RecordError> {
        self.records.remove(id).inspect_err(|e| {
            debug!(error = %e, "delete rejected");
        })
    }

    /// Delete whichever record currently holds the highest index.
    pub fn on_delete_latest(&mut self) -> Option<Record> {
        self.records.remove_latest()
    }

    pub fn on_clear_all_records(&mut self) {
        self.records.clear_all();
    }

    fn dispatch(&mut self, event: SessionEvent) -> Vec<Effect> {
        let now = self.clock.now();
        let effects = self.session.handle(event, now);
        for effect in &effects {
            if let Effect::RecordCompleted { sentence, time } = effect {
                self.records.add(sentence, *time);
            }
        }
        effects
    }

    fn next_round(&mut self) {
        if !self.rotate_sentences {
            return;
        }
        let next = self.sentences.pick(Some(self.session.target())).to_string();
        info!(sentence = %next, "next sentence");
        self.session = Session::with_timing(next, self.timing);
    }
}
