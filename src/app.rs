use tracing::debug;

use crate::clock::TimeSource;
use crate::game::Game;
use crate::keymap::{map_key, Command, KeyContext};
use crate::runtime::AppEvent;
use crate::session::Effect;
use crate::storage::BlobStore;

/// Front-end state around a [`Game`]: pending confirmations and quitting.
#[derive(Debug)]
pub struct App<S: BlobStore, C: TimeSource> {
    pub game: Game<S, C>,
    pub confirming_clear: bool,
    /// A rejected attempt is selected; the next edit replaces it.
    pub input_selected: bool,
    pub should_quit: bool,
}

impl<S: BlobStore, C: TimeSource> App<S, C> {
    pub fn new(game: Game<S, C>) -> Self {
        Self {
            game,
            confirming_clear: false,
            input_selected: false,
            should_quit: false,
        }
    }

    /// Apply one runtime event. Returns whether the screen needs a redraw.
    pub fn handle_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Tick => {
                self.game.on_tick();
                true
            }
            AppEvent::Resize => true,
            AppEvent::Closed => {
                self.should_quit = true;
                false
            }
            AppEvent::Key(key) => {
                let ctx = KeyContext {
                    buffer: self.game.session().input(),
                    selected: self.input_selected,
                    confirming_clear: self.confirming_clear,
                };
                match map_key(key, ctx) {
                    Some(command) => {
                        self.apply(command);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    pub fn apply(&mut self, command: Command) {
        debug!(?command, "command");
        self.input_selected = false;
        match command {
            Command::TextChanged(value) => {
                self.game.on_text_changed(value);
            }
            Command::Submit => {
                let effects = self.game.on_submit_requested();
                self.focus_input(&effects);
            }
            Command::Restart => {
                // the restart button is only offered once a round is won
                if self.game.session().result().is_some_and(|r| r.correct) {
                    self.game.on_restart_requested();
                }
            }
            Command::DeleteLatest => {
                self.game.on_delete_latest();
            }
            Command::RequestClearAll => {
                self.confirming_clear = !self.game.records().is_empty();
            }
            Command::ConfirmClearAll => {
                self.game.on_clear_all_records();
                self.confirming_clear = false;
            }
            Command::CancelClearAll => {
                self.confirming_clear = false;
            }
            Command::Quit => {
                self.should_quit = true;
            }
        }
    }

    /// Focus lands on the input with whatever is left in it selected.
    fn focus_input(&mut self, effects: &[Effect]) {
        if effects.contains(&Effect::FocusInput) {
            self.input_selected = !self.game.session().input().is_empty();
        }
    }
}
