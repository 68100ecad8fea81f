use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
};

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};

use typing_contest::{
    app::App,
    app_dirs::AppDirs,
    clock::{SystemClock, TimeSource},
    config::{Config, ConfigStore, FileConfigStore},
    game::Game,
    logging,
    records::RecordStore,
    runtime::{CrosstermEventSource, Runner},
    sentences::SentenceSet,
    storage::{BlobStore, MemoryBlobStore, SqliteBlobStore},
};

/// race a sentence against the clock and keep a leaderboard of clean runs
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A typing contest in the terminal: type the sentence exactly, press enter, and your fastest correct runs are kept on a local leaderboard."
)]
pub struct Cli {
    /// custom sentence to type instead of a bundled set
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// bundled sentence set to draw from
    #[clap(short = 's', long, value_enum)]
    sentences: Option<SentenceChoice>,

    /// path of the records database
    #[clap(long)]
    records_db: Option<PathBuf>,

    /// milliseconds enter stays inactive after a result
    #[clap(long)]
    grace_ms: Option<u64>,

    /// keep the same sentence after a restart
    #[clap(long)]
    no_rotate: bool,

    /// print the leaderboard and exit
    #[clap(long)]
    list: bool,

    /// delete every saved record and exit
    #[clap(long)]
    clear_records: bool,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum SentenceChoice {
    Korean,
    English,
}

impl Cli {
    /// Layer command line overrides on top of the saved config
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(choice) = self.sentences {
            config.sentences = choice.to_string().to_lowercase();
        }
        if let Some(ms) = self.grace_ms {
            config.grace_window_ms = ms;
        }
        if self.no_rotate {
            config.rotate_sentences = false;
        }
        config
    }

    fn sentence_set(&self, config: &Config) -> Result<SentenceSet, Box<dyn Error>> {
        let set = match &self.prompt {
            Some(prompt) => SentenceSet::custom(prompt)?,
            None => SentenceSet::load(&config.sentences)?,
        };
        Ok(set)
    }

    fn records_db(&self) -> Option<PathBuf> {
        self.records_db.clone().or_else(AppDirs::records_db_path)
    }
}

fn open_storage(path: Option<PathBuf>) -> Box<dyn BlobStore> {
    match path.map(|p| SqliteBlobStore::open(&p).map_err(|e| (p, e))) {
        Some(Ok(store)) => Box::new(store),
        Some(Err((path, e))) => {
            warn!(path = %path.display(), error = %e, "records database unavailable, records will not be saved");
            Box::new(MemoryBlobStore::new())
        }
        None => {
            warn!("no state directory, records will not be saved");
            Box::new(MemoryBlobStore::new())
        }
    }
}

fn print_leaderboard<S: BlobStore>(records: &RecordStore<S>, limit: usize) {
    let board = records.leaderboard(limit);
    if board.is_empty() {
        println!("no records yet");
        return;
    }
    for entry in board {
        let record = entry.record;
        println!(
            "{:>2}. #{:<3} {:>8.3}s  {}{}",
            entry.rank,
            record.original_index,
            record.time,
            record.sentence,
            if entry.is_best { "  ★" } else { "" }
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let config = cli.apply_to(config_store.load());

    if cli.list || cli.clear_records {
        logging::init_stderr_logging();
        let mut records = RecordStore::open(open_storage(cli.records_db()));
        if cli.clear_records {
            let count = records.len();
            records.clear_all();
            println!("cleared {count} records");
        } else {
            print_leaderboard(&records, config.leaderboard_size);
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = AppDirs::log_dir().and_then(|dir| logging::init_file_logging(&dir));

    if cli.save_config {
        config_store.save(&config)?;
        info!(path = %config_store.path().display(), "config saved");
    }

    let sentences = cli.sentence_set(&config)?;
    let records = RecordStore::open(open_storage(cli.records_db()));
    let game = Game::new(sentences, records, SystemClock, &config);
    let mut app = App::new(game);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend, S: BlobStore, C: TimeSource>(
    terminal: &mut Terminal<B>,
    app: &mut App<S, C>,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new());
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    while !app.should_quit {
        // no wakeup while the clock is stopped: the tick is cancelled, not idled
        let event = runner.step(app.game.next_wakeup());
        if app.handle_event(event) && !app.should_quit {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }

    info!(records = app.game.records().len(), "exiting");
    Ok(())
}
