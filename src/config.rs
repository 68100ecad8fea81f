use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::records::DEFAULT_LEADERBOARD_SIZE;
use crate::session::{SessionTiming, DEFAULT_GRACE_WINDOW_MS, DEFAULT_TICK_INTERVAL_MS};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Bundled sentence set to draw targets from.
    pub sentences: String,
    /// Pick a new sentence after each restart.
    pub rotate_sentences: bool,
    pub grace_window_ms: u64,
    pub tick_interval_ms: u64,
    pub leaderboard_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sentences: "korean".to_string(),
            rotate_sentences: true,
            grace_window_ms: DEFAULT_GRACE_WINDOW_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
        }
    }
}

impl Config {
    pub fn session_timing(&self) -> SessionTiming {
        SessionTiming {
            grace_window: Duration::from_millis(self.grace_window_ms),
            tick_interval: Duration::from_millis(self.tick_interval_ms.max(1)),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "typing-contest") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("typing_contest_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), error = %e, "invalid config, using defaults");
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
