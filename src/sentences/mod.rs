use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;
use thiserror::Error;

static SENTENCE_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/sentences");

#[derive(Debug, Error)]
pub enum SentenceError {
    #[error("unknown sentence set {name}, expected one of: {}", .available.join(", "))]
    Unknown {
        name: String,
        available: Vec<String>,
    },

    #[error("sentence set {name} is not valid json: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("sentence set {0} has no sentences")]
    Empty(String),
}

/// Named, never empty list of target sentences.
#[derive(Clone, Debug, PartialEq)]
pub struct SentenceSet {
    name: String,
    sentences: Vec<String>,
}

#[derive(Deserialize)]
struct SentenceFile {
    sentences: Vec<String>,
}

impl SentenceSet {
    /// Build a set, dropping blank sentences. Fails if none remain.
    pub fn new(
        name: &str,
        sentences: impl IntoIterator<Item = String>,
    ) -> Result<Self, SentenceError> {
        let sentences: Vec<String> = sentences
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect();
        if sentences.is_empty() {
            return Err(SentenceError::Empty(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            sentences,
        })
    }

    /// Load one of the bundled sets by name, e.g. `korean`.
    pub fn load(name: &str) -> Result<Self, SentenceError> {
        let unknown = || SentenceError::Unknown {
            name: name.to_string(),
            available: Self::available(),
        };
        let file = SENTENCE_DIR
            .get_file(format!("{name}.json"))
            .ok_or_else(unknown)?;
        let contents = file.contents_utf8().ok_or_else(unknown)?;

        Self::from_json(name, contents)
    }

    pub fn from_json(name: &str, json: &str) -> Result<Self, SentenceError> {
        let file: SentenceFile =
            serde_json::from_str(json).map_err(|source| SentenceError::Malformed {
                name: name.to_string(),
                source,
            })?;
        Self::new(name, file.sentences)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    /// A set holding a single user supplied prompt.
    pub fn custom(prompt: &str) -> Result<Self, SentenceError> {
        Self::new("custom", [prompt.to_string()])
    }

    /// Names of the bundled sets.
    pub fn available() -> Vec<String> {
        let mut names: Vec<String> = SENTENCE_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
            .filter_map(|f| f.path().file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Random sentence, avoiding `except` whenever another one exists.
    ///
    /// Sets are never empty, so the fallback always exists.
    pub fn pick(&self, except: Option<&str>) -> &str {
        let rng = &mut rand::thread_rng();
        let candidates: Vec<&str> = self
            .sentences
            .iter()
            .map(String::as_str)
            .filter(|s| Some(*s) != except)
            .collect();

        candidates
            .choose(rng)
            .copied()
            .unwrap_or(&self.sentences[0])
    }
}
