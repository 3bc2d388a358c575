// Configuration for docmark
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SENTENCE_COUNT: usize = 5;
pub const DEFAULT_MIN_TEXT_CHARS: usize = 10;
pub const CONFIG_FILE_NAME: &str = "docmark.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Number of sentences the summary keeps.
    pub sentence_count: usize,
    /// Below this many non-whitespace characters the summarizer is skipped.
    pub min_text_chars: usize,
    /// Stopword language for the term matrix.
    pub language: String,
    /// Grow each prefix hit along the unit text while the sentence keeps matching.
    pub extend_to_sentence: bool,
    /// Extra abbreviations for the sentence splitter, one per line.
    pub abbreviations_file: Option<PathBuf>,
    pub report: ReportSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sentence_count: DEFAULT_SENTENCE_COUNT,
            min_text_chars: DEFAULT_MIN_TEXT_CHARS,
            language: "en".to_string(),
            extend_to_sentence: true,
            abbreviations_file: None,
            report: ReportSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportSettings {
    #[serde(default = "default_template")]
    pub template: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            template: default_template(),
        }
    }
}

fn default_template() -> String { "{summary}".to_string() }

impl Settings {
    /// Load settings from the first config file found, or defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit.map(Path::to_path_buf).or_else(config_path) {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

// Config path from environment, working directory, then the user config dir
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("DOCMARK_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("docmark").join("config.toml"))
        .filter(|path| path.exists())
}

// Where provisioned language data lives when no explicit file is configured
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("docmark"))
}
