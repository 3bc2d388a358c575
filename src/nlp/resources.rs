// Process-wide language data: stopwords and sentence-splitter abbreviations
//
// Provisioned once at process start; every request reads the same instance.
use once_cell::sync::OnceCell;
use rustc_hash::FxHashSet;
use std::fs;
use std::path::Path;
use stop_words::{get, LANGUAGE};

use crate::config::{self, Settings};

static RESOURCES: OnceCell<LanguageResources> = OnceCell::new();

const ABBREVIATIONS_FILE: &str = "abbreviations.txt";

// Bundled fallback for the splitter, lowercase without the trailing period
const BUNDLED_ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "vs", "etc", "e.g", "i.e",
    "cf", "al", "inc", "ltd", "co", "corp", "dept", "fig", "figs", "no", "nos", "vol",
    "pp", "p", "ch", "sec", "approx", "est", "jan", "feb", "mar", "apr", "jun", "jul",
    "aug", "sep", "sept", "oct", "nov", "dec", "u.s", "u.k", "a.m", "p.m", "gen", "gov",
    "rev", "ed", "eds", "ph.d", "b.a", "m.a",
];

#[derive(Debug)]
pub struct LanguageResources {
    language: String,
    stopwords: FxHashSet<String>,
    abbreviations: FxHashSet<String>,
}

impl LanguageResources {
    pub fn new(language: &str, extra_abbreviations: &[String]) -> Self {
        let mut abbreviations: FxHashSet<String> =
            BUNDLED_ABBREVIATIONS.iter().map(|s| s.to_string()).collect();
        for abbreviation in extra_abbreviations {
            let cleaned = abbreviation.trim().trim_end_matches('.').to_lowercase();
            if !cleaned.is_empty() {
                abbreviations.insert(cleaned);
            }
        }
        Self {
            language: language.to_string(),
            stopwords: load_stopwords(language),
            abbreviations,
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(&word.to_lowercase())
    }

    /// `word` without its trailing period.
    pub fn is_abbreviation(&self, word: &str) -> bool {
        self.abbreviations.contains(&word.to_lowercase())
    }
}

/// Provision language resources once. Later calls return the first instance.
pub fn provision(settings: &Settings) -> &'static LanguageResources {
    RESOURCES.get_or_init(|| {
        let extra = settings
            .abbreviations_file
            .clone()
            .or_else(|| config::data_dir().map(|dir| dir.join(ABBREVIATIONS_FILE)))
            .map(|path| read_abbreviations(&path))
            .unwrap_or_default();
        let resources = LanguageResources::new(&settings.language, &extra);
        tracing::debug!(
            language = %resources.language,
            stopwords = resources.stopwords.len(),
            abbreviations = resources.abbreviations.len(),
            "language resources provisioned"
        );
        resources
    })
}

/// Resources for this process, provisioned with defaults on first use.
pub fn resources() -> &'static LanguageResources {
    match RESOURCES.get() {
        Some(resources) => resources,
        None => provision(&Settings::default()),
    }
}

// Missing or unreadable files fall back to the bundled list
fn read_abbreviations(path: &Path) -> Vec<String> {
    if !path.exists() {
        tracing::debug!("no abbreviation file at {}, using bundled list", path.display());
        return Vec::new();
    }
    match fs::read(path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect(),
        Err(e) => {
            tracing::warn!("could not read {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

fn load_stopwords(language: &str) -> FxHashSet<String> {
    let lang = match language.to_lowercase().as_str() {
        "de" | "german" => LANGUAGE::German,
        "fr" | "french" => LANGUAGE::French,
        "es" | "spanish" => LANGUAGE::Spanish,
        "it" | "italian" => LANGUAGE::Italian,
        "pt" | "portuguese" => LANGUAGE::Portuguese,
        "nl" | "dutch" => LANGUAGE::Dutch,
        _ => LANGUAGE::English,
    };
    get(lang).iter().map(|s| s.to_lowercase()).collect()
}
