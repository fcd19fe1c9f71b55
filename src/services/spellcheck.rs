use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::core::config::ScoringSettings;
use crate::services::scoring::SpellChecker;

/// Word-list spell checker backed by a newline-delimited dictionary file
/// (the system dictionary by default). When no dictionary can be loaded the
/// lexicon is empty and every word is treated as correctly spelled, so a
/// bad deployment degrades to "no spelling detection" instead of flagging
/// every answer.
pub(crate) struct Lexicon {
    words: HashSet<String>,
}

impl Lexicon {
    pub(crate) fn from_settings(settings: &ScoringSettings) -> Self {
        Self::from_file(Path::new(&settings.lexicon_path))
    }

    pub(crate) fn from_file(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let words: HashSet<String> = contents
                    .lines()
                    .map(|line| line.trim().to_lowercase())
                    .filter(|line| !line.is_empty())
                    .collect();
                tracing::info!(path = %path.display(), words = words.len(), "Loaded lexicon");
                Self { words }
            }
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "Failed to load lexicon; spelling detection disabled"
                );
                Self { words: HashSet::new() }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn from_words(words: &[&str]) -> Self {
        Self { words: words.iter().map(|word| word.to_lowercase()).collect() }
    }
}

impl SpellChecker for Lexicon {
    fn is_misspelled(&self, word: &str) -> bool {
        if self.words.is_empty() {
            return false;
        }

        let token = normalize(word);
        if token.is_empty() || token.chars().any(|ch| ch.is_ascii_digit()) {
            return false;
        }
        if self.words.contains(&token) {
            return false;
        }

        // Word lists rarely carry contraction forms ("it's", "don't"), so a
        // token with an interior apostrophe is accepted when the part before
        // the apostrophe is itself a known word.
        match token.split_once('\'') {
            Some((base, _)) => !self.words.contains(base),
            None => true,
        }
    }
}

/// Strips leading and trailing non-alphabetic characters and lowercases,
/// so "Paris," and "(paris" look up the same dictionary entry.
fn normalize(word: &str) -> String {
    word.trim_matches(|ch: char| !ch.is_alphanumeric()).to_lowercase()
}
