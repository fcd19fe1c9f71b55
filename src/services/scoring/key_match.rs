use regex::{NoExpand, Regex, RegexBuilder};

use crate::db::models::AnswerKey;

/// Whether `answer` matches any of the accepted keys.
///
/// Each key is compiled to an anchored, case-insensitive regex over its
/// escaped text, with every alternative-bearing word replaced by an
/// alternation group over the word and its alternatives. The first matching
/// key wins; order carries no scoring weight since the verdict is boolean.
pub(crate) fn matches(keys: &[AnswerKey], answer: &str) -> bool {
    keys.iter().any(|key| match key_regex(key) {
        Some(regex) => regex.is_match(answer),
        None => false,
    })
}

/// Whether `word` occurs, case-insensitively and whole-word, inside any
/// key's text or alternatives. Used to exempt answer tokens from the
/// spelling check.
pub(crate) fn any_key_contains_word(keys: &[AnswerKey], word: &str) -> bool {
    let Some(regex) =
        RegexBuilder::new(&format!(r"\b{}\b", regex::escape(word))).case_insensitive(true).build().ok()
    else {
        return false;
    };

    keys.iter().any(|key| {
        regex.is_match(&key.key)
            || key.alternatives.iter().any(|group| {
                regex.is_match(&group.word)
                    || group.alternatives.iter().any(|alternative| regex.is_match(alternative))
            })
    })
}

fn key_regex(key: &AnswerKey) -> Option<Regex> {
    let mut pattern = regex::escape(&key.key);

    for group in &key.alternatives {
        let word_pattern = format!(r"\b{}\b", regex::escape(&group.word));
        let Ok(word_regex) = Regex::new(&word_pattern) else {
            continue;
        };

        // A group with no alternatives degenerates to the word itself.
        let alternation = std::iter::once(group.word.as_str())
            .chain(group.alternatives.iter().map(String::as_str))
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");

        pattern = word_regex.replace_all(&pattern, NoExpand(&format!("({alternation})"))).into_owned();
    }

    match RegexBuilder::new(&format!("^{pattern}$")).case_insensitive(true).build() {
        Ok(regex) => Some(regex),
        Err(err) => {
            tracing::warn!(key = %key.key, error = %err, "Failed to compile key pattern");
            None
        }
    }
}
