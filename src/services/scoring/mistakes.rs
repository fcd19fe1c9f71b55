use crate::db::models::AnswerKey;
use crate::services::scoring::{key_match, Inflector, SpellChecker};

/// The fixed punctuation set stripped by the punctuation detector.
const PUNCTUATION: &[char] = &[
    '.', ',', '/', '#', '!', '$', '%', '^', '&', '*', ';', ':', '{', '}', '=', '-', '_', '`', '~',
    '(', ')', '[', ']', '"', '\'', '?', '<', '>', '\\', '|', '@',
];

/// Surface-level mistake categories, in detection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MistakeKind {
    Case,
    Punctuation,
    Spelling,
    Grammatical,
    Contraction,
}

impl MistakeKind {
    /// Detection order is part of the scoring contract: a later category's
    /// verdict can override an earlier one.
    pub(crate) const DETECTION_ORDER: [MistakeKind; 5] = [
        MistakeKind::Case,
        MistakeKind::Punctuation,
        MistakeKind::Spelling,
        MistakeKind::Grammatical,
        MistakeKind::Contraction,
    ];
}

/// True when lowercasing both sides turns the failed answer into a match.
pub(crate) fn case_mistake(keys: &[AnswerKey], answer: &str) -> bool {
    let lowered = map_keys(keys, |text| text.to_lowercase());
    key_match::matches(&lowered, &answer.to_lowercase())
}

/// True when stripping the fixed punctuation set from both sides turns the
/// failed answer into a match.
pub(crate) fn punctuation_mistake(keys: &[AnswerKey], answer: &str) -> bool {
    let stripped = map_keys(keys, strip_punctuation);
    key_match::matches(&stripped, &strip_punctuation(answer))
}

/// True when any whitespace-split token of the raw answer is misspelled and
/// does not occur literally inside any key's text or alternatives.
pub(crate) fn spelling_mistake(spell: &dyn SpellChecker, keys: &[AnswerKey], answer: &str) -> bool {
    answer
        .split_whitespace()
        .any(|word| spell.is_misspelled(word) && !key_match::any_key_contains_word(keys, word))
}

/// True when reducing both sides to singular form turns the failed answer
/// into a match.
pub(crate) fn grammatical_mistake(
    inflector: &dyn Inflector,
    keys: &[AnswerKey],
    answer: &str,
) -> bool {
    let singular_keys = map_keys(keys, |text| inflector.singular(text));
    key_match::matches(&singular_keys, &inflector.singular(answer))
}

/// The contraction detector has no matching step at all.
pub(crate) fn contraction_mistake(answer: &str) -> bool {
    answer.contains('\'')
}

pub(crate) fn strip_punctuation(text: &str) -> String {
    text.chars().filter(|ch| !PUNCTUATION.contains(ch)).collect()
}

fn map_keys(keys: &[AnswerKey], transform: impl Fn(&str) -> String) -> Vec<AnswerKey> {
    keys.iter()
        .map(|key| AnswerKey {
            key: transform(&key.key),
            alternatives: key
                .alternatives
                .iter()
                .map(|group| crate::db::models::WordAlternatives {
                    word: transform(&group.word),
                    alternatives: group.alternatives.iter().map(|alt| transform(alt)).collect(),
                })
                .collect(),
        })
        .collect()
}
