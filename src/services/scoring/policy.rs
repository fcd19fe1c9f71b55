use std::sync::Arc;

use crate::db::models::{AnswerKey, MarkConfig};
use crate::db::types::MistakeOption;
use crate::services::scoring::{key_match, mistakes, mistakes::MistakeKind, Inflector, SpellChecker};

/// Score sentinel meaning the answer needs a human decision. Never stored;
/// the workflow maps it to a flagged status with mark 0.
pub(crate) const FLAGGED: i32 = -1;

/// Scores a single answer against a question's keys and the test's mark
/// configuration. Detector dependencies are injected so the engine stays
/// deterministic under test.
#[derive(Clone)]
pub(crate) struct Scorer {
    spell: Arc<dyn SpellChecker>,
    inflect: Arc<dyn Inflector>,
}

impl Scorer {
    pub(crate) fn new(spell: Arc<dyn SpellChecker>, inflect: Arc<dyn Inflector>) -> Self {
        Self { spell, inflect }
    }

    pub(crate) fn from_settings(settings: &crate::core::config::ScoringSettings) -> Self {
        Self::new(
            Arc::new(crate::services::spellcheck::Lexicon::from_settings(settings)),
            Arc::new(crate::services::inflection::RuleInflector::new()),
        )
    }

    /// Returns `max_score`, `0`, or [`FLAGGED`].
    ///
    /// A missing or empty answer scores 0 without running any detector. A
    /// raw key match awards `max_score` regardless of configuration. For a
    /// failed match the detectors run in a fixed order; a `Flag` verdict is
    /// recorded but the remaining detectors still run, so a later
    /// `Incorrect` verdict overrides it to 0.
    pub(crate) fn score(
        &self,
        answer: Option<&str>,
        keys: &[AnswerKey],
        config: &MarkConfig,
        max_score: i32,
    ) -> i32 {
        let Some(answer) = answer else {
            return 0;
        };
        if answer.is_empty() {
            return 0;
        }

        if key_match::matches(keys, answer) {
            return max_score;
        }

        let mut score = 0;
        for kind in MistakeKind::DETECTION_ORDER {
            let detected = match kind {
                MistakeKind::Case => mistakes::case_mistake(keys, answer),
                MistakeKind::Punctuation => mistakes::punctuation_mistake(keys, answer),
                MistakeKind::Spelling => {
                    mistakes::spelling_mistake(self.spell.as_ref(), keys, answer)
                }
                MistakeKind::Grammatical => {
                    mistakes::grammatical_mistake(self.inflect.as_ref(), keys, answer)
                }
                MistakeKind::Contraction => mistakes::contraction_mistake(answer),
            };
            if !detected {
                continue;
            }

            match config.option_for(kind) {
                MistakeOption::Correct => {}
                MistakeOption::Flag => score = FLAGGED,
                MistakeOption::Incorrect => return 0,
            }
        }

        score
    }
}

impl MarkConfig {
    pub(crate) fn option_for(&self, kind: MistakeKind) -> MistakeOption {
        match kind {
            MistakeKind::Case => self.case_mistakes,
            MistakeKind::Punctuation => self.punctuation_mistakes,
            MistakeKind::Spelling => self.spelling_mistakes,
            MistakeKind::Grammatical => self.grammatical_errors,
            MistakeKind::Contraction => self.contraction_mistakes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::WordAlternatives;
    use std::collections::HashSet;

    struct FixedSpeller(HashSet<String>);

    impl SpellChecker for FixedSpeller {
        fn is_misspelled(&self, word: &str) -> bool {
            self.0.contains(&word.to_lowercase())
        }
    }

    fn scorer_with_misspellings(words: &[&str]) -> Scorer {
        let bad = words.iter().map(|word| word.to_string()).collect();
        Scorer::new(
            Arc::new(FixedSpeller(bad)),
            Arc::new(crate::services::inflection::RuleInflector::new()),
        )
    }

    fn all(option: crate::db::types::MistakeOption) -> MarkConfig {
        MarkConfig {
            case_mistakes: option,
            contraction_mistakes: option,
            punctuation_mistakes: option,
            spelling_mistakes: option,
            grammatical_errors: option,
        }
    }

    fn keys(texts: &[&str]) -> Vec<AnswerKey> {
        texts
            .iter()
            .map(|text| AnswerKey { key: text.to_string(), alternatives: Vec::new() })
            .collect()
    }

    #[test]
    fn missing_or_empty_answer_scores_zero() {
        let scorer = scorer_with_misspellings(&[]);
        let config = all(MistakeOption::Flag);
        assert_eq!(scorer.score(None, &keys(&["Paris"]), &config, 5), 0);
        assert_eq!(scorer.score(Some(""), &keys(&["Paris"]), &config, 5), 0);
    }

    #[test]
    fn exact_match_ignores_configuration() {
        let scorer = scorer_with_misspellings(&[]);
        for option in [MistakeOption::Correct, MistakeOption::Incorrect, MistakeOption::Flag] {
            assert_eq!(scorer.score(Some("paris"), &keys(&["Paris"]), &all(option), 5), 5);
        }
    }

    #[test]
    fn every_verdict_is_max_zero_or_flagged() {
        let scorer = scorer_with_misspellings(&["pariss"]);
        let key_set = keys(&["Paris"]);
        for option in [MistakeOption::Correct, MistakeOption::Incorrect, MistakeOption::Flag] {
            for answer in [None, Some(""), Some("paris"), Some("pariss"), Some("it's paris!")] {
                let score = scorer.score(answer, &key_set, &all(option), 3);
                assert!(score == 3 || score == 0 || score == FLAGGED, "got {score}");
            }
        }
    }

    #[test]
    fn scoring_is_deterministic() {
        let scorer = scorer_with_misspellings(&["pariss"]);
        let key_set = keys(&["Paris"]);
        let config = all(MistakeOption::Flag);
        let first = scorer.score(Some("pariss"), &key_set, &config, 4);
        let second = scorer.score(Some("pariss"), &key_set, &config, 4);
        assert_eq!(first, second);
        assert_eq!(first, FLAGGED);
    }

    #[test]
    fn later_incorrect_overrides_earlier_flag() {
        // "it's a dog" raises a punctuation mistake (flagged) and then a
        // contraction mistake (incorrect): the contraction verdict wins.
        let scorer = scorer_with_misspellings(&[]);
        let key_set = keys(&["its a dog"]);
        let mut config = all(MistakeOption::Correct);
        config.punctuation_mistakes = MistakeOption::Flag;
        config.contraction_mistakes = MistakeOption::Incorrect;
        assert_eq!(scorer.score(Some("it's a dog"), &key_set, &config, 5), 0);

        // With the contraction tolerated instead, the flag survives.
        config.contraction_mistakes = MistakeOption::Correct;
        assert_eq!(scorer.score(Some("it's a dog"), &key_set, &config, 5), FLAGGED);
    }

    #[test]
    fn contraction_answers_reach_the_contraction_detector() {
        // "it's" must not read as a spelling mistake when the lexicon knows
        // the base word, or a strict spelling option would zero the answer
        // before the contraction category is ever consulted.
        let lexicon = crate::services::spellcheck::Lexicon::from_words(&["it", "its", "a", "dog"]);
        let scorer = Scorer::new(
            Arc::new(lexicon),
            Arc::new(crate::services::inflection::RuleInflector::new()),
        );
        let key_set = keys(&["its a dog"]);
        let mut config = all(MistakeOption::Correct);
        config.spelling_mistakes = MistakeOption::Incorrect;
        config.contraction_mistakes = MistakeOption::Flag;
        assert_eq!(scorer.score(Some("it's a dog"), &key_set, &config, 5), FLAGGED);
    }

    #[test]
    fn tolerated_mistake_still_scores_zero() {
        // Correct means "not penalized beyond the failed match", not
        // "awarded the maximum".
        let scorer = scorer_with_misspellings(&[]);
        let key_set = keys(&["dog"]);
        assert_eq!(scorer.score(Some("dogs"), &key_set, &all(MistakeOption::Correct), 5), 0);
    }

    #[test]
    fn flagged_spelling_mistake_flags_the_answer() {
        let scorer = scorer_with_misspellings(&["pariss"]);
        let key_set = keys(&["Paris"]);
        let mut config = all(MistakeOption::Correct);
        config.spelling_mistakes = MistakeOption::Flag;
        assert_eq!(scorer.score(Some("pariss"), &key_set, &config, 5), FLAGGED);
    }

    #[test]
    fn alternatives_participate_in_exact_match() {
        let scorer = scorer_with_misspellings(&[]);
        let key_set = vec![AnswerKey {
            key: "big dog".to_string(),
            alternatives: vec![WordAlternatives {
                word: "dog".to_string(),
                alternatives: vec!["hound".to_string()],
            }],
        }];
        assert_eq!(scorer.score(Some("big hound"), &key_set, &all(MistakeOption::Incorrect), 2), 2);
    }

    #[test]
    fn unmatched_answer_with_no_detected_mistakes_scores_zero() {
        let scorer = scorer_with_misspellings(&[]);
        assert_eq!(
            scorer.score(Some("london"), &keys(&["Paris"]), &all(MistakeOption::Flag), 5),
            0
        );
    }
}
