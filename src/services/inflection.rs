use std::collections::HashMap;

use crate::services::scoring::Inflector;

/// Rule-based English singularizer. Irregular forms are looked up against
/// the last word of the phrase; suffix rules then apply to the phrase as a
/// whole, so "big dogs" reduces to "big dog" while inner words stay intact.
pub(crate) struct RuleInflector {
    irregular: HashMap<&'static str, &'static str>,
    uncountable: Vec<&'static str>,
}

impl RuleInflector {
    pub(crate) fn new() -> Self {
        let irregular = HashMap::from([
            ("men", "man"),
            ("women", "woman"),
            ("children", "child"),
            ("people", "person"),
            ("teeth", "tooth"),
            ("feet", "foot"),
            ("geese", "goose"),
            ("mice", "mouse"),
            ("oxen", "ox"),
        ]);
        let uncountable =
            vec!["sheep", "fish", "deer", "series", "species", "news", "information", "equipment"];
        Self { irregular, uncountable }
    }

    fn singular_word(&self, word: &str) -> String {
        let lower = word.to_lowercase();

        if self.uncountable.contains(&lower.as_str()) {
            return word.to_string();
        }
        if let Some(singular) = self.irregular.get(lower.as_str()) {
            return (*singular).to_string();
        }

        if let Some(stem) = lower.strip_suffix("ies") {
            if !stem.is_empty() {
                return format!("{stem}y");
            }
        }
        if let Some(stem) = lower.strip_suffix("ives") {
            return format!("{stem}ife");
        }
        if let Some(stem) = lower.strip_suffix("ves") {
            return format!("{stem}f");
        }
        for suffix in ["sses", "xes", "ches", "shes", "zes"] {
            if let Some(stem) = lower.strip_suffix(suffix) {
                return format!("{stem}{}", &suffix[..suffix.len() - 2]);
            }
        }
        if lower.ends_with('s')
            && !lower.ends_with("ss")
            && !lower.ends_with("us")
            && !lower.ends_with("is")
        {
            return lower[..lower.len() - 1].to_string();
        }

        lower
    }
}

impl Inflector for RuleInflector {
    fn singular(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|word| self.singular_word(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_plurals_drop_the_s() {
        let inflector = RuleInflector::new();
        assert_eq!(inflector.singular("dogs"), "dog");
        assert_eq!(inflector.singular("cats"), "cat");
    }

    #[test]
    fn suffix_rules_cover_common_forms() {
        let inflector = RuleInflector::new();
        assert_eq!(inflector.singular("cities"), "city");
        assert_eq!(inflector.singular("knives"), "knife");
        assert_eq!(inflector.singular("wolves"), "wolf");
        assert_eq!(inflector.singular("boxes"), "box");
        assert_eq!(inflector.singular("classes"), "class");
        assert_eq!(inflector.singular("branches"), "branch");
    }

    #[test]
    fn irregular_plurals_are_looked_up() {
        let inflector = RuleInflector::new();
        assert_eq!(inflector.singular("children"), "child");
        assert_eq!(inflector.singular("mice"), "mouse");
        assert_eq!(inflector.singular("people"), "person");
    }

    #[test]
    fn singular_and_uncountable_words_pass_through() {
        let inflector = RuleInflector::new();
        assert_eq!(inflector.singular("dog"), "dog");
        assert_eq!(inflector.singular("sheep"), "sheep");
        assert_eq!(inflector.singular("class"), "class");
        assert_eq!(inflector.singular("bus"), "bus");
        assert_eq!(inflector.singular("analysis"), "analysis");
    }

    #[test]
    fn phrases_singularize_every_word() {
        let inflector = RuleInflector::new();
        assert_eq!(inflector.singular("big dogs"), "big dog");
        assert_eq!(inflector.singular("the children play"), "the child play");
    }
}
