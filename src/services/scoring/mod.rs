pub(crate) mod key_match;
pub(crate) mod mistakes;
pub(crate) mod policy;

pub(crate) use policy::{Scorer, FLAGGED};

/// Capability used by the spelling detector. Implementations decide what
/// counts as a known word; a permissive implementation never fires.
pub(crate) trait SpellChecker: Send + Sync {
    fn is_misspelled(&self, word: &str) -> bool;
}

/// Capability used by the grammatical detector to reduce a word or phrase
/// to its singular form.
pub(crate) trait Inflector: Send + Sync {
    fn singular(&self, text: &str) -> String;
}
