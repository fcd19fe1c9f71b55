pub(crate) mod inflection;
pub(crate) mod marking;
pub(crate) mod scoring;
pub(crate) mod sheet;
pub(crate) mod spellcheck;
