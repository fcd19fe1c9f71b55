pub(crate) mod answers;
pub(crate) mod questions;
pub(crate) mod users;
