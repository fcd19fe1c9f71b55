pub(crate) mod auth;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod marking;
pub(crate) mod router;
pub(crate) mod users;
