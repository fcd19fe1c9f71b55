pub(crate) mod scheduler;
