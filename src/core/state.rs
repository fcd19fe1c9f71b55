use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::Settings;
use crate::services::scoring::Scorer;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    scorer: Scorer,
}

impl AppState {
    pub(crate) fn new(settings: Settings, db: PgPool, scorer: Scorer) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, scorer }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn scorer(&self) -> &Scorer {
        &self.inner.scorer
    }
}
