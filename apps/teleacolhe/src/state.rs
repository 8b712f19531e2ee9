//! Estado compartilhado da aplicação

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::diagnosis::DiagnosisClient;
use crate::session::SessionStore;

/// Estado compartilhado entre os handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub diagnosis: Arc<DiagnosisClient>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(pool: SqlitePool, diagnosis: DiagnosisClient, sessions: SessionStore) -> Self {
        Self {
            pool,
            diagnosis: Arc::new(diagnosis),
            sessions,
        }
    }
}

impl FromRef<AppState> for SessionStore {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}
