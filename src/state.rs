use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::db::SqliteStore;
use crate::services::CostEngine;
use crate::terms::TermResolver;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub engine: Arc<CostEngine>,
    pub terms: Arc<TermResolver>,
    pub query_timeout: Duration,
}

impl AppState {
    /// Wires the SQLite-backed store and the resolver into a cost engine.
    pub fn new(db: SqlitePool, terms: Arc<TermResolver>, query_timeout: Duration) -> Self {
        let store = Arc::new(SqliteStore::new(db.clone(), query_timeout));
        let engine = Arc::new(CostEngine::new(store, terms.clone()));
        Self {
            db,
            engine,
            terms,
            query_timeout,
        }
    }
}
