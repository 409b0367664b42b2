use std::sync::Arc;

use tokio::sync::Mutex;

use crate::models::session::Session;
use crate::orchestrator::Orchestrator;

/// Shared application state injected into all route handlers via Axum
/// extractors.
///
/// One session per process. The mutex is the ordering guarantee: handlers
/// hold it across their whole action, so stage transitions and cache
/// operations are strictly sequential and at most one remote LLM call is
/// outstanding at a time.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub orchestrator: Arc<Orchestrator>,
}
