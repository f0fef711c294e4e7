use std::sync::Arc;

use crate::analysis::pipeline::Analyzer;
use crate::config::Config;
use crate::store::{EvaluationStore, JobDescriptionStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub analyzer: Arc<Analyzer>,
    /// Postgres when DATABASE_URL is set, in-memory otherwise.
    pub evaluations: Arc<dyn EvaluationStore>,
    pub jobs: Arc<dyn JobDescriptionStore>,
}
