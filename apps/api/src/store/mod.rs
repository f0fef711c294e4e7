//! Persistence seams for evaluations and saved job descriptions.
//!
//! `PgStore` backs both traits with Postgres; `MemoryStore` is used when no
//! database is configured and in tests.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::{debug, error};
use uuid::Uuid;

use crate::analysis::pipeline::AnalysisResponse;
use crate::errors::AppError;
use crate::models::evaluation::EvaluationRow;
use crate::models::job::{JobDescriptionInput, JobDescriptionRow};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// An evaluation record before it has an id and timestamp.
#[derive(Debug, Clone)]
pub struct NewEvaluation {
    pub filename: String,
    pub job_description: String,
    pub result: Value,
    pub relevance_score: Option<i32>,
    pub verdict: Option<String>,
}

impl NewEvaluation {
    pub fn completed(filename: &str, job_description: &str, response: &AnalysisResponse) -> Self {
        Self {
            filename: filename.to_string(),
            job_description: job_description.to_string(),
            result: serde_json::to_value(response).unwrap_or(Value::Null),
            relevance_score: i32::try_from(response.relevance_score).ok(),
            verdict: Some(response.verdict.to_string()),
        }
    }

    pub fn failed(filename: &str, job_description: &str, detail: &str) -> Self {
        Self {
            filename: filename.to_string(),
            job_description: job_description.to_string(),
            result: json!({ "error": detail }),
            relevance_score: None,
            verdict: None,
        }
    }
}

#[async_trait]
pub trait EvaluationStore: Send + Sync {
    async fn save(&self, record: NewEvaluation) -> Result<Uuid, AppError>;
    async fn get(&self, id: Uuid) -> Result<Option<EvaluationRow>, AppError>;
    /// Newest first.
    async fn list_all(&self) -> Result<Vec<EvaluationRow>, AppError>;
}

#[async_trait]
pub trait JobDescriptionStore: Send + Sync {
    async fn create(&self, input: JobDescriptionInput) -> Result<JobDescriptionRow, AppError>;
    async fn get(&self, id: Uuid) -> Result<Option<JobDescriptionRow>, AppError>;
    /// Newest first.
    async fn list(&self) -> Result<Vec<JobDescriptionRow>, AppError>;
    async fn update(
        &self,
        id: Uuid,
        input: JobDescriptionInput,
    ) -> Result<Option<JobDescriptionRow>, AppError>;
    /// Returns false when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Saves a record without blocking the caller. Failures are logged and dropped.
pub fn persist_in_background(
    store: Arc<dyn EvaluationStore>,
    record: NewEvaluation,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let filename = record.filename.clone();
        match store.save(record).await {
            Ok(id) => debug!("Stored evaluation {id} for {filename}"),
            Err(e) => error!("Failed to store evaluation for {filename}: {e}"),
        }
    })
}
