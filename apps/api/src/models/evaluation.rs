use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One analysis run, completed or failed. Rows are never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EvaluationRow {
    pub id: Uuid,
    pub filename: String,
    pub job_description: String,
    /// Serialized `AnalysisResponse`, or `{"error": ...}` for a failed run.
    pub result: Value,
    pub relevance_score: Option<i32>,
    pub verdict: Option<String>,
    pub created_at: DateTime<Utc>,
}
