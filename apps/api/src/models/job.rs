use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobDescriptionRow {
    pub id: Uuid,
    pub company_name: String,
    pub job_role: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Create / update payload for a saved job description.
#[derive(Debug, Clone, Deserialize)]
pub struct JobDescriptionInput {
    pub company_name: String,
    pub job_role: String,
    pub description: String,
}
