use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::evaluation::EvaluationRow;
use crate::models::job::{JobDescriptionInput, JobDescriptionRow};
use crate::store::{EvaluationStore, JobDescriptionStore, NewEvaluation};

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    evaluations: RwLock<Vec<EvaluationRow>>,
    jobs: RwLock<Vec<JobDescriptionRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EvaluationStore for MemoryStore {
    async fn save(&self, record: NewEvaluation) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        self.evaluations.write().await.push(EvaluationRow {
            id,
            filename: record.filename,
            job_description: record.job_description,
            result: record.result,
            relevance_score: record.relevance_score,
            verdict: record.verdict,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<EvaluationRow>, AppError> {
        let rows = self.evaluations.read().await;
        Ok(rows.iter().find(|r| r.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<EvaluationRow>, AppError> {
        let rows = self.evaluations.read().await;
        Ok(rows.iter().rev().cloned().collect())
    }
}

#[async_trait]
impl JobDescriptionStore for MemoryStore {
    async fn create(&self, input: JobDescriptionInput) -> Result<JobDescriptionRow, AppError> {
        let row = JobDescriptionRow {
            id: Uuid::new_v4(),
            company_name: input.company_name,
            job_role: input.job_role,
            description: input.description,
            created_at: Utc::now(),
        };
        self.jobs.write().await.push(row.clone());
        Ok(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<JobDescriptionRow>, AppError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<JobDescriptionRow>, AppError> {
        let jobs = self.jobs.read().await;
        Ok(jobs.iter().rev().cloned().collect())
    }

    async fn update(
        &self,
        id: Uuid,
        input: JobDescriptionInput,
    ) -> Result<Option<JobDescriptionRow>, AppError> {
        let mut jobs = self.jobs.write().await;
        Ok(jobs.iter_mut().find(|j| j.id == id).map(|job| {
            job.company_name = input.company_name;
            job.job_role = input.job_role;
            job.description = input.description;
            job.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|j| j.id != id);
        Ok(jobs.len() != before)
    }
}
