use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::evaluation::EvaluationRow;
use crate::models::job::{JobDescriptionInput, JobDescriptionRow};
use crate::store::{EvaluationStore, JobDescriptionStore, NewEvaluation};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EvaluationStore for PgStore {
    async fn save(&self, record: NewEvaluation) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO evaluations
                (id, filename, job_description, result, relevance_score, verdict)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&record.filename)
        .bind(&record.job_description)
        .bind(&record.result)
        .bind(record.relevance_score)
        .bind(&record.verdict)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<EvaluationRow>, AppError> {
        Ok(
            sqlx::query_as::<_, EvaluationRow>("SELECT * FROM evaluations WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_all(&self) -> Result<Vec<EvaluationRow>, AppError> {
        Ok(
            sqlx::query_as::<_, EvaluationRow>("SELECT * FROM evaluations ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?,
        )
    }
}

#[async_trait]
impl JobDescriptionStore for PgStore {
    async fn create(&self, input: JobDescriptionInput) -> Result<JobDescriptionRow, AppError> {
        Ok(sqlx::query_as::<_, JobDescriptionRow>(
            r#"
            INSERT INTO job_descriptions (id, company_name, job_role, description)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.company_name)
        .bind(&input.job_role)
        .bind(&input.description)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get(&self, id: Uuid) -> Result<Option<JobDescriptionRow>, AppError> {
        Ok(
            sqlx::query_as::<_, JobDescriptionRow>("SELECT * FROM job_descriptions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list(&self) -> Result<Vec<JobDescriptionRow>, AppError> {
        Ok(sqlx::query_as::<_, JobDescriptionRow>(
            "SELECT * FROM job_descriptions ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update(
        &self,
        id: Uuid,
        input: JobDescriptionInput,
    ) -> Result<Option<JobDescriptionRow>, AppError> {
        Ok(sqlx::query_as::<_, JobDescriptionRow>(
            r#"
            UPDATE job_descriptions
            SET company_name = $2, job_role = $3, description = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.company_name)
        .bind(&input.job_role)
        .bind(&input.description)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM job_descriptions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
