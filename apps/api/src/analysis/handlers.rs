//! Axum route handlers for the Analysis, Jobs and Evaluations APIs.

use std::convert::Infallible;
use std::time::Duration;

use async_stream::stream;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::batch::{analyze_batch, BatchEntry, BatchStatus, ResumeUpload};
use crate::analysis::pipeline::{AnalysisInput, AnalysisResponse, PipelineEvent};
use crate::errors::AppError;
use crate::extraction::DocumentFormat;
use crate::models::evaluation::EvaluationRow;
use crate::models::job::{JobDescriptionInput, JobDescriptionRow};
use crate::state::AppState;
use crate::store::{persist_in_background, NewEvaluation};

// ────────────────────────────────────────────────────────────────────────────
// Request parsing
// ────────────────────────────────────────────────────────────────────────────

/// Multipart body shared by the analyze endpoints: one or more `resume`
/// files plus either `job_description` text or a saved `job_id`.
#[derive(Debug, Default)]
struct AnalyzeForm {
    resumes: Vec<ResumeUpload>,
    job_description: Option<String>,
    job_id: Option<Uuid>,
}

async fn read_form(mut multipart: Multipart) -> Result<AnalyzeForm, AppError> {
    let mut form = AnalyzeForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "resume" => {
                let filename = field.file_name().unwrap_or("resume").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes: Bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read upload {filename}: {e}"))
                })?;
                form.resumes.push(ResumeUpload {
                    filename,
                    content_type,
                    bytes,
                });
            }
            "job_description" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid job_description: {e}")))?;
                form.job_description = Some(text);
            }
            "job_id" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid job_id: {e}")))?;
                let id = raw
                    .trim()
                    .parse()
                    .map_err(|_| AppError::Validation(format!("Invalid job_id '{raw}'")))?;
                form.job_id = Some(id);
            }
            other => warn!("Ignoring unexpected multipart field '{other}'"),
        }
    }

    Ok(form)
}

/// Inline text wins over a saved job id.
async fn resolve_job_description(state: &AppState, form: &AnalyzeForm) -> Result<String, AppError> {
    if let Some(text) = form.job_description.as_deref() {
        if !text.trim().is_empty() {
            return Ok(text.to_string());
        }
    }

    match form.job_id {
        Some(id) => state
            .jobs
            .get(id)
            .await?
            .map(|job| job.description)
            .ok_or_else(|| AppError::NotFound(format!("Job description {id} not found"))),
        None => Err(AppError::Validation(
            "Provide either job_description or job_id".to_string(),
        )),
    }
}

/// Validates a single-resume request before any pipeline work starts.
async fn single_input(
    state: &AppState,
    multipart: Multipart,
) -> Result<(String, AnalysisInput), AppError> {
    let mut form = read_form(multipart).await?;
    let job_description = resolve_job_description(state, &form).await?;

    if form.resumes.len() != 1 {
        return Err(AppError::Validation(format!(
            "Expected exactly one resume file, got {}",
            form.resumes.len()
        )));
    }
    let upload = form.resumes.remove(0);
    let file_format = DocumentFormat::detect(&upload.filename, upload.content_type.as_deref())?;

    Ok((
        upload.filename,
        AnalysisInput {
            file_bytes: upload.bytes,
            file_format,
            job_description,
        },
    ))
}

fn record_outcome(
    state: &AppState,
    filename: &str,
    job_description: &str,
    outcome: Result<&AnalysisResponse, &AppError>,
) {
    let record = match outcome {
        Ok(response) => NewEvaluation::completed(filename, job_description, response),
        Err(e) => NewEvaluation::failed(filename, job_description, &e.detail()),
    };
    persist_in_background(state.evaluations.clone(), record);
}

// ────────────────────────────────────────────────────────────────────────────
// Analysis handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let (filename, input) = single_input(&state, multipart).await?;
    let job_description = input.job_description.clone();
    info!("Analyzing {filename} ({})", input.file_format);

    let outcome = state.analyzer.run(input).await;
    record_outcome(&state, &filename, &job_description, outcome.as_ref());
    Ok(Json(outcome?))
}

/// POST /api/v1/analyze/stream
///
/// Emits `progress` after each stage, then exactly one `result` or `error`.
pub async fn handle_analyze_stream(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let (filename, input) = single_input(&state, multipart).await?;
    let job_description = input.job_description.clone();
    info!("Streaming analysis of {filename} ({})", input.file_format);

    let mut events = Box::pin(state.analyzer.clone().stream(input));
    let stream = stream! {
        while let Some(event) = events.next().await {
            match event {
                Ok(PipelineEvent::StageComplete { stage, progress }) => {
                    yield Ok(sse_event("progress", &json!({
                        "stage": stage.name(),
                        "progress": progress,
                    })));
                }
                Ok(PipelineEvent::FinalResult { result }) => {
                    record_outcome(&state, &filename, &job_description, Ok(&result));
                    yield Ok(sse_event("result", &result));
                }
                Err(e) => {
                    warn!("Streaming analysis of {filename} failed: {e}");
                    record_outcome(&state, &filename, &job_description, Err(&e));
                    yield Ok(sse_event("error", &json!({ "error": e.detail() })));
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

fn sse_event<T: Serialize>(name: &str, payload: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(payload)
        .unwrap_or_else(|e| Event::default().event("error").data(e.to_string()))
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<BatchEntry>,
}

/// POST /api/v1/analyze/batch
pub async fn handle_analyze_batch(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<BatchResponse>, AppError> {
    let form = read_form(multipart).await?;
    let job_description = resolve_job_description(&state, &form).await?;
    if form.resumes.is_empty() {
        return Err(AppError::Validation(
            "At least one resume file is required".to_string(),
        ));
    }

    let results = analyze_batch(state.analyzer.clone(), &job_description, form.resumes).await;

    for entry in &results {
        let record = match (&entry.status, &entry.result) {
            (BatchStatus::Complete, Some(result)) => {
                NewEvaluation::completed(&entry.filename, &job_description, result)
            }
            _ => NewEvaluation::failed(
                &entry.filename,
                &job_description,
                entry.error.as_deref().unwrap_or("analysis failed"),
            ),
        };
        persist_in_background(state.evaluations.clone(), record);
    }

    Ok(Json(BatchResponse { results }))
}

// ────────────────────────────────────────────────────────────────────────────
// Job description handlers
// ────────────────────────────────────────────────────────────────────────────

fn validate_job(input: &JobDescriptionInput) -> Result<(), AppError> {
    for (field, value) in [
        ("company_name", &input.company_name),
        ("job_role", &input.job_role),
        ("description", &input.description),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{field} must not be empty")));
        }
    }
    Ok(())
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobDescriptionRow>>, AppError> {
    Ok(Json(state.jobs.list().await?))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(input): Json<JobDescriptionInput>,
) -> Result<(StatusCode, Json<JobDescriptionRow>), AppError> {
    validate_job(&input)?;
    let job = state.jobs.create(input).await?;
    info!("Saved job description {} ({} at {})", job.id, job.job_role, job.company_name);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobDescriptionRow>, AppError> {
    state
        .jobs
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job description {id} not found")))
}

/// PUT /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<JobDescriptionInput>,
) -> Result<Json<JobDescriptionRow>, AppError> {
    validate_job(&input)?;
    state
        .jobs
        .update(id, input)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Job description {id} not found")))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.jobs.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Job description {id} not found")))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluation handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/evaluations
pub async fn handle_list_evaluations(
    State(state): State<AppState>,
) -> Result<Json<Vec<EvaluationRow>>, AppError> {
    Ok(Json(state.evaluations.list_all().await?))
}

/// GET /api/v1/evaluations/:id
pub async fn handle_get_evaluation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EvaluationRow>, AppError> {
    state
        .evaluations
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Evaluation {id} not found")))
}
