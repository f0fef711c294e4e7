//! Batch analysis — many resumes against one job description.
//!
//! Each resume runs as its own task. The analyzer's ceiling bounds how many
//! pipelines are in flight, shared with every other batch and single run on
//! the same analyzer. A failed resume becomes an `Error` entry and never
//! stops its siblings. Entries keep upload order.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analysis::pipeline::{AnalysisInput, AnalysisResponse, Analyzer};
use crate::extraction::DocumentFormat;

#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Complete,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub filename: String,
    pub status: BatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchEntry {
    fn complete(filename: String, result: AnalysisResponse) -> Self {
        Self {
            filename,
            status: BatchStatus::Complete,
            result: Some(result),
            error: None,
        }
    }

    fn failed(filename: String, error: String) -> Self {
        Self {
            filename,
            status: BatchStatus::Error,
            result: None,
            error: Some(error),
        }
    }
}

pub async fn analyze_batch(
    analyzer: Arc<Analyzer>,
    job_description: &str,
    uploads: Vec<ResumeUpload>,
) -> Vec<BatchEntry> {
    info!("Batch analysis of {} resumes", uploads.len());

    let handles: Vec<_> = uploads
        .into_iter()
        .map(|upload| {
            let filename = upload.filename.clone();
            let analyzer = analyzer.clone();
            let job_description = job_description.to_string();
            let handle = tokio::spawn(async move {
                let file_format =
                    DocumentFormat::detect(&upload.filename, upload.content_type.as_deref())?;
                analyzer
                    .run(AnalysisInput {
                        file_bytes: upload.bytes,
                        file_format,
                        job_description,
                    })
                    .await
            });
            (filename, handle)
        })
        .collect();

    let mut entries = Vec::with_capacity(handles.len());
    for (filename, handle) in handles {
        let entry = match handle.await {
            Ok(Ok(result)) => BatchEntry::complete(filename, result),
            Ok(Err(e)) => {
                warn!("Analysis of {filename} failed: {e}");
                BatchEntry::failed(filename, e.detail())
            }
            Err(e) => {
                warn!("Analysis task for {filename} did not finish: {e}");
                BatchEntry::failed(filename, format!("analysis task failed: {e}"))
            }
        };
        entries.push(entry);
    }
    entries
}
