//! Embedding Scorer — penalized best-match semantic similarity between term sets.
//!
//! Algorithm:
//! 1. Embed the unique resume tokens and unique JD tokens in ONE batched call.
//! 2. For each JD vector, take the best cosine similarity against all resume vectors,
//!    clamped into [0, 1].
//! 3. Raise each best match to the penalty exponent (default 2: 0.9 → 0.81, 0.7 → 0.49)
//!    so strong matches separate from weak ones.
//! 4. score = mean penalized similarity × 100, truncated.
//!
//! Fail-soft: any embedding failure is logged and scores 0.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::llm_client::{Embedder, LlmError};

pub const DEFAULT_PENALTY_EXPONENT: i32 = 2;

pub struct EmbeddingScorer {
    embedder: Arc<dyn Embedder>,
    penalty_exponent: i32,
}

impl EmbeddingScorer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            penalty_exponent: DEFAULT_PENALTY_EXPONENT,
        }
    }

    pub fn with_penalty_exponent(mut self, exponent: i32) -> Self {
        self.penalty_exponent = exponent;
        self
    }

    /// Returns 0 – 100. Never fails: capability errors degrade to 0.
    pub async fn score(&self, resume_tokens: &[String], jd_tokens: &[String]) -> u32 {
        let resume = unique(resume_tokens);
        let jd = unique(jd_tokens);

        if resume.is_empty() || jd.is_empty() {
            return 0;
        }

        match self.try_score(&resume, &jd).await {
            Ok(score) => {
                debug!(
                    "Embedding score {score} over {} JD terms / {} resume terms",
                    jd.len(),
                    resume.len()
                );
                score
            }
            Err(e) => {
                warn!("Embedding scoring failed, defaulting to 0: {e}");
                0
            }
        }
    }

    async fn try_score(&self, resume: &[String], jd: &[String]) -> Result<u32, LlmError> {
        let batch: Vec<String> = resume.iter().chain(jd).cloned().collect();
        let vectors = self.embedder.embed(&batch).await?;

        if vectors.len() != batch.len() {
            return Err(LlmError::MalformedEmbeddings(format!(
                "requested {} vectors, received {}",
                batch.len(),
                vectors.len()
            )));
        }

        let dimensions = vectors[0].len();
        if dimensions == 0 || vectors.iter().any(|v| v.len() != dimensions) {
            return Err(LlmError::MalformedEmbeddings(
                "vectors are empty or of mixed dimensions".to_string(),
            ));
        }

        let (resume_vectors, jd_vectors) = vectors.split_at(resume.len());

        let total: f64 = jd_vectors
            .iter()
            .map(|jd_vec| {
                let best = resume_vectors
                    .iter()
                    .map(|r| cosine_similarity(jd_vec, r))
                    .fold(0.0_f64, f64::max);
                best.clamp(0.0, 1.0).powi(self.penalty_exponent)
            })
            .sum();

        let mean = total / jd_vectors.len() as f64;
        Ok((mean * 100.0).clamp(0.0, 100.0) as u32)
    }
}

/// Cosine similarity in [-1, 1]; 0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn unique(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect()
}
