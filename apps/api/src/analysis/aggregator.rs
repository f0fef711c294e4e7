//! Aggregator — weighted final score, verdict and suggestions.

use serde::{Deserialize, Serialize};

use crate::analysis::semantic_judge::SemanticJudge;
use crate::analysis::verdict::Verdict;
use crate::errors::AppError;

/// Absorbs representation error: 0.6 * 6 + 0.4 * 1 evaluates to 3.9999999999999996.
const FLOOR_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub embedding: f64,
    pub keyword: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            embedding: 0.6,
            keyword: 0.4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub final_score: u32,
    pub verdict: Verdict,
    pub suggestions: String,
}

/// floor(w_e * embedding + w_k * hard), clamped to 0 – 100.
pub fn final_score(embedding_score: u32, hard_score: f64, weights: &ScoringWeights) -> u32 {
    let raw = weights.embedding * embedding_score as f64 + weights.keyword * hard_score;
    (raw + FLOOR_EPSILON).floor().clamp(0.0, 100.0) as u32
}

pub async fn aggregate(
    judge: &SemanticJudge,
    weights: &ScoringWeights,
    embedding_score: u32,
    hard_score: f64,
    semantic_analysis: &str,
    missing_keywords: &[String],
) -> Result<Aggregate, AppError> {
    let score = final_score(embedding_score, hard_score, weights);
    let judgement = judge
        .verdict_and_suggestions(score, missing_keywords, semantic_analysis)
        .await?;

    Ok(Aggregate {
        final_score: score,
        verdict: judgement.verdict,
        suggestions: judgement.suggestions,
    })
}
