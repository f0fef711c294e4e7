//! Semantic Judge — qualitative analysis and suggestions from the language model.
//!
//! No retries here: the model client owns retry policy, and any failure that
//! reaches this layer aborts the run.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::prompts::{SEMANTIC_ANALYSIS_PROMPT_TEMPLATE, SUGGESTIONS_PROMPT_TEMPLATE};
use crate::analysis::verdict::Verdict;
use crate::errors::AppError;
use crate::llm_client::prompts::{PLAIN_TEXT_INSTRUCTION, RECRUITER_SYSTEM};
use crate::llm_client::LanguageModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgement {
    pub verdict: Verdict,
    pub suggestions: String,
}

pub struct SemanticJudge {
    llm: Arc<dyn LanguageModel>,
}

impl SemanticJudge {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// One paragraph describing how well the resume aligns with the JD.
    pub async fn analyze(&self, resume_text: &str, jd_text: &str) -> Result<String, AppError> {
        let prompt = SEMANTIC_ANALYSIS_PROMPT_TEMPLATE
            .replace("{plain_text_instruction}", PLAIN_TEXT_INSTRUCTION)
            .replace("{job_description}", jd_text)
            .replace("{resume}", resume_text);

        let analysis = self
            .llm
            .complete(&prompt, RECRUITER_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Semantic analysis failed: {e}")))?;

        Ok(analysis.trim().to_string())
    }

    /// Verdict is computed locally; only the suggestions text comes from the model.
    pub async fn verdict_and_suggestions(
        &self,
        score: u32,
        missing_keywords: &[String],
        semantic_analysis: &str,
    ) -> Result<Judgement, AppError> {
        let verdict = Verdict::from_score(score);
        let prompt = build_suggestions_prompt(score, missing_keywords, semantic_analysis, verdict);

        let suggestions = self
            .llm
            .complete(&prompt, RECRUITER_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Suggestion generation failed: {e}")))?;

        Ok(Judgement {
            verdict,
            suggestions: suggestions.trim().to_string(),
        })
    }
}

fn build_suggestions_prompt(
    score: u32,
    missing_keywords: &[String],
    semantic_analysis: &str,
    verdict: Verdict,
) -> String {
    let missing = if missing_keywords.is_empty() {
        "None".to_string()
    } else {
        missing_keywords.join(", ")
    };

    SUGGESTIONS_PROMPT_TEMPLATE
        .replace("{plain_text_instruction}", PLAIN_TEXT_INSTRUCTION)
        .replace("{score}", &score.to_string())
        .replace("{missing_keywords}", &missing)
        .replace("{verdict}", verdict.as_str())
        .replace("{semantic_analysis}", semantic_analysis)
}
