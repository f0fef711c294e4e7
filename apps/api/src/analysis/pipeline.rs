//! Analysis pipeline — one typed state threaded through a fixed stage list.
//!
//! Flow: extract_text → normalize_texts → run_comparisons → aggregate_results.
//!
//! Two drivers consume `Stage::ALL` through `Analyzer::advance`:
//! - `run` blocks until the final response or the first error.
//! - `stream` yields a `StageComplete` event after every stage and exactly one
//!   `FinalResult` (or one error) at the end.

use std::sync::Arc;

use anyhow::anyhow;
use async_stream::stream;
use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::analysis::aggregator::{aggregate, Aggregate, ScoringWeights};
use crate::analysis::embedding_scorer::EmbeddingScorer;
use crate::analysis::keyword_matcher::{KeywordMatchResult, KeywordMatcher};
use crate::analysis::normalizer::Normalizer;
use crate::analysis::semantic_judge::SemanticJudge;
use crate::analysis::verdict::Verdict;
use crate::errors::AppError;
use crate::extraction::{DocumentFormat, TextExtractor};
use crate::llm_client::{Embedder, LanguageModel};

// ────────────────────────────────────────────────────────────────────────────
// Inputs and outputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub file_bytes: Bytes,
    pub file_format: DocumentFormat,
    pub job_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub relevance_score: u32,
    pub missing_keywords: Vec<String>,
    pub verdict: Verdict,
    pub suggestions: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PipelineEvent {
    StageComplete { stage: Stage, progress: Vec<String> },
    FinalResult { result: AnalysisResponse },
}

// ────────────────────────────────────────────────────────────────────────────
// Stages
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Start,
    TextExtracted,
    Normalized,
    Compared,
    Aggregated,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ExtractText,
    NormalizeTexts,
    RunComparisons,
    AggregateResults,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::ExtractText,
        Stage::NormalizeTexts,
        Stage::RunComparisons,
        Stage::AggregateResults,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::ExtractText => "extract_text",
            Stage::NormalizeTexts => "normalize_texts",
            Stage::RunComparisons => "run_comparisons",
            Stage::AggregateResults => "aggregate_results",
        }
    }

    /// Progress marker appended once the stage completes.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::ExtractText => "Text Extracted",
            Stage::NormalizeTexts => "Texts Normalized",
            Stage::RunComparisons => "Comparisons Complete",
            Stage::AggregateResults => "Aggregation Complete",
        }
    }

    fn completes(&self) -> Phase {
        match self {
            Stage::ExtractText => Phase::TextExtracted,
            Stage::NormalizeTexts => Phase::Normalized,
            Stage::RunComparisons => Phase::Compared,
            Stage::AggregateResults => Phase::Aggregated,
        }
    }
}

/// What a single stage produced.
#[derive(Debug, Clone)]
pub enum StageOutput {
    TextExtracted {
        resume_text: String,
    },
    Normalized {
        resume_tokens: Vec<String>,
        jd_tokens: Vec<String>,
    },
    Compared {
        keyword_match: KeywordMatchResult,
        semantic_analysis: String,
        embedding_score: u32,
    },
    Aggregated(Aggregate),
}

// ────────────────────────────────────────────────────────────────────────────
// State
// ────────────────────────────────────────────────────────────────────────────

/// Owned by exactly one run. Stage fields only ever go from `None` to `Some`.
#[derive(Debug, Clone)]
pub struct PipelineState {
    file_bytes: Bytes,
    file_format: DocumentFormat,
    job_description: String,
    phase: Phase,
    resume_text: Option<String>,
    resume_tokens: Option<Vec<String>>,
    jd_tokens: Option<Vec<String>>,
    keyword_match: Option<KeywordMatchResult>,
    semantic_analysis: Option<String>,
    embedding_score: Option<u32>,
    final_score: Option<u32>,
    verdict: Option<Verdict>,
    suggestions: Option<String>,
    progress: Vec<String>,
}

impl PipelineState {
    pub fn new(input: AnalysisInput) -> Self {
        Self {
            file_bytes: input.file_bytes,
            file_format: input.file_format,
            job_description: input.job_description,
            phase: Phase::Start,
            resume_text: None,
            resume_tokens: None,
            jd_tokens: None,
            keyword_match: None,
            semantic_analysis: None,
            embedding_score: None,
            final_score: None,
            verdict: None,
            suggestions: None,
            progress: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress(&self) -> &[String] {
        &self.progress
    }

    fn apply(&mut self, stage: Stage, output: StageOutput) {
        match output {
            StageOutput::TextExtracted { resume_text } => {
                self.resume_text = Some(resume_text);
            }
            StageOutput::Normalized {
                resume_tokens,
                jd_tokens,
            } => {
                self.resume_tokens = Some(resume_tokens);
                self.jd_tokens = Some(jd_tokens);
            }
            StageOutput::Compared {
                keyword_match,
                semantic_analysis,
                embedding_score,
            } => {
                self.keyword_match = Some(keyword_match);
                self.semantic_analysis = Some(semantic_analysis);
                self.embedding_score = Some(embedding_score);
            }
            StageOutput::Aggregated(result) => {
                self.final_score = Some(result.final_score);
                self.verdict = Some(result.verdict);
                self.suggestions = Some(result.suggestions);
            }
        }
        self.phase = stage.completes();
        self.progress.push(stage.label().to_string());
    }

    fn finish(&mut self) -> Result<AnalysisResponse, AppError> {
        let response = AnalysisResponse {
            relevance_score: *require(&self.final_score, "final_score")?,
            missing_keywords: require(&self.keyword_match, "keyword_match")?
                .missing_keywords
                .clone(),
            verdict: *require(&self.verdict, "verdict")?,
            suggestions: require(&self.suggestions, "suggestions")?.clone(),
        };
        self.phase = Phase::Done;
        Ok(response)
    }
}

fn require<'a, T>(field: &'a Option<T>, name: &str) -> Result<&'a T, AppError> {
    field
        .as_ref()
        .ok_or_else(|| AppError::Internal(anyhow!("pipeline field `{name}` read before it was produced")))
}

// ────────────────────────────────────────────────────────────────────────────
// Analyzer
// ────────────────────────────────────────────────────────────────────────────

/// Pipelines allowed in flight at once when no ceiling is configured.
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

pub struct Analyzer {
    extractor: Arc<dyn TextExtractor>,
    normalizer: Normalizer,
    keyword_matcher: KeywordMatcher,
    judge: SemanticJudge,
    embedding_scorer: EmbeddingScorer,
    weights: ScoringWeights,
    // Shared by every run, stream and batch entry, not by a single request.
    permits: Arc<Semaphore>,
}

impl Analyzer {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        llm: Arc<dyn LanguageModel>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            extractor,
            normalizer: Normalizer::new(),
            keyword_matcher: KeywordMatcher::default(),
            judge: SemanticJudge::new(llm),
            embedding_scorer: EmbeddingScorer::new(embedder),
            weights: ScoringWeights::default(),
            permits: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT)),
        }
    }

    pub fn with_keyword_matcher(mut self, keyword_matcher: KeywordMatcher) -> Self {
        self.keyword_matcher = keyword_matcher;
        self
    }

    pub fn with_penalty_exponent(mut self, exponent: i32) -> Self {
        self.embedding_scorer = self.embedding_scorer.with_penalty_exponent(exponent);
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Caps how many pipelines this analyzer runs at once, across all callers.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.permits = Arc::new(Semaphore::new(max_concurrent.max(1)));
        self
    }

    /// Runs every stage and returns the final response, aborting on the first error.
    pub async fn run(&self, input: AnalysisInput) -> Result<AnalysisResponse, AppError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        let mut state = PipelineState::new(input);
        for stage in Stage::ALL {
            self.advance(stage, &mut state).await?;
        }
        state.finish()
    }

    /// Same stages as `run`, surfaced as events while they complete.
    pub fn stream(
        self: Arc<Self>,
        input: AnalysisInput,
    ) -> impl Stream<Item = Result<PipelineEvent, AppError>> + Send + 'static {
        let analyzer = self;
        stream! {
            let _permit = match analyzer.permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    yield Err(AppError::Internal(e.into()));
                    return;
                }
            };
            let mut state = PipelineState::new(input);
            for stage in Stage::ALL {
                if let Err(e) = analyzer.advance(stage, &mut state).await {
                    yield Err(e);
                    return;
                }
                yield Ok(PipelineEvent::StageComplete {
                    stage,
                    progress: state.progress().to_vec(),
                });
            }
            match state.finish() {
                Ok(result) => yield Ok(PipelineEvent::FinalResult { result }),
                Err(e) => yield Err(e),
            }
        }
    }

    async fn advance(&self, stage: Stage, state: &mut PipelineState) -> Result<(), AppError> {
        info!("Pipeline stage {} starting", stage.name());
        let output = self.execute(stage, state).await?;
        state.apply(stage, output);
        info!("Pipeline stage {} complete ({:?})", stage.name(), state.phase());
        Ok(())
    }

    async fn execute(&self, stage: Stage, state: &PipelineState) -> Result<StageOutput, AppError> {
        match stage {
            Stage::ExtractText => {
                let resume_text = self
                    .extractor
                    .extract(state.file_bytes.clone(), state.file_format)
                    .await?;
                debug!("Extracted {} chars from {} upload", resume_text.len(), state.file_format);
                Ok(StageOutput::TextExtracted { resume_text })
            }
            Stage::NormalizeTexts => {
                let resume_text = require(&state.resume_text, "resume_text")?;
                Ok(StageOutput::Normalized {
                    resume_tokens: self.normalizer.normalize(resume_text),
                    jd_tokens: self.normalizer.normalize(&state.job_description),
                })
            }
            Stage::RunComparisons => {
                let resume_text = require(&state.resume_text, "resume_text")?;
                let resume_tokens = require(&state.resume_tokens, "resume_tokens")?;
                let jd_tokens = require(&state.jd_tokens, "jd_tokens")?;

                // Keyword matching works on tokens; the judge sees the original wording.
                let keyword_match = self.keyword_matcher.match_keywords(resume_tokens, jd_tokens);
                let semantic_analysis = self.judge.analyze(resume_text, &state.job_description).await?;
                let embedding_score = self.embedding_scorer.score(resume_tokens, jd_tokens).await;

                info!(
                    "Comparisons: keyword={:.1} embedding={} missing={}",
                    keyword_match.score,
                    embedding_score,
                    keyword_match.missing_keywords.len()
                );

                Ok(StageOutput::Compared {
                    keyword_match,
                    semantic_analysis,
                    embedding_score,
                })
            }
            Stage::AggregateResults => {
                let keyword_match = require(&state.keyword_match, "keyword_match")?;
                let result = aggregate(
                    &self.judge,
                    &self.weights,
                    *require(&state.embedding_score, "embedding_score")?,
                    keyword_match.score,
                    require(&state.semantic_analysis, "semantic_analysis")?,
                    &keyword_match.missing_keywords,
                )
                .await?;
                Ok(StageOutput::Aggregated(result))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testing::{FailingLlm, FixedEmbedder, SlowLlm, StubLlm, Utf8Extractor};
    use futures::StreamExt;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn analyzer(llm: Arc<dyn LanguageModel>) -> Analyzer {
        let embedder = Arc::new(FixedEmbedder::new(vec![
            ("python", vec![1.0, 0.0]),
            ("sql", vec![0.0, 1.0]),
        ]));
        Analyzer::new(Arc::new(Utf8Extractor), llm, embedder)
            .with_keyword_matcher(KeywordMatcher::default().with_similarity(exact))
    }

    fn exact(a: &str, b: &str) -> f64 {
        if a == b {
            100.0
        } else {
            0.0
        }
    }

    fn input(resume: &str, jd: &str) -> AnalysisInput {
        AnalysisInput {
            file_bytes: Bytes::from(resume.to_string()),
            file_format: DocumentFormat::Txt,
            job_description: jd.to_string(),
        }
    }

    #[test]
    fn test_stage_list_is_ordered() {
        let names: Vec<_> = Stage::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            ["extract_text", "normalize_texts", "run_comparisons", "aggregate_results"]
        );
    }

    #[test]
    fn test_reading_unproduced_field_is_internal_error() {
        let mut state = PipelineState::new(input("python", "python"));
        let err = state.finish().unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(state.phase(), Phase::Start);
    }

    #[tokio::test]
    async fn test_run_end_to_end() {
        let llm = Arc::new(StubLlm::new("Add Docker and FastAPI experience."));
        let response = analyzer(llm.clone())
            .run(input(
                "Python and SQL",
                "python fastapi sql docker communication",
            ))
            .await
            .unwrap();

        // keyword 40.0, embedding 40 (python & sql at 1.0, rest unmatched) → 40
        assert_eq!(response.missing_keywords, ["communication", "docker", "fastapi"]);
        assert_eq!(response.relevance_score, 40);
        assert_eq!(response.verdict, Verdict::Low);
        assert_eq!(response.suggestions, "Add Docker and FastAPI experience.");

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Python and SQL"));
        assert!(prompts[1].contains("40/100"));
    }

    #[tokio::test]
    async fn test_extraction_error_aborts_before_model_calls() {
        let llm = Arc::new(StubLlm::new("unused"));
        let bad = AnalysisInput {
            file_bytes: Bytes::from_static(&[0xff, 0xfe, 0xfd]),
            file_format: DocumentFormat::Txt,
            job_description: "python".to_string(),
        };
        let err = analyzer(llm.clone()).run(bad).await.unwrap_err();
        assert!(matches!(err, AppError::Extraction(_)));
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_judge_failure_aborts_run() {
        let err = analyzer(Arc::new(FailingLlm))
            .run(input("python", "python"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[tokio::test]
    async fn test_stream_emits_each_stage_then_one_result() {
        let analyzer = Arc::new(analyzer(Arc::new(StubLlm::new("Looks good."))));
        let events: Vec<_> = analyzer
            .stream(input("python sql", "python sql"))
            .collect()
            .await;

        assert_eq!(events.len(), 5);
        for (i, stage) in Stage::ALL.iter().enumerate() {
            match &events[i] {
                Ok(PipelineEvent::StageComplete { stage: s, progress }) => {
                    assert_eq!(s, stage);
                    assert_eq!(progress.len(), i + 1);
                    assert_eq!(progress[i], stage.label());
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        let finals = events
            .iter()
            .filter(|e| matches!(e, Ok(PipelineEvent::FinalResult { .. })))
            .count();
        assert_eq!(finals, 1);
        match &events[4] {
            Ok(PipelineEvent::FinalResult { result }) => {
                assert_eq!(result.relevance_score, 100);
                assert_eq!(result.verdict, Verdict::High);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stream_yields_single_error_and_ends() {
        let analyzer = Arc::new(analyzer(Arc::new(FailingLlm)));
        let events: Vec<_> = analyzer.stream(input("python", "python")).collect().await;

        assert_eq!(events.len(), 3);
        assert!(events[..2].iter().all(|e| e.is_ok()));
        assert!(matches!(events[2], Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_run_and_stream_share_one_ceiling() {
        let llm = Arc::new(SlowLlm::new(Duration::from_millis(20)));
        let embedder = Arc::new(FixedEmbedder::new(vec![("python", vec![1.0, 0.0])]));
        let analyzer = Arc::new(
            Analyzer::new(Arc::new(Utf8Extractor), llm.clone(), embedder).with_max_concurrent(1),
        );

        let (first, second, streamed) = tokio::join!(
            analyzer.run(input("python", "python")),
            analyzer.run(input("python", "python")),
            analyzer
                .clone()
                .stream(input("python", "python"))
                .collect::<Vec<_>>(),
        );

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert!(streamed.iter().all(|e| e.is_ok()));
        assert_eq!(llm.peak.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = PipelineEvent::StageComplete {
            stage: Stage::NormalizeTexts,
            progress: vec!["Text Extracted".into(), "Texts Normalized".into()],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "stage_complete");
        assert_eq!(json["stage"], "normalize_texts");
    }
}
