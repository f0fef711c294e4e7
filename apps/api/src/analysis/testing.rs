//! Stub capabilities shared by the analysis tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::AppError;
use crate::extraction::{DocumentFormat, TextExtractor};
use crate::llm_client::{Embedder, LanguageModel, LlmError};

/// Returns a fixed vector per known text and a zero vector otherwise.
pub struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dimensions: usize,
    pub calls: AtomicUsize,
}

impl FixedEmbedder {
    pub fn new(entries: Vec<(&str, Vec<f32>)>) -> Self {
        let dimensions = entries.first().map(|(_, v)| v.len()).unwrap_or(2);
        Self {
            vectors: entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            dimensions,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Embedder for FixedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts
            .iter()
            .map(|t| {
                self.vectors
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| vec![0.0; self.dimensions])
            })
            .collect())
    }
}

/// Always fails, simulating a quota or transport error.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        Err(LlmError::Api {
            status: 429,
            message: "quota exhausted".to_string(),
        })
    }
}

/// Returns fewer vectors than requested.
pub struct ShortEmbedder;

#[async_trait]
impl Embedder for ShortEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        Ok(texts.iter().skip(1).map(|_| vec![1.0, 0.0]).collect())
    }
}

/// Answers every prompt with the same text and records the prompts it saw.
pub struct StubLlm {
    reply: String,
    pub prompts: Mutex<Vec<String>>,
}

impl StubLlm {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for StubLlm {
    async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

pub struct FailingLlm;

#[async_trait]
impl LanguageModel for FailingLlm {
    async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
        Err(LlmError::EmptyContent)
    }
}

/// Sleeps on every call and tracks the peak number of overlapping calls.
pub struct SlowLlm {
    delay: Duration,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

impl SlowLlm {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LanguageModel for SlowLlm {
    async fn complete(&self, _prompt: &str, _system: &str) -> Result<String, LlmError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok("Solid overlap with the role.".to_string())
    }
}

/// Treats the bytes as UTF-8 regardless of the declared format.
pub struct Utf8Extractor;

#[async_trait]
impl TextExtractor for Utf8Extractor {
    async fn extract(&self, bytes: Bytes, _format: DocumentFormat) -> Result<String, AppError> {
        String::from_utf8(bytes.to_vec()).map_err(|e| AppError::Extraction(e.to_string()))
    }
}

pub fn tokens(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}
