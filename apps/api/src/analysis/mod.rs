// Resume analysis: normalization, the three comparison strategies,
// aggregation and the staged pipeline that drives them.
// Model and embedding calls go through the llm_client traits only.

pub mod aggregator;
pub mod batch;
pub mod embedding_scorer;
pub mod handlers;
pub mod keyword_matcher;
pub mod normalizer;
pub mod pipeline;
pub mod prompts;
pub mod semantic_judge;
pub mod verdict;

#[cfg(test)]
pub mod testing;
