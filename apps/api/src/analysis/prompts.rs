// All LLM prompt constants for the Analysis module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Semantic alignment prompt. Replace `{job_description}`, `{resume}` and
/// `{plain_text_instruction}` before sending.
pub const SEMANTIC_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following resume and job description. Provide a brief, one-paragraph analysis
on how well the resume aligns with the job requirements.

JOB DESCRIPTION:
{job_description}

RESUME:
{resume}

{plain_text_instruction}

ANALYSIS:"#;

/// Suggestions prompt. Replace `{score}`, `{missing_keywords}`,
/// `{semantic_analysis}`, `{verdict}` and `{plain_text_instruction}` before sending.
pub const SUGGESTIONS_PROMPT_TEMPLATE: &str = r#"Given the following analysis of a resume against a job description:
- Overall Relevance Score: {score}/100
- Missing Keywords: {missing_keywords}
- Semantic Analysis: "{semantic_analysis}"
- Verdict Category: {verdict} suitability

Please provide concise, actionable suggestions for the candidate to improve their resume for this specific job.
Focus on what they should add or highlight. Frame the suggestions positively.

{plain_text_instruction}

SUGGESTIONS:"#;
