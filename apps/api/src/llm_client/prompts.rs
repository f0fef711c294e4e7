// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments.

/// System prompt shared by every resume-review call.
pub const RECRUITER_SYSTEM: &str = "You are an experienced technical recruiter \
    reviewing resumes against job descriptions. \
    Be specific and concrete. \
    Base every statement on the provided resume and job description only. \
    Do NOT invent experience the candidate has not listed.";

/// Instruction appended to prompts whose output is shown directly to candidates.
pub const PLAIN_TEXT_INSTRUCTION: &str = "\
    Respond in plain prose. Do NOT wrap the answer in JSON or code fences.";
