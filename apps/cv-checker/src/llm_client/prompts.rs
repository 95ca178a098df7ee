// Shared prompt fragments used by every request cv-checker sends.
// Request-specific templates live in prompt/prompts.rs.

/// System message sent with every request.
pub const RECRUITER_SYSTEM: &str = "You are an experienced technical recruiter. \
    You compare candidates' CVs with job advertisements carefully and honestly. \
    You never invent qualifications that are not written in the CV.";

/// Keeps the model inside the worked example's format.
pub const FOLLOW_EXAMPLE_INSTRUCTION: &str = "\
    Please follow the example(s) above exactly as shown and do not add any extra information or details.";

/// Postings and CVs arrive in any language.
pub const TRANSLATE_INSTRUCTION: &str = "\
    If a text is not in English, translate it to English first.";
