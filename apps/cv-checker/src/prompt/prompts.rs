// Prompt templates for the comparison and job-digest requests.
// Placeholders in `{braces}` are replaced before sending.

/// Comparison instructions. Asks for attribute extraction, a similarity
/// judgment and a rationale, in prose.
pub const COMPARISON_INSTRUCTIONS: &str = "\
Compare the CV below with the job description below.

1. Extract the attributes of the CV that are relevant to this job: skills, experience, education, languages and certifications.
2. Judge how similar the CV is to the job and report it as:
   The Semantic Similarity Percentage: <value>%
   Similar keywords: the keywords that appear in both the job description and the CV, one per line.
   Different keywords: only the keywords that are in the job description but not in the CV, one per line.
   The Similarity percentage between the similar and different keywords: <value>%
3. Finish with a short rationale (two to four sentences) explaining the judgment.";

/// Comparison payload. Replace `{job_text}` and `{resume_text}`.
pub const COMPARISON_PAYLOAD_TEMPLATE: &str = "\
Job Description:
{job_text}

CV:
{resume_text}";

/// Digest instructions: pull responsibilities and requirements out of a raw posting.
pub const DIGEST_INSTRUCTIONS: &str = "\
Parse the Responsibilities and Requirements from the job posting below. \
Ignore navigation text, cookie banners, company marketing and similar jobs. \
Answer with a 'Responsibilities:' list followed by a 'Requirements:' list, one '- ' bullet per item.";

/// Digest payload. Replace `{posting_text}`.
pub const DIGEST_PAYLOAD_TEMPLATE: &str = "\
Job posting:
{posting_text}";

/// One worked comparison example. Replace `{index}`, `{job_excerpt}`,
/// `{resume_excerpt}` and `{verdict_text}`.
pub const COMPARISON_EXAMPLE_TEMPLATE: &str = "\
Example {index}:

Job Description:
{job_excerpt}

CV:
{resume_excerpt}

Output:
{verdict_text}";

/// One worked digest example. Replace `{index}`, `{posting_excerpt}` and `{digest_text}`.
pub const DIGEST_EXAMPLE_TEMPLATE: &str = "\
Example {index}:

Job posting:
{posting_excerpt}

Output:
{digest_text}";
