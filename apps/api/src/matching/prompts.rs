// LLM-assisted match scoring prompt templates.

pub const MATCH_ASSESS_SYSTEM: &str = "\
You are an experienced technical recruiter assessing how well one candidate fits one job. \
Judge only from the job description and the candidate record you are given. \
You MUST respond with valid JSON only, with no markdown fences and no explanations.";

pub const MATCH_ASSESS_PROMPT: &str = r#"Assess the candidate against the job description.

OUTPUT SCHEMA (return exactly these keys):
{
  "skillsScore": integer 0-100,
  "experienceScore": integer 0-100,
  "educationScore": integer 0-100,
  "matchedSkills": ["string"],
  "analysis": "string"
}

RULES:
- "matchedSkills" may only contain entries copied verbatim from the candidate's "skills".
- Score 70 for experience or education when the job states no requirement for it.
- "analysis" is one or two sentences in English naming the candidate.

{untrusted_note}

Job Description:
---
{job_description}
---

Candidate:
---
{candidate_json}
---"#;
