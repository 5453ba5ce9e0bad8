// Resume parsing prompt templates.

pub const RESUME_PARSE_SYSTEM: &str = "\
You are a precise resume data extractor for a recruiting team. \
Extract only what the resume states; never guess or embellish. \
You MUST respond with valid JSON only, with no markdown fences and no explanations.";

pub const RESUME_PARSE_PROMPT: &str = r#"Analyze the following resume text and extract key information.

OUTPUT SCHEMA (return exactly these keys):
{
  "name": "string" | null,
  "title": "string" | null,
  "contact": {"phone": "string" | null, "email": "string" | null},
  "education": {"school": "string" | null, "major": "string" | null, "degree": "string" | null},
  "experienceYears": number | null,
  "experience": [
    {"company": "string", "title": "string", "startDate": "YYYY-MM or year", "endDate": "YYYY-MM, year or Present", "description": "string"}
  ],
  "skills": ["string"]
}

RULES:
- "education" is the highest level found; "degree" keeps the resume's wording (e.g. 本科, 硕士, Bachelor).
- "experienceYears" is the total years of professional experience, a whole number.
- "skills" lists technical skills, tools and programming languages only.
- Use null for missing string/object fields and [] for missing arrays.

{untrusted_note}

Resume Text:
---
{resume_text}
---"#;
