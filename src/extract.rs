//! Turning résumé text into a [`ResumeRecord`] with a language model.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::Error;
use crate::gemini::TextModel;
use crate::schema::ResumeRecord;

/// Instructions sent ahead of the résumé text. The model must answer with a
/// single fenced JSON block following this schema.
pub const EXTRACTION_PROMPT: &str = r#"You are an expert CV (curriculum vitae) parser. Read the raw CV text below and extract its content into one JSON object. Answer with that JSON object inside a ```json fenced block and nothing else: no explanations and no text outside the block.

## Schema

Top-level object keys:
- "name": (string) the candidate's name reduced to first name and last initial, e.g. "Denisa Zega" becomes "Denisa Z.".
- "role": (string) the candidate's main job title.
- "about": (string) the professional summary or "About me" text.
- "sections": (array) one object per CV section, in the order they appear.

Every section object has:
- "title": (string) the section heading in upper case, e.g. "TECHNICAL SKILLS".
- "type": (string) one of "bullets", "experience", "text", "list".

Content by type:

"experience" (work history): a "positions" array. Each position has
- "role": (string) job title,
- "dates": (string) employment period, e.g. "01/2025 - Present",
- "details": (array of strings) responsibilities and achievements, one per bullet,
- "technologies": (optional string) comma-separated technologies, tools or frameworks mentioned in that position's details.

"bullets" (categorised skills): an "items" array of {"label": category name, "value": comma-separated skills}.

"text" (education, languages): an "items" array of {"value": main line, "sub": optional secondary line such as degree and years}.

"list" (certifications, projects): an "items" array of strings, one per bullet.

## Rules

- Map headings to types: skills -> "bullets", experience -> "experience", education -> "text", certifications -> "list".
- Copy technology names into "technologies" without removing them from "details".
- Keep all text verbatim. Do not summarise, shorten or omit anything.
- If a section has no clear heading, infer its purpose from its content.

## Example

Input:
```text
Denisa Zega
Power Platform Developer

About Me
Experienced Power Platform developer building canvas and model-driven apps.

Technical Skills
- Backend: Power Apps, Power Automate, UiPath
- Methodologies: Agile, Scrum

Work Experience
RPA Developer
01/2025 - Present
- Integrated AI Builder to automate document processing.

Education
Business Computer Science - Babes-Bolyai University
Bachelor's Degree | 2016 - 2019

Certifications
- UiPath Certified Professional
```

Output:
```json
{
  "name": "Denisa Z.",
  "role": "Power Platform Developer",
  "about": "Experienced Power Platform developer building canvas and model-driven apps.",
  "sections": [
    {"title": "TECHNICAL SKILLS", "type": "bullets", "items": [
      {"label": "Backend", "value": "Power Apps, Power Automate, UiPath"},
      {"label": "Methodologies", "value": "Agile, Scrum"}
    ]},
    {"title": "WORK EXPERIENCE", "type": "experience", "positions": [
      {"role": "RPA Developer", "dates": "01/2025 - Present",
       "details": ["Integrated AI Builder to automate document processing."],
       "technologies": "AI Builder"}
    ]},
    {"title": "EDUCATION", "type": "text", "items": [
      {"value": "Business Computer Science - Babes-Bolyai University", "sub": "Bachelor's Degree | 2016 - 2019"}
    ]},
    {"title": "CERTIFICATIONS", "type": "list", "items": ["UiPath Certified Professional"]}
  ]
}
```

Now process the following CV.

Text:
"#;

pub fn build_prompt(cv_text: &str) -> String {
    let mut prompt = String::with_capacity(EXTRACTION_PROMPT.len() + cv_text.len());
    prompt.push_str(EXTRACTION_PROMPT);
    prompt.push_str(cv_text);
    prompt
}

fn json_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```json[ \t]*\r?\n(.*)\r?\n[ \t]*```").expect("valid regex"))
}

/// Parse the record out of a model answer. Exactly one attempt: the fenced
/// JSON block is located and parsed, nothing is repaired.
pub fn parse_response(response: &str) -> Result<ResumeRecord, Error> {
    let json = json_block()
        .captures(response)
        .and_then(|c| c.get(1))
        .ok_or(Error::NoJsonBlock)?;
    ResumeRecord::from_json(json.as_str())
}

/// Ask `model` to structure `cv_text` into a résumé record.
pub fn extract_record(model: &dyn TextModel, cv_text: &str) -> Result<ResumeRecord, Error> {
    let response = model.complete(&build_prompt(cv_text))?;
    let record = parse_response(&response).inspect_err(|e| {
        log::warn!("could not read a résumé record from the model answer: {e}");
    })?;
    log::info!("extracted record for {:?} with {} sections", record.name, record.sections.len());
    Ok(record)
}
