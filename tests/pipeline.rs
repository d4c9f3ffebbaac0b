use std::cell::RefCell;
use std::path::{Path, PathBuf};

use cv_docx::model::{Block, Document, Paragraph, ParagraphStyle, Run};
use cv_docx::{ConvertOptions, Error, ResumeRecord, TextModel, docx};

/// Stands in for the Gemini client: records prompts, replays one answer.
struct CannedModel {
    answer: String,
    prompts: RefCell<Vec<String>>,
}

impl CannedModel {
    fn new(answer: &str) -> Self {
        CannedModel { answer: answer.to_string(), prompts: RefCell::new(Vec::new()) }
    }
}

impl TextModel for CannedModel {
    fn complete(&self, prompt: &str) -> Result<String, Error> {
        self.prompts.borrow_mut().push(prompt.to_string());
        Ok(self.answer.clone())
    }
}

const ANSWER: &str = "Here is the CV:\n```json\n{\"name\":\"Jane D.\",\"role\":\"QA Engineer\",\"sections\":[{\"title\":\"Skills\",\"type\":\"bullets\",\"items\":[{\"label\":\"QA\",\"value\":\"Selenium\"}]}]}\n```\n";

/// Write a small DOCX résumé to use as input.
fn write_cv_docx(dir: &Path, lines: &[&str]) -> PathBuf {
    let mut doc = Document::default();
    for line in lines {
        doc.blocks.push(Block::Paragraph(
            Paragraph::new(ParagraphStyle::Normal).with_run(Run::new(*line, 11.0)),
        ));
    }
    let path = dir.join("cv.docx");
    docx::write(&doc, std::fs::File::create(&path).unwrap()).unwrap();
    path
}

#[test]
fn docx_input_goes_through_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_cv_docx(dir.path(), &["Jane Doe", "QA Engineer", "Skills: Selenium"]);
    let output = dir.path().join("out.docx");
    let model = CannedModel::new(ANSWER);

    let record = cv_docx::convert(&input, &output, &ConvertOptions::default(), Some(&model)).unwrap();

    assert_eq!(record.name, "Jane D.");
    let prompts = model.prompts.borrow();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].ends_with("Jane Doe\nQA Engineer\nSkills: Selenium"));

    let doc = docx::parse(&output).unwrap();
    let texts: Vec<String> = doc.paragraphs().map(Paragraph::text).collect();
    assert!(texts.contains(&"Jane D.".to_string()));
    assert!(texts.contains(&"SKILLS".to_string()));
    assert!(texts.contains(&"QA: Selenium".to_string()));
}

#[test]
fn answer_without_json_block_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_cv_docx(dir.path(), &["Jane Doe"]);
    let output = dir.path().join("out.docx");
    let model = CannedModel::new("I could not parse this CV, sorry.");

    let err = cv_docx::convert(&input, &output, &ConvertOptions::default(), Some(&model)).unwrap_err();

    assert!(matches!(err, Error::NoJsonBlock), "got {err}");
    assert!(err.is_extraction_failure());
    assert!(!output.exists());
}

#[test]
fn unparseable_json_block_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_cv_docx(dir.path(), &["Jane Doe"]);
    let output = dir.path().join("out.docx");
    let model = CannedModel::new("```json\n[1, 2, 3\n```");

    let err = cv_docx::convert(&input, &output, &ConvertOptions::default(), Some(&model)).unwrap_err();
    assert!(matches!(err, Error::Json(_)), "got {err}");
    assert!(!output.exists());
}

#[test]
fn document_input_needs_a_model() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_cv_docx(dir.path(), &["Jane Doe"]);
    let err = cv_docx::record_from_input(&input, None).unwrap_err();
    assert!(matches!(err, Error::NoModel));
}

#[test]
fn json_input_skips_the_model() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("record.json");
    std::fs::write(&input, r#"{"name":"Ana I.","sections":[{"title":"x","type":"list","items":["a"]}]}"#).unwrap();
    let output = dir.path().join("out.docx");

    let record = cv_docx::convert(&input, &output, &ConvertOptions::default(), None).unwrap();
    assert_eq!(record.name, "Ana I.");
    assert!(output.is_file());
}

#[test]
fn saved_record_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_cv_docx(dir.path(), &["Jane Doe"]);
    let output = dir.path().join("out.docx");
    let saved = dir.path().join("record.json");
    let options = ConvertOptions { photo: None, save_record: Some(saved.clone()) };

    let record = cv_docx::convert(&input, &output, &options, Some(&CannedModel::new(ANSWER))).unwrap();

    let reloaded = cv_docx::load_record(&saved).unwrap();
    assert_eq!(reloaded, record);
    assert_eq!(
        cv_docx::render_to_bytes(&reloaded, None).unwrap(),
        std::fs::read(&output).unwrap()
    );
}

#[test]
fn output_is_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.docx");
    std::fs::write(&output, b"stale").unwrap();

    let record = ResumeRecord::from_json(r#"{"name":"Ana I."}"#).unwrap();
    cv_docx::render_to_file(&record, None, &output).unwrap();

    let doc = docx::parse(&output).unwrap();
    assert_eq!(doc.paragraphs().next().map(Paragraph::text).as_deref(), Some("Ana I."));
}

#[test]
fn docx_text_is_one_line_per_paragraph() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_cv_docx(dir.path(), &["Jane Doe", "Tester"]);
    assert_eq!(cv_docx::text::extract_text(&input).unwrap(), "Jane Doe\nTester");
}

#[test]
fn blank_document_has_no_text() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_cv_docx(dir.path(), &["   ", ""]);
    assert!(matches!(cv_docx::text::extract_text(&input), Err(Error::EmptyText)));
}

#[test]
fn unsupported_extension_is_rejected() {
    let err = cv_docx::text::extract_text(Path::new("cv.odt")).unwrap_err();
    assert!(matches!(err, Error::UnsupportedInput(_)));
    assert!(err.is_extraction_failure());
}

#[test]
fn corrupt_docx_input_is_an_extraction_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("cv.docx");
    std::fs::write(&input, b"this is not a zip archive").unwrap();
    let output = dir.path().join("out.docx");

    let err = cv_docx::convert(&input, &output, &ConvertOptions::default(), Some(&CannedModel::new(ANSWER)))
        .unwrap_err();

    assert!(matches!(err, Error::Unreadable(_)), "got {err}");
    assert!(err.is_extraction_failure());
    assert!(!output.exists());
}

#[test]
fn missing_record_file_is_an_extraction_failure() {
    let dir = tempfile::tempdir().unwrap();
    let err = cv_docx::load_record(&dir.path().join("gone.json")).unwrap_err();
    assert!(matches!(err, Error::Unreadable(_)), "got {err}");
    assert!(err.is_extraction_failure());
}
