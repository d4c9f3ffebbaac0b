use std::io::Cursor;
use std::path::Path;

use cv_docx::model::{Alignment, Block, Document, Paragraph};
use cv_docx::render::render_section;
use cv_docx::schema::Section;
use cv_docx::{ResumeRecord, docx};

const HEADING_COLOR: [u8; 3] = [0, 112, 192];
const MUTED: [u8; 3] = [89, 89, 89];
const DIVIDER_FILL: [u8; 3] = [0xD9, 0xD9, 0xD9];

fn record(json: &str) -> ResumeRecord {
    ResumeRecord::from_json(json).expect("test record parses")
}

/// Render to DOCX bytes and read the package back.
fn render(record: &ResumeRecord, photo: Option<&Path>) -> Document {
    let bytes = cv_docx::render_to_bytes(record, photo).expect("render succeeds");
    docx::read(Cursor::new(bytes)).expect("generated DOCX reads back")
}

fn body(doc: &Document) -> Vec<Paragraph> {
    doc.body_paragraphs().cloned().collect()
}

fn is_heading(p: &Paragraph) -> bool {
    p.runs.len() == 1 && p.runs[0].bold && p.runs[0].color == Some(HEADING_COLOR)
}

fn headings(doc: &Document) -> Vec<String> {
    doc.body_paragraphs()
        .filter(|p| is_heading(p))
        .map(Paragraph::text)
        .collect()
}

/// Body paragraphs following the heading `title`, up to the next heading.
fn section_body(doc: &Document, title: &str) -> Vec<Paragraph> {
    body(doc)
        .into_iter()
        .skip_while(|p| !(is_heading(p) && p.text() == title))
        .skip(1)
        .take_while(|p| !is_heading(p))
        .collect()
}

fn write_photo(dir: &Path, width: u32, height: u32) -> std::path::PathBuf {
    let path = dir.join("profile.png");
    image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]))
        .save(&path)
        .unwrap();
    path
}

const FULL_RECORD: &str = r#"{
  "name": "Denisa Z.",
  "role": "Power Platform Developer",
  "about": "Builds canvas and model-driven apps.",
  "sections": [
    {"title": "Technical Skills", "type": "bullets", "items": [
      {"label": "Backend", "value": "Power Apps, UiPath"},
      {"label": "Frontend", "value": "Javascript"},
      {"value": "Agile"}
    ]},
    {"title": "WORK EXPERIENCE", "type": "experience", "positions": [
      {"role": "RPA Developer", "dates": "01/2025 - Present",
       "details": ["Designed apps.", "Integrated AI Builder.", "Managed clients.", "Tested flows."],
       "technologies": "AI Builder"},
      {"role": "Intern", "details": ["Learned things."]}
    ]},
    {"title": "EDUCATION", "type": "text", "items": [
      {"value": "Business Computer Science", "sub": "Bachelor's Degree | 2016 - 2019"}
    ]},
    {"title": "CERTIFICATIONS", "type": "list", "items": ["UiPath Certified", "PL-900"]},
    {"title": "HOBBIES", "type": "gallery", "items": ["Chess", 42, {"k": "v"}]}
  ]
}"#;

#[test]
fn sections_keep_record_order() {
    let doc = render(&record(FULL_RECORD), None);
    assert_eq!(
        headings(&doc),
        ["TECHNICAL SKILLS", "WORK EXPERIENCE", "EDUCATION", "CERTIFICATIONS", "HOBBIES"]
    );
}

#[test]
fn one_bullet_per_bullets_item() {
    let doc = render(&record(FULL_RECORD), None);
    let skills = section_body(&doc, "TECHNICAL SKILLS");
    assert_eq!(skills.len(), 3);
    assert!(skills.iter().all(Paragraph::is_bullet));
    assert_eq!(skills[0].text(), "Backend: Power Apps, UiPath");
    assert!(skills[0].runs[0].bold);
    assert!(!skills[0].runs[1].bold);
    assert_eq!(skills[2].text(), "Agile");
}

#[test]
fn experience_has_role_line_then_one_bullet_per_detail() {
    let doc = render(&record(FULL_RECORD), None);
    let work = section_body(&doc, "WORK EXPERIENCE");

    // role, 4 details, technologies, role, 1 detail
    assert_eq!(work.len(), 8);
    assert_eq!(work[0].text(), "RPA Developer    01/2025 - Present");
    assert!(!work[0].is_bullet());
    assert!(work[0].runs[0].bold);
    assert!(work[0].runs[1].italic);
    assert_eq!(work[1..5].iter().filter(|p| p.is_bullet()).count(), 4);
    assert_eq!(work[5].text(), "Technologies: AI Builder");
    assert!(!work[5].is_bullet());
    assert_eq!(work[5].runs[1].color, Some(MUTED));
    assert_eq!(work[6].text(), "Intern");
    assert!(work[7].is_bullet());
}

#[test]
fn text_and_list_sections() {
    let doc = render(&record(FULL_RECORD), None);

    let education = section_body(&doc, "EDUCATION");
    assert_eq!(education.len(), 1);
    assert_eq!(education[0].text(), "Business Computer Science    Bachelor's Degree | 2016 - 2019");
    assert!(education[0].runs[0].bold);
    assert!(education[0].runs[1].italic);
    assert_eq!(education[0].runs[1].font_size, 10.0);

    let certs = section_body(&doc, "CERTIFICATIONS");
    assert_eq!(certs.iter().map(Paragraph::text).collect::<Vec<_>>(), ["UiPath Certified", "PL-900"]);
    assert!(certs.iter().all(Paragraph::is_bullet));
}

#[test]
fn unknown_kind_renders_one_plain_block_per_item() {
    let doc = render(&record(FULL_RECORD), None);
    let hobbies = section_body(&doc, "HOBBIES");
    assert_eq!(
        hobbies.iter().map(Paragraph::text).collect::<Vec<_>>(),
        ["Chess", "42", r#"{"k":"v"}"#]
    );
    assert!(hobbies.iter().all(|p| !p.is_bullet()));
}

#[test]
fn missing_about_drops_summary_and_divider_only() {
    let with_about = record(FULL_RECORD);
    let mut without_about = with_about.clone();
    without_about.about = None;

    let full = body(&render(&with_about, None));
    let bare = body(&render(&without_about, None));

    assert_eq!(full.len(), bare.len() + 2);
    assert_eq!(full[0].text(), "Builds canvas and model-driven apps.");
    assert_eq!(full[1].shading, Some(DIVIDER_FILL));
    assert!(full[1].runs.is_empty());
    assert_eq!(full[2..], bare[..]);
    assert!(bare.iter().all(|p| p.shading.is_none()));
}

#[test]
fn ana_example() {
    let rec = record(
        r#"{"name":"Ana I.","role":"Tester","about":"","sections":[{"title":"SKILLS","type":"bullets","items":[{"label":"QA","value":"Selenium, Postman"}]}]}"#,
    );
    let doc = render(&rec, None);

    let Some(Block::Table(header)) = doc.blocks.first() else {
        panic!("document should open with the header table");
    };
    let left: Vec<String> = header.rows[0][0].paragraphs.iter().map(Paragraph::text).collect();
    assert_eq!(left, ["Ana I.", "Tester"]);
    assert_eq!(header.rows[0][0].paragraphs[0].runs[0].font_size, 24.0);

    let body = body(&doc);
    assert_eq!(body.len(), 2);
    assert_eq!(body[0].text(), "SKILLS");
    assert!(is_heading(&body[0]));
    assert!(body[1].is_bullet());
    assert_eq!(body[1].text(), "QA: Selenium, Postman");
}

#[test]
fn headings_are_upper_cased() {
    let doc = render(&record(r#"{"name":"X","sections":[{"title":"Languages","type":"list","items":[]}]}"#), None);
    assert_eq!(headings(&doc), ["LANGUAGES"]);
}

#[test]
fn about_text_is_passed_through_verbatim() {
    let about = "Line one & <two>\nLine \"three\"";
    let mut rec = record(FULL_RECORD);
    rec.about = Some(about.to_string());
    let doc = render(&rec, None);
    assert_eq!(body(&doc)[0].text(), about);
}

#[test]
fn photo_is_right_aligned_in_header() {
    let dir = tempfile::tempdir().unwrap();
    let photo = write_photo(dir.path(), 40, 20);

    let doc = render(&record(FULL_RECORD), Some(photo.as_path()));
    let Some(Block::Table(header)) = doc.blocks.first() else {
        panic!("document should open with the header table");
    };
    let cell = &header.rows[0][1].paragraphs[0];
    assert_eq!(cell.alignment, Alignment::Right);
    let image = cell.image.as_ref().expect("photo embedded");
    assert_eq!((image.pixel_width, image.pixel_height), (40, 20));
    assert!((image.display_width - 108.0).abs() < 0.01);
    assert!((image.display_height - 54.0).abs() < 0.01);
}

#[test]
fn missing_photo_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let doc = render(&record(FULL_RECORD), Some(dir.path().join("nope.png").as_path()));
    assert!(doc.paragraphs().all(|p| p.image.is_none()));
}

#[test]
fn unreadable_photo_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("profile.png");
    std::fs::write(&photo, b"not a png").unwrap();
    let doc = render(&record(FULL_RECORD), Some(photo.as_path()));
    assert!(doc.paragraphs().all(|p| p.image.is_none()));
}

#[test]
fn rendering_is_deterministic() {
    let rec = record(FULL_RECORD);
    assert_eq!(
        cv_docx::render_to_bytes(&rec, None).unwrap(),
        cv_docx::render_to_bytes(&rec, None).unwrap()
    );

    let dir = tempfile::tempdir().unwrap();
    let photo = write_photo(dir.path(), 30, 30);
    assert_eq!(
        cv_docx::render_to_bytes(&rec, Some(photo.as_path())).unwrap(),
        cv_docx::render_to_bytes(&rec, Some(photo.as_path())).unwrap()
    );
}

#[test]
fn empty_record_still_renders() {
    let doc = render(&ResumeRecord::default(), None);
    assert!(matches!(doc.blocks.first(), Some(Block::Table(_))));
    assert!(headings(&doc).is_empty());
}

fn section(json: &str) -> Section {
    serde_json::from_str(json).expect("test section parses")
}

#[test]
fn dates_are_muted_italic() {
    let paras = render_section(&section(
        r#"{"title":"W","type":"experience","positions":[{"role":"Dev","dates":"2020"}]}"#,
    ));
    assert_eq!(paras.len(), 1);
    let dates = &paras[0].runs[1];
    assert_eq!(dates.text, "    2020");
    assert!(dates.italic);
    assert_eq!(dates.font_size, 10.0);
    assert_eq!(dates.color, Some(MUTED));
}

#[test]
fn text_item_without_value_keeps_sub() {
    let paras = render_section(&section(
        r#"{"title":"E","type":"text","items":[{"sub":"2016 - 2019"},{}]}"#,
    ));
    assert_eq!(paras.len(), 1);
    assert_eq!(paras[0].text(), "    2016 - 2019");
}

#[test]
fn position_without_role_keeps_dates_line() {
    let doc = render(
        &record(
            r#"{"name":"X","sections":[{"title":"WORK","type":"experience","positions":[
                {"dates":"2019 - 2020","details":["Shipped it."]},
                {"details":["Fixed it."],"technologies":"Rust"}
            ]}]}"#,
        ),
        None,
    );
    let work = section_body(&doc, "WORK");

    // dates line, 1 detail, no header, 1 detail, technologies
    assert_eq!(work.len(), 4);
    assert_eq!(work[0].text(), "    2019 - 2020");
    assert!(!work[0].is_bullet());
    assert!(work[0].runs[0].italic);
    assert!(work[1].is_bullet());
    assert_eq!(work[2].text(), "Fixed it.");
    assert!(work[2].is_bullet());
    assert_eq!(work[3].text(), "Technologies: Rust");
}

#[test]
fn malformed_entries_do_not_stop_rendering() {
    let doc = render(
        &record(
            r#"{"name":"Ana I.","role":3,"about":["not","text"],"sections":[
                null,
                {"title":"Skills","type":"bullets","items":[{"label":"QA","value":"Selenium"}]},
                "stray",
                {"title":"Certifications","type":"list","items":["PL-900"]}
            ]}"#,
        ),
        None,
    );

    let Some(Block::Table(header)) = doc.blocks.first() else {
        panic!("document should open with the header table");
    };
    let left: Vec<String> = header.rows[0][0].paragraphs.iter().map(Paragraph::text).collect();
    assert_eq!(left, ["Ana I.", "3"]);

    assert_eq!(headings(&doc), ["SKILLS", "CERTIFICATIONS"]);
    assert!(body(&doc).iter().all(|p| p.shading.is_none()));
    assert_eq!(section_body(&doc, "CERTIFICATIONS")[0].text(), "PL-900");
}

#[test]
fn characters_outside_xml_are_dropped() {
    let mut rec = record(FULL_RECORD);
    rec.about = Some("bad \u{FFFE}char\u{1} & <ok>".to_string());
    rec.name = "Ana\u{FFFF} I.".to_string();

    let doc = render(&rec, None);
    assert_eq!(body(&doc)[0].text(), "bad char & <ok>");
    assert_eq!(doc.paragraphs().next().map(Paragraph::text).as_deref(), Some("Ana I."));
}

#[test]
fn photo_is_decoded_by_content() {
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("profile.png");
    image::RgbImage::from_pixel(60, 30, image::Rgb([10, 120, 200]))
        .save_with_format(&photo, image::ImageFormat::Jpeg)
        .unwrap();

    let doc = render(&record(FULL_RECORD), Some(photo.as_path()));
    let image = doc
        .paragraphs()
        .find_map(|p| p.image.as_ref())
        .expect("JPEG photo embedded");
    assert_eq!((image.pixel_width, image.pixel_height), (60, 30));
    assert!((image.display_height - 54.0).abs() < 0.01);
}
