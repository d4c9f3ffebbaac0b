mod assemble;
pub mod docx;
mod error;
pub mod extract;
pub mod gemini;
pub mod model;
pub mod photo;
pub mod render;
pub mod schema;
pub mod text;

pub use assemble::assemble;
pub use error::Error;
pub use gemini::{GeminiClient, GeminiConfig, TextModel};
pub use schema::ResumeRecord;

use std::path::{Path, PathBuf};

use text::InputKind;

#[derive(Clone, Debug, Default)]
pub struct ConvertOptions {
    /// Header photo. Silently skipped when the file does not exist.
    pub photo: Option<PathBuf>,
    /// Where to store the extracted record as JSON, if anywhere.
    pub save_record: Option<PathBuf>,
}

/// Render a record to DOCX bytes.
pub fn render_to_bytes(record: &ResumeRecord, photo: Option<&Path>) -> Result<Vec<u8>, Error> {
    let image = photo.and_then(photo::load);
    let doc = assemble(record, image);
    docx::to_bytes(&doc)
}

/// Render a record into `output`, replacing any existing file.
pub fn render_to_file(
    record: &ResumeRecord,
    photo: Option<&Path>,
    output: &Path,
) -> Result<(), Error> {
    let bytes = render_to_bytes(record, photo)?;
    std::fs::write(output, bytes).map_err(Error::Io)
}

pub fn load_record(path: &Path) -> Result<ResumeRecord, Error> {
    let json = std::fs::read_to_string(path).map_err(|e| Error::unreadable(path, e))?;
    ResumeRecord::from_json(&json)
}

/// Produce the résumé record for `input`: JSON records are read as-is,
/// documents go through text extraction and the model.
pub fn record_from_input(input: &Path, model: Option<&dyn TextModel>) -> Result<ResumeRecord, Error> {
    match InputKind::from_path(input)? {
        InputKind::Json => load_record(input),
        InputKind::Pdf | InputKind::Docx => {
            let model = model.ok_or(Error::NoModel)?;
            let cv_text = text::extract_text(input)?;
            extract::extract_record(model, &cv_text)
        }
    }
}

/// Full pipeline: input file to styled DOCX. Nothing is written when no
/// record can be produced.
pub fn convert(
    input: &Path,
    output: &Path,
    options: &ConvertOptions,
    model: Option<&dyn TextModel>,
) -> Result<ResumeRecord, Error> {
    let record = record_from_input(input, model)?;

    if let Some(path) = &options.save_record {
        std::fs::write(path, record.to_json_pretty()?)?;
        log::info!("saved record to {}", path.display());
    }

    render_to_file(&record, options.photo.as_deref(), output)?;
    log::info!("saved CV to {}", output.display());
    Ok(record)
}
