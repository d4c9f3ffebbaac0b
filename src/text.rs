//! Plain-text extraction from résumé files.

use std::path::Path;

use crate::docx;
use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Docx,
    /// An already extracted résumé record.
    Json,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Ok(InputKind::Pdf),
            Some("docx") => Ok(InputKind::Docx),
            Some("json") => Ok(InputKind::Json),
            _ => Err(Error::UnsupportedInput(format!(
                "{} (expected .pdf, .docx or .json)",
                path.display()
            ))),
        }
    }
}

/// Extract the text of a PDF or DOCX résumé.
pub fn extract_text(path: &Path) -> Result<String, Error> {
    let text = match InputKind::from_path(path)? {
        InputKind::Pdf => {
            let bytes = std::fs::read(path).map_err(|e| Error::unreadable(path, e))?;
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| Error::Pdf(e.to_string()))?
        }
        InputKind::Docx => docx::extract_text(path).map_err(|e| Error::unreadable(path, e))?,
        InputKind::Json => {
            return Err(Error::UnsupportedInput(format!(
                "{} is a résumé record, not a document",
                path.display()
            )));
        }
    };

    if text.trim().is_empty() {
        return Err(Error::EmptyText);
    }
    log::debug!("extracted {} characters from {}", text.len(), path.display());
    Ok(text)
}
