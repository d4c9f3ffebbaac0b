use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub enum Error {
    /// Input file type the text extractor does not handle.
    UnsupportedInput(String),
    /// The input file could not be opened or is not a valid document.
    Unreadable(String),
    /// The PDF could not be turned into text.
    Pdf(String),
    /// Extraction succeeded but produced no text.
    EmptyText,
    /// Text input needs a language model and none was configured.
    NoModel,
    InvalidDocx(String),
    Http(reqwest::Error),
    Api { status: u16, message: String },
    /// The model answered without a fenced JSON block.
    NoJsonBlock,
    Json(serde_json::Error),
    Zip(zip::result::ZipError),
    Xml(roxmltree::Error),
    Io(std::io::Error),
}

impl Error {
    pub(crate) fn unreadable(path: &Path, err: impl fmt::Display) -> Self {
        Error::Unreadable(format!("{}: {err}", path.display()))
    }

    /// True when no résumé record could be produced, so nothing was rendered.
    pub fn is_extraction_failure(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedInput(_)
                | Error::Unreadable(_)
                | Error::Pdf(_)
                | Error::EmptyText
                | Error::NoModel
                | Error::Http(_)
                | Error::Api { .. }
                | Error::NoJsonBlock
                | Error::Json(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedInput(what) => write!(f, "unsupported input: {what}"),
            Error::Unreadable(e) => write!(f, "cannot read input: {e}"),
            Error::Pdf(e) => write!(f, "PDF text extraction failed: {e}"),
            Error::EmptyText => write!(f, "no text could be extracted from the input"),
            Error::NoModel => write!(f, "no language model configured (set GEMINI_API_KEY or pass --api-key)"),
            Error::InvalidDocx(reason) => write!(f, "not a valid DOCX file: {reason}"),
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Api { status, message } => write!(f, "model API error (status {status}): {message}"),
            Error::NoJsonBlock => write!(f, "no ```json block found in the model response"),
            Error::Json(e) => write!(f, "JSON error: {e}"),
            Error::Zip(e) => write!(f, "ZIP error: {e}"),
            Error::Xml(e) => write!(f, "XML error: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Zip(e) => Some(e),
            Error::Xml(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(e: zip::result::ZipError) -> Self {
        Error::Zip(e)
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
