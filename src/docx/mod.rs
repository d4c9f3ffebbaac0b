//! WordprocessingML packages: writing the rendered résumé and reading DOCX
//! files back into the document model.

mod read;
mod write;

pub use read::{extract_text, parse, read};
pub use write::{to_bytes, write};

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(crate) const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const WPD_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
pub(crate) const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
pub(crate) const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub(crate) const DOCUMENT_PART: &str = "word/document.xml";
pub(crate) const STYLES_PART: &str = "word/styles.xml";
pub(crate) const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";

pub(crate) const LIST_BULLET_STYLE: &str = "ListBullet";

/// English Metric Units per point.
pub(crate) const EMU_PER_PT: f32 = 12700.0;

pub(crate) fn twips_to_pts(twips: f32) -> f32 {
    twips / 20.0
}

pub(crate) fn pts_to_twips(pts: f32) -> i64 {
    (pts * 20.0).round() as i64
}

pub(crate) fn parse_hex_color(val: &str) -> Option<[u8; 3]> {
    if val == "auto" || val.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&val[0..2], 16).ok()?;
    let g = u8::from_str_radix(&val[2..4], 16).ok()?;
    let b = u8::from_str_radix(&val[4..6], 16).ok()?;
    Some([r, g, b])
}

pub(crate) fn hex_color([r, g, b]: [u8; 3]) -> String {
    format!("{r:02X}{g:02X}{b:02X}")
}
