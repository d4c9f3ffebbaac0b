use std::io::{self, Cursor, Seek, Write};
use std::slice;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::{
    DML_NS, DOCUMENT_PART, DOCUMENT_RELS_PART, EMU_PER_PT, LIST_BULLET_STYLE, PIC_NS, PKG_REL_NS,
    REL_NS, STYLES_PART, WML_NS, WPD_NS, hex_color, pts_to_twips,
};
use crate::error::Error;
use crate::model::{Alignment, Block, Document, EmbeddedImage, Paragraph, ParagraphStyle, Run, Table};

const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NUMBERING_PART: &str = "word/numbering.xml";
const BULLET_NUM_ID: &str = "1";

/// An image part referenced from the document body.
struct Media<'a> {
    rel_id: String,
    part: String,
    image: &'a EmbeddedImage,
}

/// Serialise `doc` into a DOCX package. Entries carry a fixed timestamp, so
/// the same document always produces the same bytes.
pub fn write<W: Write + Seek>(doc: &Document, out: W) -> Result<W, Error> {
    let media: Vec<Media> = doc
        .paragraphs()
        .filter_map(|p| p.image.as_ref())
        .enumerate()
        .map(|(i, image)| Media {
            rel_id: format!("rIdImage{}", i + 1),
            part: format!("word/media/image{}.png", i + 1),
            image,
        })
        .collect();

    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());

    let mut zip = ZipWriter::new(out);
    let mut put = |name: &str, bytes: &[u8]| -> Result<(), Error> {
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
        Ok(())
    };

    put("[Content_Types].xml", &content_types()?)?;
    put("_rels/.rels", &package_rels()?)?;
    put(DOCUMENT_PART, &document_xml(doc, &media)?)?;
    put(STYLES_PART, &styles_xml(doc)?)?;
    put(NUMBERING_PART, &numbering_xml()?)?;
    put(DOCUMENT_RELS_PART, &document_rels(&media)?)?;
    for m in &media {
        put(&m.part, &m.image.data)?;
    }

    Ok(zip.finish()?)
}

pub fn to_bytes(doc: &Document) -> Result<Vec<u8>, Error> {
    Ok(write(doc, Cursor::new(Vec::new()))?.into_inner())
}

/// XML 1.0 `Char` production. Everything else cannot appear in a part at all,
/// escaped or not.
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// One XML part under construction.
struct Part {
    xml: Writer<Vec<u8>>,
}

impl Part {
    fn new() -> io::Result<Self> {
        let mut xml = Writer::new(Vec::new());
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(Part { xml })
    }

    fn open(&mut self, tag: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
        let start = BytesStart::new(tag).with_attributes(attrs.iter().copied());
        self.xml.write_event(Event::Start(start))
    }

    fn close(&mut self, tag: &str) -> io::Result<()> {
        self.xml.write_event(Event::End(BytesEnd::new(tag)))
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) -> io::Result<()> {
        let start = BytesStart::new(tag).with_attributes(attrs.iter().copied());
        self.xml.write_event(Event::Empty(start))
    }

    fn text(&mut self, text: &str) -> io::Result<()> {
        let clean: String = text.chars().filter(|c| is_xml_char(*c)).collect();
        self.xml.write_event(Event::Text(BytesText::new(&clean)))
    }

    fn finish(self) -> Vec<u8> {
        self.xml.into_inner()
    }
}

fn content_types() -> io::Result<Vec<u8>> {
    let overrides = [
        (DOCUMENT_PART, "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"),
        (STYLES_PART, "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"),
        (NUMBERING_PART, "application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"),
    ];

    let mut part = Part::new()?;
    part.open("Types", &[("xmlns", CONTENT_TYPES_NS)])?;
    part.empty(
        "Default",
        &[("Extension", "rels"), ("ContentType", "application/vnd.openxmlformats-package.relationships+xml")],
    )?;
    part.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
    part.empty("Default", &[("Extension", "png"), ("ContentType", "image/png")])?;
    for (name, content_type) in overrides {
        let name = format!("/{name}");
        part.empty("Override", &[("PartName", name.as_str()), ("ContentType", content_type)])?;
    }
    part.close("Types")?;
    Ok(part.finish())
}

fn relationship(part: &mut Part, id: &str, kind: &str, target: &str) -> io::Result<()> {
    let kind = format!("{REL_NS}/{kind}");
    part.empty("Relationship", &[("Id", id), ("Type", kind.as_str()), ("Target", target)])
}

fn package_rels() -> io::Result<Vec<u8>> {
    let mut part = Part::new()?;
    part.open("Relationships", &[("xmlns", PKG_REL_NS)])?;
    relationship(&mut part, "rId1", "officeDocument", DOCUMENT_PART)?;
    part.close("Relationships")?;
    Ok(part.finish())
}

fn document_rels(media: &[Media]) -> io::Result<Vec<u8>> {
    let mut part = Part::new()?;
    part.open("Relationships", &[("xmlns", PKG_REL_NS)])?;
    relationship(&mut part, "rIdStyles", "styles", "styles.xml")?;
    relationship(&mut part, "rIdNumbering", "numbering", "numbering.xml")?;
    for m in media {
        relationship(&mut part, &m.rel_id, "image", m.part.trim_start_matches("word/"))?;
    }
    part.close("Relationships")?;
    Ok(part.finish())
}

fn fonts(part: &mut Part, font: &str) -> io::Result<()> {
    part.empty(
        "w:rFonts",
        &[("w:ascii", font), ("w:hAnsi", font), ("w:eastAsia", font), ("w:cs", font)],
    )
}

fn font_size(part: &mut Part, pts: f32) -> io::Result<()> {
    let half_points = ((pts * 2.0).round() as u32).to_string();
    part.empty("w:sz", &[("w:val", half_points.as_str())])?;
    part.empty("w:szCs", &[("w:val", half_points.as_str())])
}

fn styles_xml(doc: &Document) -> io::Result<Vec<u8>> {
    let mut part = Part::new()?;
    part.open("w:styles", &[("xmlns:w", WML_NS)])?;

    part.open("w:docDefaults", &[])?;
    part.open("w:rPrDefault", &[])?;
    part.open("w:rPr", &[])?;
    fonts(&mut part, &doc.default_font)?;
    font_size(&mut part, doc.default_font_size)?;
    part.close("w:rPr")?;
    part.close("w:rPrDefault")?;
    part.open("w:pPrDefault", &[])?;
    part.open("w:pPr", &[])?;
    part.empty("w:spacing", &[("w:after", "160"), ("w:line", "259"), ("w:lineRule", "auto")])?;
    part.close("w:pPr")?;
    part.close("w:pPrDefault")?;
    part.close("w:docDefaults")?;

    part.open("w:style", &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")])?;
    part.empty("w:name", &[("w:val", "Normal")])?;
    part.empty("w:qFormat", &[])?;
    part.close("w:style")?;

    part.open("w:style", &[("w:type", "paragraph"), ("w:styleId", LIST_BULLET_STYLE)])?;
    part.empty("w:name", &[("w:val", "List Bullet")])?;
    part.empty("w:basedOn", &[("w:val", "Normal")])?;
    part.open("w:pPr", &[])?;
    part.open("w:numPr", &[])?;
    part.empty("w:numId", &[("w:val", BULLET_NUM_ID)])?;
    part.close("w:numPr")?;
    part.empty("w:contextualSpacing", &[])?;
    part.close("w:pPr")?;
    part.close("w:style")?;

    part.open("w:style", &[("w:type", "table"), ("w:default", "1"), ("w:styleId", "TableNormal")])?;
    part.empty("w:name", &[("w:val", "Normal Table")])?;
    part.open("w:tblPr", &[])?;
    part.empty("w:tblInd", &[("w:w", "0"), ("w:type", "dxa")])?;
    part.open("w:tblCellMar", &[])?;
    for (side, width) in [("w:top", "0"), ("w:left", "108"), ("w:bottom", "0"), ("w:right", "108")] {
        part.empty(side, &[("w:w", width), ("w:type", "dxa")])?;
    }
    part.close("w:tblCellMar")?;
    part.close("w:tblPr")?;
    part.close("w:style")?;

    part.close("w:styles")?;
    Ok(part.finish())
}

fn numbering_xml() -> io::Result<Vec<u8>> {
    let mut part = Part::new()?;
    part.open("w:numbering", &[("xmlns:w", WML_NS)])?;

    part.open("w:abstractNum", &[("w:abstractNumId", "0")])?;
    part.empty("w:multiLevelType", &[("w:val", "singleLevel")])?;
    part.open("w:lvl", &[("w:ilvl", "0")])?;
    part.empty("w:start", &[("w:val", "1")])?;
    part.empty("w:numFmt", &[("w:val", "bullet")])?;
    part.empty("w:lvlText", &[("w:val", "\u{2022}")])?;
    part.empty("w:lvlJc", &[("w:val", "left")])?;
    part.open("w:pPr", &[])?;
    part.empty("w:ind", &[("w:left", "360"), ("w:hanging", "360")])?;
    part.close("w:pPr")?;
    part.close("w:lvl")?;
    part.close("w:abstractNum")?;

    part.open("w:num", &[("w:numId", BULLET_NUM_ID)])?;
    part.empty("w:abstractNumId", &[("w:val", "0")])?;
    part.close("w:num")?;

    part.close("w:numbering")?;
    Ok(part.finish())
}

fn document_xml(doc: &Document, media: &[Media]) -> io::Result<Vec<u8>> {
    let mut part = Part::new()?;
    part.open(
        "w:document",
        &[
            ("xmlns:w", WML_NS),
            ("xmlns:r", REL_NS),
            ("xmlns:wp", WPD_NS),
            ("xmlns:a", DML_NS),
            ("xmlns:pic", PIC_NS),
        ],
    )?;
    part.open("w:body", &[])?;

    // Images are numbered in reading order, same as `media`.
    let mut next_image = media.iter();
    for block in &doc.blocks {
        match block {
            Block::Paragraph(p) => write_paragraph(&mut part, p, &mut next_image)?,
            Block::Table(t) => write_table(&mut part, t, &mut next_image)?,
        }
    }
    // A body may not end on a table.
    if matches!(doc.blocks.last(), Some(Block::Table(_))) {
        part.empty("w:p", &[])?;
    }

    let twips = |pts: f32| pts_to_twips(pts).to_string();
    let (width, height) = (twips(doc.page_width), twips(doc.page_height));
    let (top, right) = (twips(doc.margin_top), twips(doc.margin_right));
    let (bottom, left) = (twips(doc.margin_bottom), twips(doc.margin_left));
    part.open("w:sectPr", &[])?;
    part.empty("w:pgSz", &[("w:w", width.as_str()), ("w:h", height.as_str())])?;
    part.empty(
        "w:pgMar",
        &[
            ("w:top", top.as_str()),
            ("w:right", right.as_str()),
            ("w:bottom", bottom.as_str()),
            ("w:left", left.as_str()),
            ("w:header", "720"),
            ("w:footer", "720"),
            ("w:gutter", "0"),
        ],
    )?;
    part.close("w:sectPr")?;

    part.close("w:body")?;
    part.close("w:document")?;
    Ok(part.finish())
}

fn write_table(part: &mut Part, table: &Table, media: &mut slice::Iter<'_, Media<'_>>) -> io::Result<()> {
    let total: i64 = table.column_widths.iter().map(|w| pts_to_twips(*w)).sum();
    let total = total.to_string();

    part.open("w:tbl", &[])?;
    part.open("w:tblPr", &[])?;
    part.empty("w:tblW", &[("w:w", total.as_str()), ("w:type", "dxa")])?;
    part.empty("w:tblLayout", &[("w:type", "fixed")])?;
    part.close("w:tblPr")?;
    part.open("w:tblGrid", &[])?;
    for w in &table.column_widths {
        let w = pts_to_twips(*w).to_string();
        part.empty("w:gridCol", &[("w:w", w.as_str())])?;
    }
    part.close("w:tblGrid")?;

    for row in &table.rows {
        part.open("w:tr", &[])?;
        for cell in row {
            let width = pts_to_twips(cell.width).to_string();
            part.open("w:tc", &[])?;
            part.open("w:tcPr", &[])?;
            part.empty("w:tcW", &[("w:w", width.as_str()), ("w:type", "dxa")])?;
            part.close("w:tcPr")?;
            if cell.paragraphs.is_empty() {
                part.empty("w:p", &[])?;
            }
            for p in &cell.paragraphs {
                write_paragraph(part, p, media)?;
            }
            part.close("w:tc")?;
        }
        part.close("w:tr")?;
    }
    part.close("w:tbl")
}

fn write_paragraph(part: &mut Part, p: &Paragraph, media: &mut slice::Iter<'_, Media<'_>>) -> io::Result<()> {
    let jc = match p.alignment {
        Alignment::Left => None,
        Alignment::Center => Some("center"),
        Alignment::Right => Some("right"),
        Alignment::Justify => Some("both"),
    };
    let before = p.space_before.map(|pts| pts_to_twips(pts).to_string());
    let after = p.space_after.map(|pts| pts_to_twips(pts).to_string());
    let mut spacing = Vec::new();
    if let Some(before) = &before {
        spacing.push(("w:before", before.as_str()));
    }
    if let Some(after) = &after {
        spacing.push(("w:after", after.as_str()));
    }

    part.open("w:p", &[])?;

    if p.style == ParagraphStyle::ListBullet || p.shading.is_some() || !spacing.is_empty() || jc.is_some() {
        part.open("w:pPr", &[])?;
        if p.style == ParagraphStyle::ListBullet {
            part.empty("w:pStyle", &[("w:val", LIST_BULLET_STYLE)])?;
        }
        if let Some(fill) = p.shading {
            let fill = hex_color(fill);
            part.empty("w:shd", &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", fill.as_str())])?;
        }
        if !spacing.is_empty() {
            part.empty("w:spacing", &spacing)?;
        }
        if let Some(jc) = jc {
            part.empty("w:jc", &[("w:val", jc)])?;
        }
        part.close("w:pPr")?;
    }

    if p.image.is_some()
        && let Some(m) = media.next()
    {
        write_drawing(part, m)?;
    }
    for run in &p.runs {
        write_run(part, run)?;
    }

    part.close("w:p")
}

fn write_run(part: &mut Part, run: &Run) -> io::Result<()> {
    part.open("w:r", &[])?;
    part.open("w:rPr", &[])?;
    fonts(part, &run.font_name)?;
    if run.bold {
        part.empty("w:b", &[])?;
    }
    if run.italic {
        part.empty("w:i", &[])?;
    }
    if let Some(color) = run.color {
        let color = hex_color(color);
        part.empty("w:color", &[("w:val", color.as_str())])?;
    }
    font_size(part, run.font_size)?;
    part.close("w:rPr")?;

    for (i, line) in run.text.split('\n').enumerate() {
        if i > 0 {
            part.empty("w:br", &[])?;
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        part.open("w:t", &[("xml:space", "preserve")])?;
        part.text(line)?;
        part.close("w:t")?;
    }

    part.close("w:r")
}

fn write_drawing(part: &mut Part, m: &Media) -> io::Result<()> {
    let cx = ((m.image.display_width * EMU_PER_PT).round() as i64).to_string();
    let cy = ((m.image.display_height * EMU_PER_PT).round() as i64).to_string();
    let extent = [("cx", cx.as_str()), ("cy", cy.as_str())];
    let id = m.rel_id.trim_start_matches("rIdImage");
    let title = format!("Picture {id}");
    let file_name = m.part.rsplit('/').next().unwrap_or("image.png");

    part.open("w:r", &[])?;
    part.open("w:drawing", &[])?;
    part.open(
        "wp:inline",
        &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")],
    )?;
    part.empty("wp:extent", &extent)?;
    part.empty("wp:docPr", &[("id", id), ("name", title.as_str())])?;

    part.open("a:graphic", &[])?;
    part.open("a:graphicData", &[("uri", PIC_NS)])?;
    part.open("pic:pic", &[])?;

    part.open("pic:nvPicPr", &[])?;
    part.empty("pic:cNvPr", &[("id", id), ("name", file_name)])?;
    part.empty("pic:cNvPicPr", &[])?;
    part.close("pic:nvPicPr")?;

    part.open("pic:blipFill", &[])?;
    part.empty("a:blip", &[("r:embed", m.rel_id.as_str())])?;
    part.open("a:stretch", &[])?;
    part.empty("a:fillRect", &[])?;
    part.close("a:stretch")?;
    part.close("pic:blipFill")?;

    part.open("pic:spPr", &[])?;
    part.open("a:xfrm", &[])?;
    part.empty("a:off", &[("x", "0"), ("y", "0")])?;
    part.empty("a:ext", &extent)?;
    part.close("a:xfrm")?;
    part.open("a:prstGeom", &[("prst", "rect")])?;
    part.empty("a:avLst", &[])?;
    part.close("a:prstGeom")?;
    part.close("pic:spPr")?;

    part.close("pic:pic")?;
    part.close("a:graphicData")?;
    part.close("a:graphic")?;
    part.close("wp:inline")?;
    part.close("w:drawing")?;
    part.close("w:r")
}
