use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

use super::{
    DML_NS, DOCUMENT_PART, DOCUMENT_RELS_PART, EMU_PER_PT, LIST_BULLET_STYLE, REL_NS, STYLES_PART,
    WML_NS, WPD_NS, parse_hex_color, twips_to_pts,
};
use crate::error::Error;
use crate::model::{
    Alignment, Block, Cell, Document, EmbeddedImage, Paragraph, ParagraphStyle, Run, Table,
};

fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(WML_NS))
}

fn wml_children<'a>(
    node: roxmltree::Node<'a, 'a>,
    name: &'a str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'a>> {
    node.children()
        .filter(move |n| n.tag_name().name() == name && n.tag_name().namespace() == Some(WML_NS))
}

fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

fn twips_attr(node: roxmltree::Node, attr: &str) -> Option<f32> {
    node.attribute((WML_NS, attr))
        .and_then(|v| v.parse::<f32>().ok())
        .map(twips_to_pts)
}

/// `<w:b/>` and friends are on unless `w:val` switches them off.
fn toggle(rpr: Option<roxmltree::Node>, name: &str) -> bool {
    rpr.and_then(|n| wml(n, name))
        .is_some_and(|n| !matches!(n.attribute((WML_NS, "val")), Some("0" | "false" | "off")))
}

fn parse_alignment(val: &str) -> Alignment {
    match val {
        "center" => Alignment::Center,
        "right" | "end" => Alignment::Right,
        "both" | "distribute" => Alignment::Justify,
        _ => Alignment::Left,
    }
}

fn read_part<R: Read + Seek>(zip: &mut zip::ZipArchive<R>, name: &str) -> Option<String> {
    let mut content = String::new();
    zip.by_name(name).ok()?.read_to_string(&mut content).ok()?;
    Some(content)
}

struct StyleDefaults {
    font_size: f32,
    font_name: String,
}

fn parse_style_defaults<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> StyleDefaults {
    let mut defaults = StyleDefaults { font_size: 11.0, font_name: String::from("Calibri") };

    let Some(xml_content) = read_part(zip, STYLES_PART) else {
        return defaults;
    };
    let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
        return defaults;
    };

    let rpr = wml(xml.root_element(), "docDefaults")
        .and_then(|n| wml(n, "rPrDefault"))
        .and_then(|n| wml(n, "rPr"));
    if let Some(rpr) = rpr {
        if let Some(sz_val) = wml_attr(rpr, "sz").and_then(|v| v.parse::<f32>().ok()) {
            defaults.font_size = sz_val / 2.0;
        }
        if let Some(ascii) = wml(rpr, "rFonts").and_then(|n| n.attribute((WML_NS, "ascii"))) {
            defaults.font_name = ascii.to_string();
        }
    }
    defaults
}

/// Relationship id -> package part name, for the main document.
fn parse_relationships<R: Read + Seek>(zip: &mut zip::ZipArchive<R>) -> HashMap<String, String> {
    let mut rels = HashMap::new();
    let Some(xml_content) = read_part(zip, DOCUMENT_RELS_PART) else {
        return rels;
    };
    let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
        return rels;
    };
    for node in xml.root_element().children() {
        if node.tag_name().name() != "Relationship" {
            continue;
        }
        if let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target")) {
            let part = match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("word/{target}"),
            };
            rels.insert(id.to_string(), part);
        }
    }
    rels
}

struct Context<'z, R: Read + Seek> {
    zip: &'z mut zip::ZipArchive<R>,
    rels: HashMap<String, String>,
    defaults: StyleDefaults,
}

/// Parse a DOCX file into the document model.
pub fn parse(path: &Path) -> Result<Document, Error> {
    read(std::fs::File::open(path)?)
}

/// Parse a DOCX package from any seekable reader.
///
/// Only what the model can express is kept: paragraph style (bullet or not),
/// spacing, shading, alignment, run formatting, inline images and tables.
pub fn read<R: Read + Seek>(reader: R) -> Result<Document, Error> {
    let mut zip = zip::ZipArchive::new(reader)?;

    let defaults = parse_style_defaults(&mut zip);
    let rels = parse_relationships(&mut zip);

    let mut xml_content = String::new();
    zip.by_name(DOCUMENT_PART)?.read_to_string(&mut xml_content)?;

    let xml = roxmltree::Document::parse(&xml_content)?;
    let root = xml.root_element();

    let body = wml(root, "body").ok_or_else(|| Error::InvalidDocx("missing w:body".into()))?;

    let sect = wml(body, "sectPr");
    let pg_sz = sect.and_then(|s| wml(s, "pgSz"));
    let pg_mar = sect.and_then(|s| wml(s, "pgMar"));

    let mut doc = Document {
        page_width: pg_sz.and_then(|n| twips_attr(n, "w")).unwrap_or(612.0),
        page_height: pg_sz.and_then(|n| twips_attr(n, "h")).unwrap_or(792.0),
        margin_top: pg_mar.and_then(|n| twips_attr(n, "top")).unwrap_or(72.0),
        margin_bottom: pg_mar.and_then(|n| twips_attr(n, "bottom")).unwrap_or(72.0),
        margin_left: pg_mar.and_then(|n| twips_attr(n, "left")).unwrap_or(72.0),
        margin_right: pg_mar.and_then(|n| twips_attr(n, "right")).unwrap_or(72.0),
        default_font: defaults.font_name.clone(),
        default_font_size: defaults.font_size,
        blocks: Vec::new(),
    };

    let mut ctx = Context { zip: &mut zip, rels, defaults };

    for node in body.children() {
        if node.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match node.tag_name().name() {
            "p" => doc.blocks.push(Block::Paragraph(parse_paragraph(node, &mut ctx))),
            "tbl" => doc.blocks.push(Block::Table(parse_table(node, &mut ctx))),
            _ => {}
        }
    }

    Ok(doc)
}

/// Plain text of a DOCX file, one line per paragraph.
pub fn extract_text(path: &Path) -> Result<String, Error> {
    let doc = parse(path)?;
    let lines: Vec<String> = doc.paragraphs().map(Paragraph::text).collect();
    Ok(lines.join("\n"))
}

fn parse_table<R: Read + Seek>(node: roxmltree::Node, ctx: &mut Context<R>) -> Table {
    let column_widths = wml(node, "tblGrid")
        .map(|grid| {
            wml_children(grid, "gridCol")
                .map(|col| twips_attr(col, "w").unwrap_or(0.0))
                .collect()
        })
        .unwrap_or_default();

    let rows = wml_children(node, "tr")
        .map(|tr| {
            wml_children(tr, "tc")
                .map(|tc| Cell {
                    width: wml(tc, "tcPr")
                        .and_then(|pr| wml(pr, "tcW"))
                        .and_then(|w| twips_attr(w, "w"))
                        .unwrap_or(0.0),
                    paragraphs: wml_children(tc, "p")
                        .map(|p| parse_paragraph(p, ctx))
                        .collect(),
                })
                .collect()
        })
        .collect();

    Table { column_widths, rows }
}

fn parse_paragraph<R: Read + Seek>(node: roxmltree::Node, ctx: &mut Context<R>) -> Paragraph {
    let ppr = wml(node, "pPr");

    let is_bullet = ppr.and_then(|ppr| wml_attr(ppr, "pStyle")) == Some(LIST_BULLET_STYLE)
        || ppr.and_then(|ppr| wml(ppr, "numPr")).is_some();

    let spacing = ppr.and_then(|ppr| wml(ppr, "spacing"));

    let mut para = Paragraph {
        style: if is_bullet { ParagraphStyle::ListBullet } else { ParagraphStyle::Normal },
        runs: Vec::new(),
        space_before: spacing.and_then(|n| twips_attr(n, "before")),
        space_after: spacing.and_then(|n| twips_attr(n, "after")),
        alignment: ppr
            .and_then(|ppr| wml_attr(ppr, "jc"))
            .map(parse_alignment)
            .unwrap_or(Alignment::Left),
        shading: ppr
            .and_then(|ppr| wml(ppr, "shd"))
            .and_then(|shd| shd.attribute((WML_NS, "fill")))
            .and_then(parse_hex_color),
        image: None,
    };

    for run_node in run_nodes(node) {
        if para.image.is_none()
            && let Some(image) = wml(run_node, "drawing").and_then(|d| parse_drawing(d, ctx))
        {
            para.image = Some(image);
        }
        if let Some(run) = parse_run(run_node, &ctx.defaults) {
            para.runs.push(run);
        }
    }

    para
}

/// Runs of a paragraph, including those nested in hyperlinks and tracked insertions.
fn run_nodes<'a>(para: roxmltree::Node<'a, 'a>) -> Vec<roxmltree::Node<'a, 'a>> {
    let mut runs = Vec::new();
    for child in para.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "r" => runs.push(child),
            "hyperlink" | "ins" | "smartTag" | "fldSimple" => runs.extend(run_nodes(child)),
            _ => {}
        }
    }
    runs
}

fn parse_run(run_node: roxmltree::Node, defaults: &StyleDefaults) -> Option<Run> {
    let rpr = wml(run_node, "rPr");

    let mut text = String::new();
    for child in run_node.children() {
        if child.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "t" => text.push_str(child.text().unwrap_or_default()),
            "br" | "cr" => text.push('\n'),
            "tab" => text.push('\t'),
            _ => {}
        }
    }
    if text.is_empty() {
        return None;
    }

    let font_size = rpr
        .and_then(|n| wml_attr(n, "sz"))
        .and_then(|v| v.parse::<f32>().ok())
        .map(|hp| hp / 2.0)
        .unwrap_or(defaults.font_size);

    let font_name = rpr
        .and_then(|n| wml(n, "rFonts"))
        .and_then(|n| n.attribute((WML_NS, "ascii")))
        .map(str::to_string)
        .unwrap_or_else(|| defaults.font_name.clone());

    Some(Run {
        text,
        font_size,
        font_name,
        bold: toggle(rpr, "b"),
        italic: toggle(rpr, "i"),
        color: rpr.and_then(|n| wml_attr(n, "color")).and_then(parse_hex_color),
    })
}

fn parse_drawing<R: Read + Seek>(
    drawing: roxmltree::Node,
    ctx: &mut Context<R>,
) -> Option<EmbeddedImage> {
    let container = drawing.children().find(|n| {
        let name = n.tag_name().name();
        (name == "inline" || name == "anchor") && n.tag_name().namespace() == Some(WPD_NS)
    })?;

    let extent = container
        .children()
        .find(|n| n.tag_name().name() == "extent" && n.tag_name().namespace() == Some(WPD_NS))?;
    let emu = |attr: &str| {
        extent
            .attribute(attr)
            .and_then(|v| v.parse::<f32>().ok())
            .map(|v| v / EMU_PER_PT)
            .unwrap_or(0.0)
    };

    let rel_id = container
        .descendants()
        .find(|n| n.tag_name().name() == "blip" && n.tag_name().namespace() == Some(DML_NS))?
        .attribute((REL_NS, "embed"))?;
    let part = ctx.rels.get(rel_id)?.clone();

    let mut data = Vec::new();
    ctx.zip.by_name(&part).ok()?.read_to_end(&mut data).ok()?;

    let (pixel_width, pixel_height) = match image::load_from_memory(&data) {
        Ok(img) => (img.width(), img.height()),
        Err(e) => {
            log::warn!("{part}: cannot decode embedded image: {e}");
            (0, 0)
        }
    };

    Some(EmbeddedImage {
        data,
        pixel_width,
        pixel_height,
        display_width: emu("cx"),
        display_height: emu("cy"),
    })
}
