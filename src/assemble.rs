use crate::model::{Alignment, Block, Cell, Document, EmbeddedImage, Paragraph, ParagraphStyle, Run, Table};
use crate::render::{self, BODY_SIZE, MUTED};
use crate::schema::ResumeRecord;

pub const NAME_SIZE: f32 = 24.0;
pub const ROLE_SIZE: f32 = 12.0;
pub const HEADING_SIZE: f32 = 14.0;
pub const HEADING_COLOR: [u8; 3] = [0, 112, 192];
pub const DIVIDER_FILL: [u8; 3] = [0xD9, 0xD9, 0xD9];

/// Header table columns: 5.5 in for the name, 1.5 in for the photo.
const HEADER_COLUMNS: [f32; 2] = [396.0, 108.0];

/// Build the full document: header table, optional summary, then every
/// section in record order.
pub fn assemble(record: &ResumeRecord, photo: Option<EmbeddedImage>) -> Document {
    let mut doc = Document::default();

    doc.blocks.push(Block::Table(header(record, photo)));

    if let Some(about) = record.about_text() {
        doc.blocks.push(Block::Paragraph(
            Paragraph::new(ParagraphStyle::Normal).with_run(Run::new(about, BODY_SIZE)),
        ));
        doc.blocks.push(Block::Paragraph(divider()));
    }

    for section in &record.sections {
        doc.blocks.push(Block::Paragraph(heading(&section.title)));
        let body = render::render_section(section);
        log::debug!(
            "section {:?} ({}): {} items -> {} paragraphs",
            section.title,
            section.body.kind(),
            section.body.len(),
            body.len()
        );
        doc.blocks.extend(body.into_iter().map(Block::Paragraph));
    }

    doc
}

fn header(record: &ResumeRecord, photo: Option<EmbeddedImage>) -> Table {
    let mut left = Cell { width: HEADER_COLUMNS[0], paragraphs: Vec::new() };
    left.paragraphs.push(
        Paragraph::new(ParagraphStyle::Normal)
            .with_run(Run::new(record.name.as_str(), NAME_SIZE).bold()),
    );
    if let Some(role) = &record.role {
        left.paragraphs.push(
            Paragraph::new(ParagraphStyle::Normal)
                .with_run(Run::new(role.as_str(), ROLE_SIZE).color(MUTED)),
        );
    }

    let mut photo_para = Paragraph::new(ParagraphStyle::Normal);
    if let Some(image) = photo {
        photo_para.alignment = Alignment::Right;
        photo_para.image = Some(image);
    }
    let right = Cell { width: HEADER_COLUMNS[1], paragraphs: vec![photo_para] };

    Table { column_widths: HEADER_COLUMNS.to_vec(), rows: vec![vec![left, right]] }
}

fn heading(title: &str) -> Paragraph {
    let mut p = Paragraph::new(ParagraphStyle::Normal).with_run(
        Run::new(title.to_uppercase(), HEADING_SIZE)
            .bold()
            .color(HEADING_COLOR),
    );
    p.space_after = Some(6.0);
    p
}

fn divider() -> Paragraph {
    Paragraph {
        shading: Some(DIVIDER_FILL),
        space_before: Some(6.0),
        space_after: Some(6.0),
        ..Paragraph::new(ParagraphStyle::Normal)
    }
}
