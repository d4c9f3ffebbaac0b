//! Section body layout, one routine per section kind.

use serde_json::Value;

use crate::model::{Paragraph, ParagraphStyle, Run};
use crate::schema::{BulletItem, Position, Section, SectionBody, TextItem};

pub const BODY_SIZE: f32 = 10.5;
pub const SMALL_SIZE: f32 = 10.0;
pub const MUTED: [u8; 3] = [89, 89, 89];

/// Gap between a line's main text and its trailing dates or subtitle.
const INLINE_GAP: &str = "    ";

fn body(text: impl Into<String>) -> Run {
    Run::new(text, BODY_SIZE)
}

fn muted_note(text: &str) -> Run {
    Run::new(format!("{INLINE_GAP}{text}"), SMALL_SIZE)
        .italic()
        .color(MUTED)
}

/// Lay out the body of one section. The heading is the assembler's job.
pub fn render_section(section: &Section) -> Vec<Paragraph> {
    match &section.body {
        SectionBody::Bullets(items) => render_bullets(items),
        SectionBody::Experience(positions) => render_experience(positions),
        SectionBody::List(items) => render_list(items),
        SectionBody::Text(items) => render_text(items),
        SectionBody::Other { items, .. } => render_plain(items),
    }
}

fn render_bullets(items: &[BulletItem]) -> Vec<Paragraph> {
    items
        .iter()
        .map(|item| {
            let mut p = Paragraph::new(ParagraphStyle::ListBullet);
            match (&item.label, &item.value) {
                (Some(label), Some(value)) => {
                    p.runs.push(body(format!("{label}: ")).bold());
                    p.runs.push(body(value.as_str()));
                }
                (Some(label), None) => p.runs.push(body(label.as_str()).bold()),
                (None, Some(value)) => p.runs.push(body(value.as_str())),
                (None, None) => {}
            }
            p
        })
        .collect()
}

fn render_experience(positions: &[Position]) -> Vec<Paragraph> {
    let mut out = Vec::new();
    for pos in positions {
        let mut header = Paragraph::new(ParagraphStyle::Normal);
        if let Some(role) = &pos.role {
            header.runs.push(body(role.as_str()).bold());
        }
        if let Some(dates) = &pos.dates {
            header.runs.push(muted_note(dates));
        }
        if header.runs.is_empty() {
            log::warn!("experience entry without role or dates");
        } else {
            out.push(header);
        }

        for detail in &pos.details {
            out.push(Paragraph::new(ParagraphStyle::ListBullet).with_run(body(detail.as_str())));
        }

        if let Some(tech) = &pos.technologies {
            out.push(
                Paragraph::new(ParagraphStyle::Normal)
                    .with_run(Run::new("Technologies: ", SMALL_SIZE).bold())
                    .with_run(Run::new(tech.as_str(), SMALL_SIZE).color(MUTED)),
            );
        }
    }
    out
}

fn render_list(items: &[String]) -> Vec<Paragraph> {
    items
        .iter()
        .map(|item| Paragraph::new(ParagraphStyle::ListBullet).with_run(body(item.as_str())))
        .collect()
}

fn render_text(items: &[TextItem]) -> Vec<Paragraph> {
    items
        .iter()
        .filter(|item| item.value.is_some() || item.sub.is_some())
        .map(|item| {
            let mut p = Paragraph::new(ParagraphStyle::Normal);
            if let Some(value) = &item.value {
                p.runs.push(body(value.as_str()).bold());
            }
            if let Some(sub) = &item.sub {
                p.runs.push(muted_note(sub));
            }
            p
        })
        .collect()
}

fn render_plain(items: &[Value]) -> Vec<Paragraph> {
    items
        .iter()
        .map(|item| {
            let text = match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Paragraph::new(ParagraphStyle::Normal).with_run(body(text))
        })
        .collect()
}
