//! Flow-document model shared by the renderer, the DOCX writer and the DOCX reader.
//!
//! Lengths are in points unless a field says otherwise.

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParagraphStyle {
    #[default]
    Normal,
    ListBullet,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub default_font: String,
    pub default_font_size: f32,
    pub blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            page_width: 612.0,
            page_height: 792.0,
            margin_top: 72.0,
            margin_bottom: 72.0,
            margin_left: 72.0,
            margin_right: 72.0,
            default_font: String::from("Calibri"),
            default_font_size: 11.0,
            blocks: Vec::new(),
        }
    }
}

impl Document {
    /// Paragraphs in reading order, descending into table cells row by row.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().flat_map(Block::paragraphs)
    }

    /// Top-level paragraphs only, skipping tables.
    pub fn body_paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

impl Block {
    pub fn paragraphs(&self) -> Box<dyn Iterator<Item = &Paragraph> + '_> {
        match self {
            Block::Paragraph(p) => Box::new(std::iter::once(p)),
            Block::Table(t) => Box::new(
                t.rows
                    .iter()
                    .flat_map(|row| row.iter())
                    .flat_map(|cell| cell.paragraphs.iter()),
            ),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub column_widths: Vec<f32>,
    pub rows: Vec<Vec<Cell>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub width: f32,
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddedImage {
    /// PNG bytes.
    pub data: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub display_width: f32,
    pub display_height: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub runs: Vec<Run>,
    pub space_before: Option<f32>,
    pub space_after: Option<f32>,
    pub alignment: Alignment,
    pub shading: Option<[u8; 3]>,
    pub image: Option<EmbeddedImage>,
}

impl Paragraph {
    pub fn new(style: ParagraphStyle) -> Self {
        Paragraph { style, ..Default::default() }
    }

    pub fn with_run(mut self, run: Run) -> Self {
        self.runs.push(run);
        self
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_bullet(&self) -> bool {
        self.style == ParagraphStyle::ListBullet
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Run {
    pub text: String,
    pub font_size: f32,
    pub font_name: String,
    pub bold: bool,
    pub italic: bool,
    pub color: Option<[u8; 3]>, // None = automatic (black)
}

impl Run {
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        Run {
            text: text.into(),
            font_size,
            font_name: String::from("Calibri"),
            bold: false,
            italic: false,
            color: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, rgb: [u8; 3]) -> Self {
        self.color = Some(rgb);
        self
    }
}
