//! PDF typesetting for [`TripReport`]s
//!
//! Blocks are laid out into positioned drawing operations first, then painted
//! with `printpdf` using the built-in Helvetica faces. Input text is expected
//! to be ASCII already (see [`super::to_pdf_text`]). Coordinates are in points
//! from the bottom-left corner of an A4 page.

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, Greyscale, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Polygon, Rgb,
};

use super::{Block, TripReport};
use crate::{Result, TripPlannerError};

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN_X: f32 = 50.0;
const CONTENT_TOP: f32 = PAGE_HEIGHT - 80.0;
const CONTENT_BOTTOM: f32 = 60.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;

const HEADER_TEXT: &str = "AI Trip Planner";
const HEADER_Y: f32 = PAGE_HEIGHT - 45.0;
const FOOTER_Y: f32 = 30.0;
const BULLET_INDENT: f32 = 15.0;
const CELL_PADDING: f32 = 4.0;
const TABLE_BLUE: Shade = Shade::Rgb(0.27, 0.51, 0.71);

/// Advance widths of Helvetica for ASCII 32..=126, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Advance widths of Helvetica-Bold for ASCII 32..=126
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    /// Helvetica-Oblique shares the regular metrics
    Italic,
}

impl Font {
    fn widths(self) -> &'static [u16; 95] {
        match self {
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
            Font::Regular | Font::Italic => &HELVETICA_WIDTHS,
        }
    }
}

fn char_width(ch: char, font: Font) -> u16 {
    match u32::from(ch) {
        code @ 32..=126 => font.widths()[(code - 32) as usize],
        _ => 556,
    }
}

/// Rendered width of `text` in points
#[must_use]
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text.chars().map(|ch| u32::from(char_width(ch, font))).sum();
    units as f32 * size / 1000.0
}

/// Greedy word wrap; words longer than a line are split
#[must_use]
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let fits = |candidate: &str| text_width(candidate, font, size) <= max_width;
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if fits(&candidate) {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        for ch in word.chars() {
            current.push(ch);
            if !fits(&current) && current.len() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shade {
    Gray(f32),
    Rgb(f32, f32, f32),
}

impl Shade {
    const BLACK: Shade = Shade::Gray(0.0);

    fn color(self) -> Color {
        match self {
            Shade::Gray(level) => Color::Greyscale(Greyscale::new(level, None)),
            Shade::Rgb(r, g, b) => Color::Rgb(Rgb::new(r, g, b, None)),
        }
    }
}

/// One positioned drawing operation
#[derive(Debug, Clone, PartialEq)]
enum Op {
    Text {
        x: f32,
        y: f32,
        font: Font,
        size: f32,
        shade: Shade,
        text: String,
    },
    /// Horizontal rule across the content width
    Rule { y: f32 },
    /// Filled, outlined table cell; `y` is its bottom edge
    Cell {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Shade,
    },
}

#[derive(Clone, Copy)]
enum RowStyle {
    Header,
    /// `true` for shaded rows
    Body(bool),
    Total,
}

/// Flows blocks down the page, breaking to a new page when content runs out
struct Layout {
    pages: Vec<Vec<Op>>,
    ops: Vec<Op>,
    y: f32,
}

impl Layout {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            ops: Vec::new(),
            y: CONTENT_TOP,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.ops));
        self.y = CONTENT_TOP;
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height < CONTENT_BOTTOM && self.y < CONTENT_TOP {
            self.new_page();
        }
    }

    fn gap(&mut self, height: f32) {
        self.y = (self.y - height).max(CONTENT_BOTTOM);
    }

    fn text_at(&mut self, x: f32, y: f32, font: Font, size: f32, shade: Shade, text: &str) {
        self.ops.push(Op::Text {
            x,
            y,
            font,
            size,
            shade,
            text: text.to_string(),
        });
    }

    fn line(&mut self, x: f32, font: Font, size: f32, leading: f32, shade: Shade, text: &str) {
        self.ensure_space(leading);
        self.y -= leading;
        let baseline = self.y + leading * 0.25;
        self.text_at(x, baseline, font, size, shade, text);
    }

    fn centered(&mut self, font: Font, size: f32, leading: f32, text: &str) {
        let x = ((PAGE_WIDTH - text_width(text, font, size)) / 2.0).max(MARGIN_X);
        self.line(x, font, size, leading, Shade::BLACK, text);
    }

    fn wrapped(&mut self, font: Font, size: f32, leading: f32, text: &str) {
        for line in wrap_text(text, font, size, CONTENT_WIDTH) {
            self.line(MARGIN_X, font, size, leading, Shade::BLACK, &line);
        }
    }

    fn table_row(&mut self, cells: &[String], widths: &[f32], style: RowStyle) {
        let (font, size, leading) = match style {
            RowStyle::Header | RowStyle::Total => (Font::Bold, 10.5, 13.0),
            RowStyle::Body(_) => (Font::Regular, 10.0, 13.0),
        };
        let (fill, ink) = match style {
            RowStyle::Header | RowStyle::Total => (TABLE_BLUE, Shade::Gray(1.0)),
            RowStyle::Body(true) => (Shade::Gray(0.96), Shade::BLACK),
            RowStyle::Body(false) => (Shade::Gray(1.0), Shade::BLACK),
        };

        let column_widths: Vec<f32> = widths.iter().map(|w| w * CONTENT_WIDTH).collect();
        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(&column_widths)
            .map(|(cell, width)| wrap_text(cell, font, size, width - 2.0 * CELL_PADDING))
            .collect();
        let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let height = line_count as f32 * leading + 2.0 * CELL_PADDING;

        self.ensure_space(height);
        let top = self.y;
        let bottom = top - height;

        let mut x = MARGIN_X;
        for (lines, &width) in wrapped.iter().zip(&column_widths) {
            self.ops.push(Op::Cell {
                x,
                y: bottom,
                width,
                height,
                fill,
            });
            for (i, text) in lines.iter().enumerate() {
                let baseline = top - CELL_PADDING - (i as f32 + 1.0) * leading + leading * 0.25;
                // amounts line up on the right edge
                let text_x = if text.contains("Rs.") {
                    x + width - CELL_PADDING - text_width(text, font, size)
                } else {
                    x + CELL_PADDING
                };
                self.text_at(text_x, baseline, font, size, ink, text);
            }
            x += width;
        }
        self.y = bottom;
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Title { heading, lines } => {
                self.centered(Font::Bold, 22.0, 30.0, heading);
                self.gap(4.0);
                for line in lines {
                    self.centered(Font::Regular, 12.0, 16.0, line);
                }
                self.gap(10.0);
            }
            Block::Section(title) => {
                self.ensure_space(60.0);
                self.gap(12.0);
                self.line(MARGIN_X, Font::Bold, 14.0, 20.0, Shade::BLACK, title);
                self.ops.push(Op::Rule { y: self.y });
                self.gap(6.0);
            }
            Block::Subheading(text) => {
                self.ensure_space(40.0);
                self.gap(6.0);
                self.wrapped(Font::Bold, 12.0, 16.0, text);
            }
            Block::Paragraph(text) => {
                self.wrapped(Font::Regular, 11.0, 15.0, text);
                self.gap(4.0);
            }
            Block::Bullet(text) => {
                let lines = wrap_text(text, Font::Regular, 11.0, CONTENT_WIDTH - BULLET_INDENT);
                for (i, line) in lines.iter().enumerate() {
                    let x = MARGIN_X + BULLET_INDENT;
                    self.line(x, Font::Regular, 11.0, 15.0, Shade::BLACK, line);
                    if i == 0 {
                        let baseline = self.y + 15.0 * 0.25;
                        self.text_at(MARGIN_X, baseline, Font::Regular, 11.0, Shade::BLACK, "-");
                    }
                }
                self.gap(1.0);
            }
            Block::Table {
                headers,
                rows,
                total,
                widths,
            } => {
                self.table_row(headers, widths, RowStyle::Header);
                for (i, row) in rows.iter().enumerate() {
                    self.table_row(row, widths, RowStyle::Body(i % 2 == 0));
                }
                self.table_row(total, widths, RowStyle::Total);
                self.gap(8.0);
            }
            Block::Closing(text) => {
                self.gap(10.0);
                for line in wrap_text(text, Font::Italic, 11.0, CONTENT_WIDTH) {
                    self.line(MARGIN_X, Font::Italic, 11.0, 15.0, Shade::Gray(0.4), &line);
                }
            }
        }
    }

    /// Close the last page and add the running header and page footer
    fn finish(mut self) -> Vec<Vec<Op>> {
        self.pages.push(std::mem::take(&mut self.ops));
        let header_x = (PAGE_WIDTH - text_width(HEADER_TEXT, Font::Bold, 16.0)) / 2.0;

        for (i, ops) in self.pages.iter_mut().enumerate() {
            let footer = format!("Page {}", i + 1);
            let footer_x = (PAGE_WIDTH - text_width(&footer, Font::Italic, 8.0)) / 2.0;
            ops.push(Op::Text {
                x: header_x,
                y: HEADER_Y,
                font: Font::Bold,
                size: 16.0,
                shade: Shade::Gray(0.27),
                text: HEADER_TEXT.to_string(),
            });
            ops.push(Op::Text {
                x: footer_x,
                y: FOOTER_Y,
                font: Font::Italic,
                size: 8.0,
                shade: Shade::Gray(0.5),
                text: footer,
            });
        }
        self.pages
    }
}

fn layout(report: &TripReport) -> Vec<Vec<Op>> {
    let mut layout = Layout::new();
    for block in &report.blocks {
        layout.block(block);
    }
    layout.finish()
}

fn mm(points: f32) -> Mm {
    Mm(points * 25.4 / 72.0)
}

fn point(x: f32, y: f32) -> (Point, bool) {
    (Point::new(mm(x), mm(y)), false)
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self> {
        let load = |font| {
            doc.add_builtin_font(font)
                .map_err(|e| TripPlannerError::render(format!("could not load PDF font: {e}")))
        };
        Ok(Self {
            regular: load(BuiltinFont::Helvetica)?,
            bold: load(BuiltinFont::HelveticaBold)?,
            italic: load(BuiltinFont::HelveticaOblique)?,
        })
    }

    fn get(&self, font: Font) -> &IndirectFontRef {
        match font {
            Font::Regular => &self.regular,
            Font::Bold => &self.bold,
            Font::Italic => &self.italic,
        }
    }
}

fn paint(layer: &PdfLayerReference, ops: &[Op], fonts: &Fonts) {
    layer.set_outline_thickness(0.5);
    for op in ops {
        match op {
            Op::Text {
                x,
                y,
                font,
                size,
                shade,
                text,
            } => {
                layer.set_fill_color(shade.color());
                layer.use_text(text.as_str(), *size, mm(*x), mm(*y), fonts.get(*font));
            }
            Op::Rule { y } => {
                layer.set_outline_color(Shade::BLACK.color());
                layer.add_line(Line {
                    points: vec![point(MARGIN_X, *y), point(PAGE_WIDTH - MARGIN_X, *y)],
                    is_closed: false,
                });
            }
            Op::Cell {
                x,
                y,
                width,
                height,
                fill,
            } => {
                layer.set_fill_color(fill.color());
                layer.set_outline_color(Shade::BLACK.color());
                layer.add_polygon(Polygon {
                    rings: vec![vec![
                        point(*x, *y),
                        point(x + width, *y),
                        point(x + width, y + height),
                        point(*x, y + height),
                    ]],
                    mode: PaintMode::FillStroke,
                    winding_order: WindingOrder::NonZero,
                });
            }
        }
    }
}

/// Typeset `report` as a PDF document
pub fn render_pdf(report: &TripReport) -> Result<Vec<u8>> {
    let pages = layout(report);
    let (doc, first_page, first_layer) = PdfDocument::new(
        report.title.as_str(),
        mm(PAGE_WIDTH),
        mm(PAGE_HEIGHT),
        "Itinerary",
    );
    let fonts = Fonts::load(&doc)?;

    for (i, ops) in pages.iter().enumerate() {
        let (page, layer) = if i == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(mm(PAGE_WIDTH), mm(PAGE_HEIGHT), "Itinerary")
        };
        paint(&doc.get_page(page).get_layer(layer), ops, &fonts);
    }

    doc.save_to_bytes()
        .map_err(|e| TripPlannerError::render(format!("could not write PDF: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(blocks: Vec<Block>) -> TripReport {
        TripReport {
            title: "Trip Plan to Paris".to_string(),
            blocks,
        }
    }

    fn texts(ops: &[Op]) -> Vec<&str> {
        ops.iter()
            .filter_map(|op| match op {
                Op::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_text_width_uses_font_metrics() {
        assert!((text_width("ii", Font::Regular, 10.0) - 4.44).abs() < 0.001);
        assert!((text_width("ii", Font::Bold, 10.0) - 5.56).abs() < 0.001);
        // same advance in both faces
        assert_eq!(
            text_width("MM", Font::Bold, 10.0),
            text_width("MM", Font::Regular, 10.0)
        );
        let amount = "Rs. 1,000";
        assert!(text_width(amount, Font::Bold, 10.0) > text_width(amount, Font::Regular, 10.0));
        assert_eq!(
            text_width("Louvre", Font::Italic, 11.0),
            text_width("Louvre", Font::Regular, 11.0)
        );
    }

    #[test]
    fn test_wrap_respects_width() {
        let text = "Morning visit to the Louvre followed by a long lunch in the Marais district";
        for font in [Font::Regular, Font::Bold] {
            let lines = wrap_text(text, font, 11.0, 150.0);
            assert!(lines.len() > 1);
            for line in &lines {
                assert!(text_width(line, font, 11.0) <= 150.0, "too wide: {line}");
            }
            assert_eq!(lines.join(" "), text);
        }
    }

    #[test]
    fn test_wrap_splits_overlong_words() {
        let word = "x".repeat(100);
        let lines = wrap_text(&word, Font::Regular, 10.0, 50.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
        assert!(wrap_text("   ", Font::Regular, 10.0, 50.0).is_empty());
    }

    #[test]
    fn test_every_page_has_header_and_footer() {
        let blocks = (0..200)
            .map(|i| Block::Bullet(format!("Activity number {i} with a short description")))
            .collect();
        let pages = layout(&report(blocks));

        assert!(pages.len() > 1);
        for (i, ops) in pages.iter().enumerate() {
            let texts = texts(ops);
            assert!(texts.contains(&HEADER_TEXT));
            assert!(texts.contains(&format!("Page {}", i + 1).as_str()));
        }
    }

    #[test]
    fn test_body_text_stays_inside_content_area() {
        let mut blocks = vec![Block::Section("Your Itinerary".to_string())];
        blocks.extend((0..120).map(|i| {
            Block::Paragraph(format!("Day {i}: a long walk along the river and dinner in town"))
        }));
        for ops in layout(&report(blocks)) {
            for op in &ops {
                if let Op::Text { y, text, .. } = op {
                    if text != HEADER_TEXT && !text.starts_with("Page ") {
                        assert!(*y >= CONTENT_BOTTOM && *y <= CONTENT_TOP, "{text} at {y}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_table_cells_and_alignment() {
        let pages = layout(&report(vec![Block::Table {
            headers: vec!["Category".to_string(), "Allocated Budget".to_string()],
            rows: vec![vec!["Food & Dining".to_string(), "Rs. 200".to_string()]],
            total: vec!["TOTAL BUDGET".to_string(), "Rs. 1,000".to_string()],
            widths: vec![0.5, 0.5],
        }]));
        let ops = &pages[0];

        let fills: Vec<Shade> = ops
            .iter()
            .filter_map(|op| match op {
                Op::Cell { fill, .. } => Some(*fill),
                _ => None,
            })
            .collect();
        assert_eq!(fills.len(), 6);
        assert_eq!(fills[0], TABLE_BLUE);
        assert_eq!(fills[2], Shade::Gray(0.96));
        assert_eq!(fills[5], TABLE_BLUE);

        let amount = ops
            .iter()
            .find_map(|op| match op {
                Op::Text { x, text, font, size, .. } if text == "Rs. 200" => {
                    Some(x + text_width(text, *font, *size))
                }
                _ => None,
            })
            .unwrap();
        let right_edge = MARGIN_X + CONTENT_WIDTH - CELL_PADDING;
        assert!((amount - right_edge).abs() < 0.01);
    }

    #[test]
    fn test_section_draws_rule() {
        let pages = layout(&report(vec![Block::Section("Trip Overview".to_string())]));
        assert!(pages[0].iter().any(|op| matches!(op, Op::Rule { .. })));
        assert!(texts(&pages[0]).contains(&"Trip Overview"));
    }

    #[test]
    fn test_render_pdf_writes_document() {
        let bytes = render_pdf(&report(vec![
            Block::Section("Trip Overview".to_string()),
            Block::Paragraph("Three days in Paris.".to_string()),
        ]))
        .unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(bytes.len() > 200);
    }
}
