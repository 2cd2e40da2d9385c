use std::collections::BTreeSet;

use pdf_writer::{Content, Name, Str};

use crate::error::Error;
use crate::fonts::FontEntry;
use crate::model::{FontWeight, PageGeometry, PageRange, Rgb, StyleState};

/// Drawing primitives and page management the layout is written against.
///
/// Coordinates are top-down: `y` is the distance from the top edge of the
/// page, matching the layout cursor. Implementations convert as needed.
pub trait Surface {
    fn geometry(&self) -> PageGeometry;

    /// Append a page and make it current.
    fn add_page(&mut self);

    fn switch_to_page(&mut self, index: usize) -> Result<(), Error>;

    fn current_page(&self) -> usize;

    fn page_range(&self) -> PageRange;

    /// Advance width of `text` set in `style`. Pure.
    fn text_width(&self, text: &str, style: &StyleState) -> f32;

    /// Single line of text whose top edge sits at `y`.
    fn draw_text(&mut self, text: &str, x: f32, y: f32, style: &StyleState);

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb);

    fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Rgb);

    fn stroke_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Rgb, width: f32);
}

/// Cubic Bezier control-point factor for quarter circles.
const KAPPA: f32 = 0.552_284_8;

/// [`Surface`] over pdf-writer content streams, one buffered stream per page.
pub(crate) struct PdfSurface {
    geometry: PageGeometry,
    pages: Vec<Content>,
    current: usize,
    regular: FontEntry,
    bold: FontEntry,
    unencodable: BTreeSet<char>,
}

impl PdfSurface {
    pub(crate) fn new(geometry: PageGeometry, regular: FontEntry, bold: FontEntry) -> Self {
        Self {
            geometry,
            pages: vec![Content::new()],
            current: 0,
            regular,
            bold,
            unencodable: BTreeSet::new(),
        }
    }

    fn font(&self, weight: FontWeight) -> &FontEntry {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }

    fn pdf_y(&self, y: f32) -> f32 {
        self.geometry.height - y
    }

    fn content(&mut self) -> &mut Content {
        &mut self.pages[self.current]
    }

    /// Hand back the finished page streams and the two font entries.
    pub(crate) fn into_parts(self) -> (Vec<Content>, FontEntry, FontEntry) {
        if !self.unencodable.is_empty() {
            let sample: String = self.unencodable.iter().take(16).collect();
            log::warn!(
                "{} characters have no glyph in the selected fonts and were dropped or replaced: {sample}",
                self.unencodable.len(),
            );
        }
        (self.pages, self.regular, self.bold)
    }
}

impl Surface for PdfSurface {
    fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    fn add_page(&mut self) {
        self.pages.push(Content::new());
        self.current = self.pages.len() - 1;
    }

    fn switch_to_page(&mut self, index: usize) -> Result<(), Error> {
        if index >= self.pages.len() {
            return Err(Error::PageOutOfRange {
                index,
                count: self.pages.len(),
            });
        }
        self.current = index;
        Ok(())
    }

    fn current_page(&self) -> usize {
        self.current
    }

    fn page_range(&self) -> PageRange {
        PageRange {
            start: 0,
            count: self.pages.len(),
        }
    }

    fn text_width(&self, text: &str, style: &StyleState) -> f32 {
        self.font(style.font).word_width(text, style.size_pt)
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, style: &StyleState) {
        if text.is_empty() {
            return;
        }
        let font = self.font(style.font);
        let missing: Vec<char> = text
            .chars()
            .filter(|&c| !c.is_whitespace() && !font.covers(c))
            .collect();
        let bytes = font.encode(text);
        let pdf_name = font.pdf_name.clone();
        let baseline = self.pdf_y(y) - style.size_pt * font.ascender_ratio;
        self.unencodable.extend(missing);

        let (r, g, b) = style.color.components();
        let content = self.content();
        content.save_state();
        content.set_fill_rgb(r, g, b);
        content.begin_text();
        content.set_font(Name(pdf_name.as_bytes()), style.size_pt);
        content.next_line(x, baseline);
        content.show(Str(&bytes));
        content.end_text();
        content.restore_state();
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        let bottom = self.pdf_y(y) - h;
        let (r, g, b) = color.components();
        let content = self.content();
        content.save_state();
        content.set_fill_rgb(r, g, b);
        content.rect(x, bottom, w, h).fill_nonzero();
        content.restore_state();
    }

    fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Rgb) {
        let rad = radius.min(w / 2.0).min(h / 2.0).max(0.0);
        let top = self.pdf_y(y);
        let bottom = top - h;
        let right = x + w;
        let k = rad * KAPPA;
        let (r, g, b) = color.components();
        let content = self.content();
        content.save_state();
        content.set_fill_rgb(r, g, b);
        content.move_to(x + rad, bottom);
        content.line_to(right - rad, bottom);
        content.cubic_to(right - rad + k, bottom, right, bottom + rad - k, right, bottom + rad);
        content.line_to(right, top - rad);
        content.cubic_to(right, top - rad + k, right - rad + k, top, right - rad, top);
        content.line_to(x + rad, top);
        content.cubic_to(x + rad - k, top, x, top - rad + k, x, top - rad);
        content.line_to(x, bottom + rad);
        content.cubic_to(x, bottom + rad - k, x + rad - k, bottom, x + rad, bottom);
        content.close_path();
        content.fill_nonzero();
        content.restore_state();
    }

    fn stroke_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Rgb, width: f32) {
        let (py1, py2) = (self.pdf_y(y1), self.pdf_y(y2));
        let (r, g, b) = color.components();
        let content = self.content();
        content.save_state();
        content.set_line_width(width);
        content.set_stroke_rgb(r, g, b);
        content.move_to(x1, py1);
        content.line_to(x2, py2);
        content.stroke();
        content.restore_state();
    }
}
