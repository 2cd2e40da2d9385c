use crate::model::{
    BOX_FILL, ClassifiedLine, HAIRLINE, HEADING_INK, INK, LayoutCursor, LineKind, StyleState,
};

use super::surface::Surface;
use super::table::TableRowLayout;

/// Band above the bottom margin kept free for the footer.
pub const FOOTER_RESERVE: f32 = 48.0;

/// Natural line height as a multiple of the font size.
pub const LINE_HEIGHT: f32 = 1.2;

const BLANK_GAP: f32 = 8.0;
const BODY_LINE_GAP: f32 = 3.0;
const LIST_INDENT: f32 = 10.0;
const BOX_MIN_HEIGHT: f32 = 32.0;
const BOX_RADIUS: f32 = 8.0;
const BOX_INSET_X: f32 = 12.0;
const BOX_INSET_Y: f32 = 10.0;
const BOX_LINE_GAP: f32 = 2.0;
const RULE_GAP: f32 = 12.0;

/// Vertical extent of one placed element on one page.
/// A block split across a page break yields one placement per page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub page: usize,
    pub kind: LineKind,
    pub top: f32,
    pub bottom: f32,
}

/// Greedy whitespace wrapping against the surface's measurements.
/// Words wider than the line are broken at character boundaries.
pub fn wrap_text<S: Surface + ?Sized>(
    surface: &S,
    text: &str,
    style: &StyleState,
    max_width: f32,
) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let space_w = surface.text_width(" ", style);
    let mut current_w = 0.0f32;

    for word in text.split_whitespace() {
        let ww = surface.text_width(word, style);
        let proposed = if current.is_empty() {
            ww
        } else {
            current_w + space_w + ww
        };

        if proposed <= max_width || (current.is_empty() && ww <= max_width) {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_w = proposed;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current_w = 0.0;
        }

        if ww <= max_width {
            current.push_str(word);
            current_w = ww;
        } else {
            for ch in word.chars() {
                let mut buf = [0u8; 4];
                let cw = surface.text_width(ch.encode_utf8(&mut buf), style);
                if !current.is_empty() && current_w + cw > max_width {
                    lines.push(std::mem::take(&mut current));
                    current_w = 0.0;
                }
                current.push(ch);
                current_w += cw;
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Height of `n` wrapped lines with `line_gap` between them.
pub fn block_height(n: usize, style: &StyleState, line_gap: f32) -> f32 {
    if n == 0 {
        return 0.0;
    }
    n as f32 * style.size_pt * LINE_HEIGHT + (n - 1) as f32 * line_gap
}

/// Walks classified lines top to bottom, breaking pages before anything
/// that would cross into the footer reserve.
pub struct LayoutEngine<'s, S: Surface> {
    surface: &'s mut S,
    left: f32,
    content_width: f32,
    top: f32,
    bottom_limit: f32,
    cursor: LayoutCursor,
    style: StyleState,
    placements: Vec<Placement>,
}

impl<'s, S: Surface> LayoutEngine<'s, S> {
    /// Start at the top of the surface's current page.
    pub fn new(surface: &'s mut S) -> Self {
        let geo = surface.geometry();
        let page_index = surface.current_page();
        Self {
            left: geo.margin,
            content_width: geo.content_width(),
            top: geo.margin,
            bottom_limit: geo.height - geo.margin - FOOTER_RESERVE,
            cursor: LayoutCursor {
                page_index,
                y: geo.margin,
            },
            style: StyleState::body(),
            surface,
            placements: Vec::new(),
        }
    }

    pub fn cursor(&self) -> LayoutCursor {
        self.cursor
    }

    pub fn style(&self) -> StyleState {
        self.style
    }

    pub fn bottom_limit(&self) -> f32 {
        self.bottom_limit
    }

    /// Move down by `dy`, stopping at the bottom limit.
    pub fn advance(&mut self, dy: f32) {
        self.cursor.y = (self.cursor.y + dy).min(self.bottom_limit);
    }

    /// Break to a new page when `needed` points do not fit below the cursor.
    /// Returns whether a break happened.
    pub fn ensure_space(&mut self, needed: f32) -> bool {
        let at_top = (self.cursor.y - self.top).abs() < f32::EPSILON;
        if self.cursor.y + needed <= self.bottom_limit || at_top {
            return false;
        }
        self.surface.add_page();
        self.cursor = LayoutCursor {
            page_index: self.surface.current_page(),
            y: self.top,
        };
        log::debug!("page break → page {}", self.cursor.page_index);
        true
    }

    fn record(&mut self, kind: LineKind, top: f32, bottom: f32) {
        self.placements.push(Placement {
            page: self.cursor.page_index,
            kind,
            top,
            bottom,
        });
    }

    fn reset_style(&mut self) {
        self.style = StyleState::body();
    }

    pub fn place_all<'a>(&mut self, lines: impl IntoIterator<Item = &'a ClassifiedLine>) {
        for line in lines {
            self.place(line);
        }
    }

    pub fn place(&mut self, line: &ClassifiedLine) {
        match line.kind {
            LineKind::Blank => self.advance(BLANK_GAP),
            LineKind::Heading1 => self.heading(line, 18.0),
            LineKind::Heading2 => self.heading(line, 14.0),
            LineKind::Heading3 => self.heading(line, 12.0),
            LineKind::PriorityBox => self.priority_box(line),
            LineKind::Bullet => {
                let text = format!("• {}", line.text);
                self.style = StyleState::body();
                self.wrapped_block(LineKind::Bullet, &text, LIST_INDENT, 16.0, BODY_LINE_GAP);
                self.advance(3.0);
            }
            LineKind::Numbered => {
                self.style = StyleState::body();
                self.wrapped_block(LineKind::Numbered, &line.text, LIST_INDENT, 16.0, BODY_LINE_GAP);
                self.advance(3.0);
            }
            LineKind::BoldEmphasis => {
                self.style = StyleState::bold(StyleState::BODY_SIZE, HEADING_INK);
                self.wrapped_block(LineKind::BoldEmphasis, &line.text, 0.0, 16.0, BODY_LINE_GAP);
                self.advance(4.0);
            }
            LineKind::TableRow => self.table_row(line),
            LineKind::Rule => {
                self.ensure_space(RULE_GAP);
                let y = self.cursor.y + RULE_GAP / 2.0;
                self.surface
                    .stroke_line(self.left, y, self.left + self.content_width, y, HAIRLINE, 0.75);
                self.record(LineKind::Rule, y, y);
                self.advance(RULE_GAP);
            }
            LineKind::Paragraph => {
                self.style = StyleState::body();
                self.wrapped_block(LineKind::Paragraph, &line.text, 0.0, 18.0, BODY_LINE_GAP);
                self.advance(5.0);
            }
        }
        self.reset_style();
    }

    /// Bold section title outside the classified stream (e.g. the body header).
    pub fn section_header(&mut self, text: &str, size: f32, gap_after: f32) {
        self.style = StyleState::bold(size, HEADING_INK);
        self.wrapped_block(LineKind::Heading1, text, 0.0, size + 14.0, 0.0);
        self.advance(gap_after);
        self.reset_style();
    }

    fn heading(&mut self, line: &ClassifiedLine, size: f32) {
        self.style = StyleState::bold(size, HEADING_INK);
        self.wrapped_block(line.kind, &line.text, 0.0, size + 14.0, 0.0);
        self.advance(6.0);
    }

    /// Draw `text` wrapped to the content width minus `indent`, in the current style.
    /// A block that fits on a page is kept together; taller blocks flow line by line.
    fn wrapped_block(&mut self, kind: LineKind, text: &str, indent: f32, estimate: f32, line_gap: f32) {
        let style = self.style;
        let x = self.left + indent;
        let width = self.content_width - indent;
        let lines = wrap_text(&*self.surface, text, &style, width);
        let line_h = style.size_pt * LINE_HEIGHT;
        let height = block_height(lines.len(), &style, line_gap);
        let usable = self.bottom_limit - self.top;

        if height.max(estimate) <= usable {
            self.ensure_space(height.max(estimate));
            let top = self.cursor.y;
            for (i, l) in lines.iter().enumerate() {
                let y = top + i as f32 * (line_h + line_gap);
                self.surface.draw_text(l, x, y, &style);
            }
            self.record(kind, top, top + height);
            self.cursor.y = top + height;
            return;
        }

        let mut seg_top = self.cursor.y;
        for (i, l) in lines.iter().enumerate() {
            let gap = if i == 0 { 0.0 } else { line_gap };
            if self.cursor.y + gap + line_h > self.bottom_limit {
                if self.cursor.y > seg_top {
                    self.record(kind, seg_top, self.cursor.y);
                }
                self.ensure_space(gap + line_h);
                seg_top = self.cursor.y;
            } else {
                self.cursor.y += gap;
            }
            self.surface.draw_text(l, x, self.cursor.y, &style);
            self.cursor.y += line_h;
        }
        self.record(kind, seg_top, self.cursor.y);
    }

    fn priority_box(&mut self, line: &ClassifiedLine) {
        self.style = StyleState::bold(12.0, INK);
        let style = self.style;
        let inner_w = self.content_width - 2.0 * BOX_INSET_X;
        let lines = wrap_text(&*self.surface, &line.text, &style, inner_w);
        let text_h = block_height(lines.len(), &style, BOX_LINE_GAP);
        let box_h = BOX_MIN_HEIGHT.max(text_h + 2.0 * BOX_INSET_Y);
        let usable = self.bottom_limit - self.top;

        if box_h <= usable {
            self.ensure_space((box_h + 16.0).max(48.0).min(usable));
            let top = self.cursor.y;
            self.surface
                .fill_rounded_rect(self.left, top, self.content_width, box_h, BOX_RADIUS, BOX_FILL);
            self.box_lines(&lines, top, &style);
            self.record(LineKind::PriorityBox, top, top + box_h);
            self.cursor.y = top + box_h;
        } else {
            self.split_priority_box(&lines, &style);
        }
        self.advance(10.0);
    }

    /// One box segment per page, each holding as many lines as fit above the limit.
    fn split_priority_box(&mut self, lines: &[String], style: &StyleState) {
        let line_h = style.size_pt * LINE_HEIGHT;
        let pitch = line_h + BOX_LINE_GAP;
        let mut rest = lines;
        while !rest.is_empty() {
            self.ensure_space(2.0 * BOX_INSET_Y + line_h);
            let top = self.cursor.y;
            let room = self.bottom_limit - top - 2.0 * BOX_INSET_Y;
            let fit = (((room + BOX_LINE_GAP) / pitch).floor() as usize).clamp(1, rest.len());
            let (segment, tail) = rest.split_at(fit);
            let seg_h = block_height(segment.len(), style, BOX_LINE_GAP) + 2.0 * BOX_INSET_Y;
            self.surface
                .fill_rounded_rect(self.left, top, self.content_width, seg_h, BOX_RADIUS, BOX_FILL);
            self.box_lines(segment, top, style);
            self.record(LineKind::PriorityBox, top, top + seg_h);
            self.cursor.y = top + seg_h;
            rest = tail;
        }
    }

    fn box_lines(&mut self, lines: &[String], top: f32, style: &StyleState) {
        let line_h = style.size_pt * LINE_HEIGHT;
        for (i, l) in lines.iter().enumerate() {
            let y = top + BOX_INSET_Y + i as f32 * (line_h + BOX_LINE_GAP);
            self.surface.draw_text(l, self.left + BOX_INSET_X, y, style);
        }
    }

    fn table_row(&mut self, line: &ClassifiedLine) {
        let style = StyleState::body();
        self.style = style;
        let row = TableRowLayout::measure(&*self.surface, &line.text, &style, self.content_width);
        self.ensure_space(row.height);
        let top = self.cursor.y;
        row.draw(&mut *self.surface, self.left, top, &style);
        self.record(LineKind::TableRow, top, top + row.height);
        self.cursor.y = top + row.height;
    }

    /// Finish and return every recorded placement in document order.
    pub fn finish(self) -> Vec<Placement> {
        self.placements
    }
}
