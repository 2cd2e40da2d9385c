use crate::markdown::{is_table_separator, table_cells};
use crate::model::{HAIRLINE, StyleState};

use super::surface::Surface;

/// Fixed height of a text row.
pub const ROW_HEIGHT: f32 = 20.0;
const SEPARATOR_HEIGHT: f32 = 6.0;
/// Horizontal padding inside the row, split between the two ends.
const ROW_PADDING: f32 = 10.0;
const CELL_PADDING: f32 = 4.0;

/// A pipe-delimited row measured for drawing: cells get equal columns and
/// never wrap; text that does not fit is cut and ends with `…`.
pub(crate) struct TableRowLayout {
    pub(crate) cells: Vec<(f32, String)>,
    pub(crate) separator: bool,
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl TableRowLayout {
    pub(crate) fn measure<S: Surface + ?Sized>(
        surface: &S,
        row: &str,
        style: &StyleState,
        content_width: f32,
    ) -> Self {
        if is_table_separator(row) {
            return Self {
                cells: Vec::new(),
                separator: true,
                width: content_width,
                height: SEPARATOR_HEIGHT,
            };
        }

        let texts = table_cells(row);
        let usable = content_width - ROW_PADDING;
        let col_w = usable / texts.len().max(1) as f32;
        let cells = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let x = ROW_PADDING / 2.0 + i as f32 * col_w;
                (x, fit_to_width(surface, &text, style, col_w - CELL_PADDING))
            })
            .collect();

        Self {
            cells,
            separator: false,
            width: content_width,
            height: ROW_HEIGHT,
        }
    }

    /// Every cell is drawn at the same `y`, left-aligned at its column offset.
    pub(crate) fn draw<S: Surface + ?Sized>(&self, surface: &mut S, left: f32, top: f32, style: &StyleState) {
        if self.separator {
            let y = top + self.height / 2.0;
            surface.stroke_line(left, y, left + self.width, y, HAIRLINE, 0.5);
            return;
        }
        let text_top = top + (self.height - style.size_pt * super::layout::LINE_HEIGHT) / 2.0;
        for (x, text) in &self.cells {
            surface.draw_text(text, left + x, text_top, style);
        }
    }
}

/// Cut `text` so it fits `max_width`, marking the cut with an ellipsis.
pub(crate) fn fit_to_width<S: Surface + ?Sized>(surface: &S, text: &str, style: &StyleState, max_width: f32) -> String {
    if surface.text_width(text, style) <= max_width {
        return text.to_string();
    }
    let ellipsis_w = surface.text_width("…", style);
    let mut out = String::new();
    let mut width = 0.0f32;
    for ch in text.chars() {
        let mut buf = [0u8; 4];
        let cw = surface.text_width(ch.encode_utf8(&mut buf), style);
        if width + cw + ellipsis_w > max_width {
            break;
        }
        out.push(ch);
        width += cw;
    }
    let trimmed = out.trim_end().to_string();
    trimmed + "…"
}
