#![allow(dead_code)]

use studio_report_pdf::Error;
use studio_report_pdf::model::{PageGeometry, PageRange, Rgb, StyleState};
use studio_report_pdf::pdf::{LINE_HEIGHT, Surface};

/// Glyph advance used by [`RecordingSurface`], as a fraction of the font size.
pub const CHAR_WIDTH: f32 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Text {
        page: usize,
        x: f32,
        y: f32,
        text: String,
        style: StyleState,
    },
    Rect {
        page: usize,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb,
        radius: f32,
    },
    Line {
        page: usize,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Rgb,
    },
}

/// Text drawn on a [`RecordingSurface`].
#[derive(Clone, Debug, PartialEq)]
pub struct DrawnText {
    pub page: usize,
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub style: StyleState,
}

impl DrawnText {
    pub fn bottom(&self) -> f32 {
        self.y + self.style.size_pt * LINE_HEIGHT
    }
}

/// In-memory surface with fixed-width glyphs that records every draw call.
pub struct RecordingSurface {
    geometry: PageGeometry,
    pages: usize,
    current: usize,
    pub ops: Vec<Op>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::with_geometry(PageGeometry::A4)
    }

    pub fn with_geometry(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: 1,
            current: 0,
            ops: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn texts(&self) -> Vec<DrawnText> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                Op::Text {
                    page,
                    x,
                    y,
                    text,
                    style,
                } => Some(DrawnText {
                    page: *page,
                    x: *x,
                    y: *y,
                    text: text.clone(),
                    style: *style,
                }),
                _ => None,
            })
            .collect()
    }

    pub fn texts_on(&self, page: usize) -> Vec<DrawnText> {
        self.texts().into_iter().filter(|t| t.page == page).collect()
    }

    pub fn find_text(&self, needle: &str) -> Option<DrawnText> {
        self.texts().into_iter().find(|t| t.text.contains(needle))
    }
}

impl Surface for RecordingSurface {
    fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    fn add_page(&mut self) {
        self.pages += 1;
        self.current = self.pages - 1;
    }

    fn switch_to_page(&mut self, index: usize) -> Result<(), Error> {
        if index >= self.pages {
            return Err(Error::PageOutOfRange {
                index,
                count: self.pages,
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
            count: self.pages,
        }
    }

    fn text_width(&self, text: &str, style: &StyleState) -> f32 {
        text.chars().count() as f32 * style.size_pt * CHAR_WIDTH
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, style: &StyleState) {
        self.ops.push(Op::Text {
            page: self.current,
            x,
            y,
            text: text.to_string(),
            style: *style,
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        self.ops.push(Op::Rect {
            page: self.current,
            x,
            y,
            w,
            h,
            color,
            radius: 0.0,
        });
    }

    fn fill_rounded_rect(&mut self, x: f32, y: f32, w: f32, h: f32, radius: f32, color: Rgb) {
        self.ops.push(Op::Rect {
            page: self.current,
            x,
            y,
            w,
            h,
            color,
            radius,
        });
    }

    fn stroke_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, color: Rgb, _width: f32) {
        self.ops.push(Op::Line {
            page: self.current,
            x1,
            y1,
            x2,
            y2,
            color,
        });
    }
}

/// A paragraph of realistic length for pagination tests.
pub const LONG_PARAGRAPH: &str = "Browse traffic converts at a lower click-through rate than Suggested, \
    but viewers who arrive from Browse stay longer, which points at the thumbnail and title rather \
    than the content itself.";

pub fn repeated_paragraphs(n: usize) -> String {
    (0..n)
        .map(|i| format!("Paragraph {}: {LONG_PARAGRAPH}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A report in the shape the chat produces: headings, lists, priorities, a table.
pub const SAMPLE_REPORT: &str = "# Final report: YouTube video diagnostic

## 1) Summary
The video loses cold audiences in the first 30 seconds. Rework the intro before touching the thumbnail.

## 2) Evidence

### By traffic source
| Source | Impressions | CTR | AVD | Views |
|--------|-------------|-----|-----|-------|
| Suggested | 120,400 | 6.1% | 3:41 | 7,340 |
| Browse | 88,900 | 3.2% | 4:05 | 2,845 |
| Search | 12,300 | 9.8% | 2:58 | 1,205 |

**Key finding**

- Non-subscribers drop 18% harder in the first 30 seconds
- Returning viewers retain **well** past the midpoint
1. Cut the cold open to under 10 seconds
2. Move the payoff preview to the first 5 seconds

🔴 PRIORITY 1: Rewrite the first 30 seconds
🟡 PRIORITET 2: Test a brighter thumbnail variant

---

Confidence: *medium*. More data from the subscriber split would raise it.";
