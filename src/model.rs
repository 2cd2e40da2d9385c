/// RGB colour, 0-255 per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// From a `0xRRGGBB` literal.
    pub const fn hex(v: u32) -> Self {
        Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    pub(crate) fn components(self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

pub const INK: Rgb = Rgb::hex(0x111827);
pub const HEADING_INK: Rgb = Rgb::hex(0x0f172a);
pub const MUTED_INK: Rgb = Rgb::hex(0x334155);
pub const NOTE_INK: Rgb = Rgb::hex(0x64748b);
pub const FOOTER_INK: Rgb = Rgb::hex(0x6b7280);
pub const HAIRLINE: Rgb = Rgb::hex(0xe5e7eb);
pub const BOX_FILL: Rgb = Rgb::hex(0xf8fafc);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// Font, size and colour applied to the next draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StyleState {
    pub font: FontWeight,
    pub size_pt: f32,
    pub color: Rgb,
}

impl StyleState {
    pub const BODY_SIZE: f32 = 11.0;

    pub fn body() -> Self {
        Self {
            font: FontWeight::Regular,
            size_pt: Self::BODY_SIZE,
            color: INK,
        }
    }

    pub fn bold(size_pt: f32, color: Rgb) -> Self {
        Self {
            font: FontWeight::Bold,
            size_pt,
            color,
        }
    }

    pub fn regular(size_pt: f32, color: Rgb) -> Self {
        Self {
            font: FontWeight::Regular,
            size_pt,
            color,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineKind {
    Blank,
    Heading1,
    Heading2,
    Heading3,
    Bullet,
    Numbered,
    PriorityBox,
    BoldEmphasis,
    TableRow,
    Rule,
    Paragraph,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedLine {
    pub kind: LineKind,
    pub text: String,
}

impl ClassifiedLine {
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Caller-supplied facts for the cover page and the document info dictionary.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub brand: Option<String>,
    /// `YYYY-MM-DD`; today's local date when absent.
    pub created_at: Option<String>,
    pub channel: Option<String>,
    pub video_title: Option<String>,
    pub period: Option<String>,
}

/// Write position during layout: page index and top-down offset in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutCursor {
    pub page_index: usize,
    pub y: f32,
}

/// Pages `start..start + count` of a finished layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRange {
    pub start: usize,
    pub count: usize,
}

impl PageRange {
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.count
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    pub const A4: PageGeometry = PageGeometry {
        width: 595.28,
        height: 841.89,
        margin: 56.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// Fixed strings printed on the cover, the body header and footers.
#[derive(Clone, Debug, PartialEq)]
pub struct Labels {
    pub default_title: String,
    pub subtitle: String,
    pub date: String,
    pub channel: String,
    pub video: String,
    pub period: String,
    pub disclaimer: String,
    pub section_header: String,
    pub page: String,
    pub subject: String,
}

impl Labels {
    pub fn english() -> Self {
        Self {
            default_title: "Video Analyzer".into(),
            subtitle: "Detailed report".into(),
            date: "Date".into(),
            channel: "Channel".into(),
            video: "Video".into(),
            period: "Analysis period".into(),
            disclaimer: "Generated automatically. Use your own judgement for final decisions."
                .into(),
            section_header: "Detailed Report".into(),
            page: "Page".into(),
            subject: "YouTube Video Diagnostics".into(),
        }
    }

    pub fn serbian() -> Self {
        Self {
            default_title: "Video Analyzer".into(),
            subtitle: "Detaljni izveštaj".into(),
            date: "Datum".into(),
            channel: "Kanal".into(),
            video: "Video".into(),
            period: "Period analize".into(),
            disclaimer: "Generisano automatski. Koristi sopstvenu procenu za finalne odluke."
                .into(),
            section_header: "Detaljan izveštaj".into(),
            page: "Strana".into(),
            subject: "YouTube Video Dijagnostika".into(),
        }
    }

    /// `sr`/`sr-latn` select Serbian, everything else English.
    pub fn for_locale(locale: &str) -> Self {
        let l = locale.trim().to_ascii_lowercase();
        if l == "sr" || l.starts_with("sr-") || l.starts_with("sr_") {
            Self::serbian()
        } else {
            Self::english()
        }
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self::english()
    }
}
