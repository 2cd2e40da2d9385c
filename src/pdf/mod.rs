mod layout;
mod surface;
mod table;

use std::collections::BTreeSet;

use pdf_writer::{Filter, Name, Pdf, Rect, Ref, TextStr};

use crate::error::Error;
use crate::fonts::{FontConfig, register_font, resolve_sources};
use crate::markdown::classify;
use crate::model::{
    BOX_FILL, ClassifiedLine, DocumentMetadata, FOOTER_INK, FontWeight, HAIRLINE, HEADING_INK, INK,
    Labels, MUTED_INK, NOTE_INK, PageGeometry, PageRange, StyleState,
};

pub use layout::{FOOTER_RESERVE, LINE_HEIGHT, LayoutEngine, Placement, block_height, wrap_text};
pub use surface::Surface;
pub use table::ROW_HEIGHT;

use surface::PdfSurface;
use table::fit_to_width;

const MISSING: &str = "—";
const SECTION_HEADER_SIZE: f32 = 16.0;
const SECTION_HEADER_GAP: f32 = 12.0;
const COVER_TITLE_LINES: usize = 3;
const COVER_SUBTITLE_LINES: usize = 2;

/// Everything about the output that is not the report itself.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    pub geometry: PageGeometry,
    pub labels: Labels,
    /// Brand printed on the cover and in every footer, unless the metadata names one.
    pub brand: String,
    pub fonts: FontConfig,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::A4,
            labels: Labels::english(),
            brand: "Kreator Akademija".to_string(),
            fonts: FontConfig::default(),
        }
    }
}

impl RenderOptions {
    fn brand<'a>(&'a self, meta: &'a DocumentMetadata) -> &'a str {
        non_empty(meta.brand.as_deref()).unwrap_or(&self.brand)
    }

    fn title<'a>(&'a self, meta: &'a DocumentMetadata) -> &'a str {
        non_empty(meta.title.as_deref()).unwrap_or(&self.labels.default_title)
    }
}

/// Result of laying out a whole document on a [`Surface`].
#[derive(Clone, Debug, PartialEq)]
pub struct Composition {
    /// Body placements in document order (cover not included).
    pub body: Vec<Placement>,
    pub pages: PageRange,
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// Cover on page 0, body from page 1, then footers on every page.
/// Footers run as a separate pass because they need the final page count.
pub fn compose<S: Surface>(
    surface: &mut S,
    lines: &[ClassifiedLine],
    meta: &DocumentMetadata,
    options: &RenderOptions,
) -> Result<Composition, Error> {
    draw_cover(surface, meta, options);

    surface.add_page();
    let body = {
        let mut engine = LayoutEngine::new(&mut *surface);
        engine.section_header(
            &options.labels.section_header,
            SECTION_HEADER_SIZE,
            SECTION_HEADER_GAP,
        );
        engine.place_all(lines);
        engine.finish()
    };

    let pages = surface.page_range();
    stamp_footers(surface, pages, options.brand(meta), &options.labels)?;
    Ok(Composition { body, pages })
}

fn draw_cover<S: Surface>(surface: &mut S, meta: &DocumentMetadata, options: &RenderOptions) {
    let geo = surface.geometry();
    let left = geo.margin;
    let width = geo.content_width();
    let labels = &options.labels;

    surface.fill_rect(0.0, 0.0, geo.width, 10.0, INK);

    let brand_style = StyleState::bold(12.0, INK);
    surface.draw_text(options.brand(meta), left, 60.0, &brand_style);

    let title_style = StyleState::bold(28.0, HEADING_INK);
    let title_lines = wrap_capped(&*surface, options.title(meta), &title_style, width, COVER_TITLE_LINES);
    let mut y = 120.0;
    for line in &title_lines {
        surface.draw_text(line, left, y, &title_style);
        y += title_style.size_pt * LINE_HEIGHT;
    }

    let subtitle_style = StyleState::regular(14.0, MUTED_INK);
    let subtitle = non_empty(meta.subtitle.as_deref()).unwrap_or(&labels.subtitle);
    let mut sy = f32::max(165.0, y + 8.0);
    for line in wrap_capped(&*surface, subtitle, &subtitle_style, width, COVER_SUBTITLE_LINES) {
        surface.draw_text(&line, left, sy, &subtitle_style);
        sy += subtitle_style.size_pt * LINE_HEIGHT;
    }

    // Above the footer band, which the cover shares with body pages
    let note_style = StyleState::regular(10.0, NOTE_INK);
    let note_lines = wrap_text(&*surface, &labels.disclaimer, &note_style, width);
    let note_h = block_height(note_lines.len(), &note_style, 0.0);
    let note_top = geo.height - geo.margin - FOOTER_RESERVE - note_h;

    let box_h = 120.0;
    let box_y = f32::max(230.0, sy + 20.0).min(note_top - box_h - 16.0);
    surface.fill_rounded_rect(left, box_y, width, box_h, 12.0, BOX_FILL);

    let created_at = non_empty(meta.created_at.as_deref())
        .map(str::to_string)
        .unwrap_or_else(today);
    let rows = [
        (&labels.date, created_at.as_str()),
        (&labels.channel, non_empty(meta.channel.as_deref()).unwrap_or(MISSING)),
        (&labels.video, non_empty(meta.video_title.as_deref()).unwrap_or(MISSING)),
        (&labels.period, non_empty(meta.period.as_deref()).unwrap_or(MISSING)),
    ];
    let key_style = StyleState::bold(10.0, HEADING_INK);
    let value_style = StyleState::regular(10.0, MUTED_INK);
    let mut row_y = box_y + 20.0;
    for (key, value) in rows {
        let key_text = fit_to_width(&*surface, &format!("{key}:"), &key_style, 118.0);
        surface.draw_text(&key_text, left + 18.0, row_y, &key_style);
        let value_text = fit_to_width(&*surface, value, &value_style, width - 160.0);
        surface.draw_text(&value_text, left + 140.0, row_y, &value_style);
        row_y += 22.0;
    }

    let mut note_y = note_top;
    for line in &note_lines {
        surface.draw_text(line, left, note_y, &note_style);
        note_y += note_style.size_pt * LINE_HEIGHT;
    }
}

/// Wrap to at most `max_lines`, cutting the last kept line with an ellipsis.
fn wrap_capped<S: Surface>(
    surface: &S,
    text: &str,
    style: &StyleState,
    width: f32,
    max_lines: usize,
) -> Vec<String> {
    let mut lines = wrap_text(surface, text, style, width);
    if lines.len() > max_lines {
        let tail = lines.split_off(max_lines - 1).join(" ");
        lines.push(fit_to_width(surface, &tail, style, width));
    }
    lines
}

fn stamp_footers<S: Surface>(
    surface: &mut S,
    pages: PageRange,
    brand: &str,
    labels: &Labels,
) -> Result<(), Error> {
    let geo = surface.geometry();
    let left = geo.margin;
    let width = geo.content_width();
    let footer_y = geo.height - geo.margin - 32.0;
    let style = StyleState::regular(9.0, FOOTER_INK);

    for i in pages.indices() {
        surface.switch_to_page(i)?;
        surface.stroke_line(left, footer_y, left + width, footer_y, HAIRLINE, 1.0);

        let brand_text = fit_to_width(&*surface, brand, &style, width / 2.0);
        surface.draw_text(&brand_text, left, footer_y + 10.0, &style);

        let number = format!("{} {} / {}", labels.page, i - pages.start + 1, pages.count);
        let number_w = surface.text_width(&number, &style);
        surface.draw_text(&number, left + width - number_w, footer_y + 10.0, &style);
    }
    Ok(())
}

fn used_chars(source: &str, meta: &DocumentMetadata, options: &RenderOptions) -> BTreeSet<char> {
    let labels = &options.labels;
    let mut used: BTreeSet<char> = BTreeSet::new();
    let texts = [
        Some(source),
        meta.title.as_deref(),
        meta.subtitle.as_deref(),
        meta.brand.as_deref(),
        meta.created_at.as_deref(),
        meta.channel.as_deref(),
        meta.video_title.as_deref(),
        meta.period.as_deref(),
        Some(options.brand.as_str()),
        Some(labels.default_title.as_str()),
        Some(labels.subtitle.as_str()),
        Some(labels.date.as_str()),
        Some(labels.channel.as_str()),
        Some(labels.video.as_str()),
        Some(labels.period.as_str()),
        Some(labels.disclaimer.as_str()),
        Some(labels.section_header.as_str()),
        Some(labels.page.as_str()),
    ];
    for text in texts.into_iter().flatten() {
        used.extend(text.chars().filter(|c| !c.is_control()));
    }
    used.extend('0'..='9');
    used.extend(" -/:•…—".chars());
    used
}

/// Render report text to PDF bytes. Identical inputs give identical bytes.
pub fn render(
    source: &str,
    meta: &DocumentMetadata,
    options: &RenderOptions,
) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    // Phase 1: classify and embed fonts for exactly the characters in use
    let lines = classify(source);
    let used = used_chars(source, meta, options);
    let t_classify = t0.elapsed();

    let (regular_src, bold_src) = resolve_sources(&options.fonts);
    let regular = register_font(
        &mut pdf,
        FontWeight::Regular,
        "F1".to_string(),
        &mut alloc,
        regular_src.as_ref(),
        &used,
    )?;
    let bold = register_font(
        &mut pdf,
        FontWeight::Bold,
        "F2".to_string(),
        &mut alloc,
        bold_src.as_ref(),
        &used,
    )?;
    let t_fonts = t0.elapsed();

    // Phase 2: cover, body and footers into buffered page streams
    let mut surface = PdfSurface::new(options.geometry, regular, bold);
    let composition = compose(&mut surface, &lines, meta, options)?;
    let (contents, regular, bold) = surface.into_parts();
    let t_layout = t0.elapsed();

    // Phase 3: page objects now that the page count is known
    let n = contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let geo = options.geometry;
    for i in 0..n {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, geo.width, geo.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        {
            let mut resources = page.resources();
            let mut fonts = resources.fonts();
            fonts.pair(Name(regular.pdf_name.as_bytes()), regular.font_ref);
            fonts.pair(Name(bold.pdf_name.as_bytes()), bold.font_ref);
        }
    }

    let info_id = alloc();
    pdf.document_info(info_id)
        .title(TextStr(options.title(meta)))
        .author(TextStr(options.brand(meta)))
        .subject(TextStr(&options.labels.subject))
        .creator(TextStr("studio-report-pdf"));

    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: classify={:.1}ms, fonts={:.1}ms, layout={:.1}ms, assembly={:.1}ms ({} lines, {} pages, {} body elements)",
        t_classify.as_secs_f64() * 1000.0,
        (t_fonts - t_classify).as_secs_f64() * 1000.0,
        (t_layout - t_fonts).as_secs_f64() * 1000.0,
        (t_assembly - t_layout).as_secs_f64() * 1000.0,
        lines.len(),
        composition.pages.count,
        composition.body.len(),
    );

    Ok(pdf.finish())
}
