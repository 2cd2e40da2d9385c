mod common;

use common::{Op, RecordingSurface};
use studio_report_pdf::model::{BOX_FILL, FontWeight, PageGeometry, StyleState};
use studio_report_pdf::pdf::{FOOTER_RESERVE, LayoutEngine, Placement, ROW_HEIGHT, wrap_text};
use studio_report_pdf::{LineKind, classify, classify_line};

const EPS: f32 = 0.01;

fn lay_out(source: &str) -> (RecordingSurface, Vec<Placement>, f32) {
    let mut surface = RecordingSurface::new();
    let (placements, limit) = {
        let mut engine = LayoutEngine::new(&mut surface);
        let limit = engine.bottom_limit();
        engine.place_all(&classify(source));
        (engine.finish(), limit)
    };
    (surface, placements, limit)
}

#[test]
fn bottom_limit_reserves_the_footer_band() {
    let mut surface = RecordingSurface::new();
    let engine = LayoutEngine::new(&mut surface);
    let geo = PageGeometry::A4;
    assert!((engine.bottom_limit() - (geo.height - geo.margin - FOOTER_RESERVE)).abs() < EPS);
}

#[test]
fn nothing_crosses_the_bottom_limit() {
    let source = common::repeated_paragraphs(200);
    let (surface, placements, limit) = lay_out(&source);

    assert!(surface.page_count() > 2, "200 paragraphs should need several pages");
    for p in &placements {
        assert!(p.bottom <= limit + EPS, "{p:?} crosses {limit}");
        assert!(p.top <= p.bottom);
    }
    for t in surface.texts() {
        assert!(t.bottom() <= limit + EPS, "'{}' on page {} ends at {}", t.text, t.page, t.bottom());
    }
    assert!(placements.windows(2).all(|w| w[0].page <= w[1].page));
    assert_eq!(placements.last().map(|p| p.page), Some(surface.page_count() - 1));
}

#[test]
fn mixed_report_stays_inside_the_page() {
    let source = common::SAMPLE_REPORT.repeat(8);
    let (surface, placements, limit) = lay_out(&source);
    assert!(surface.page_count() > 1);
    assert!(placements.iter().all(|p| p.bottom <= limit + EPS));
    for op in &surface.ops {
        if let Op::Rect { y, h, .. } = op {
            assert!(y + h <= limit + EPS);
        }
    }
}

#[test]
fn table_row_cells_share_a_baseline() {
    let mut surface = RecordingSurface::new();
    {
        let mut engine = LayoutEngine::new(&mut surface);
        engine.place(&classify_line("| A | B | C |"));
        let placements = engine.finish();
        assert_eq!(placements.len(), 1);
        assert!((placements[0].bottom - placements[0].top - ROW_HEIGHT).abs() < EPS);
    }

    let texts = surface.texts();
    assert_eq!(texts.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(), vec!["A", "B", "C"]);
    assert!(texts.iter().all(|t| (t.y - texts[0].y).abs() < EPS));

    let geo = PageGeometry::A4;
    let col_w = (geo.content_width() - 10.0) / 3.0;
    assert!((texts[0].x - (geo.margin + 5.0)).abs() < EPS);
    assert!((texts[1].x - texts[0].x - col_w).abs() < EPS);
    assert!((texts[2].x - texts[1].x - col_w).abs() < EPS);
}

#[test]
fn long_cells_are_cut_not_wrapped() {
    let long = "x".repeat(300);
    let mut surface = RecordingSurface::new();
    {
        let mut engine = LayoutEngine::new(&mut surface);
        engine.place(&classify_line(&format!("| {long} | short |")));
    }
    let texts = surface.texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].text.ends_with('…'));
    let col_w = (PageGeometry::A4.content_width() - 10.0) / 2.0;
    let drawn_w = texts[0].text.chars().count() as f32 * 11.0 * common::CHAR_WIDTH;
    assert!(drawn_w <= col_w - 4.0 + EPS);
    assert_eq!(texts[1].text, "short");
}

#[test]
fn separator_rows_draw_a_hairline() {
    let (surface, placements, _) = lay_out("| A | B |\n|---|---|\n| 1 | 2 |");
    assert_eq!(placements.len(), 3);
    assert_eq!(surface.texts().len(), 4);
    assert!(surface.ops.iter().any(|op| matches!(op, Op::Line { .. })));
}

#[test]
fn style_returns_to_body_after_every_element() {
    let mut surface = RecordingSurface::new();
    {
        let mut engine = LayoutEngine::new(&mut surface);
        for line in classify("# Heading\n**Bold line**\n🔴 PRIORITY 1: fix\nplain text") {
            engine.place(&line);
            assert_eq!(engine.style(), StyleState::body(), "after {:?}", line.kind);
        }
    }
    let texts = surface.texts();
    let heading = &texts[0];
    assert_eq!(heading.style.font, FontWeight::Bold);
    assert_eq!(heading.style.size_pt, 18.0);
    assert_eq!(texts[1].style.font, FontWeight::Bold);
    assert_eq!(texts[3].text, "plain text");
    assert_eq!(texts[3].style, StyleState::body());
}

#[test]
fn tall_paragraph_flows_across_pages() {
    let huge = common::LONG_PARAGRAPH.repeat(120);
    let (surface, placements, limit) = lay_out(&huge);
    let pages: Vec<usize> = placements.iter().map(|p| p.page).collect();
    assert!(pages.len() > 1, "one placement per page the block touches");
    assert!(pages.windows(2).all(|w| w[1] == w[0] + 1));
    assert!(placements.iter().all(|p| p.kind == LineKind::Paragraph && p.bottom <= limit + EPS));
    assert_eq!(surface.page_count(), pages.len());
}

#[test]
fn short_block_near_the_bottom_moves_to_a_new_page() {
    let mut surface = RecordingSurface::new();
    let geo = PageGeometry::A4;
    {
        let mut engine = LayoutEngine::new(&mut surface);
        let gap = engine.bottom_limit() - geo.margin - 10.0;
        engine.advance(gap);
        engine.place(&classify_line("Two short words"));
        assert_eq!(engine.cursor().page_index, 1);
    }
    let t = surface.find_text("Two short words").expect("drawn");
    assert_eq!(t.page, 1);
    assert!((t.y - geo.margin).abs() < EPS);
}

#[test]
fn no_break_at_the_top_of_a_page() {
    let mut surface = RecordingSurface::new();
    {
        let mut engine = LayoutEngine::new(&mut surface);
        assert!(!engine.ensure_space(10_000.0));
        engine.advance(1.0);
        assert!(engine.ensure_space(10_000.0));
    }
    assert_eq!(surface.page_count(), 2);
}

#[test]
fn blank_lines_are_a_fixed_gap() {
    let mut surface = RecordingSurface::new();
    let mut engine = LayoutEngine::new(&mut surface);
    let before = engine.cursor().y;
    engine.place(&classify_line("   "));
    assert!((engine.cursor().y - before - 8.0).abs() < EPS);
    assert!(engine.finish().is_empty());
}

#[test]
fn bullets_are_indented_with_a_glyph() {
    let (surface, _, _) = lay_out("- first\n1. numbered");
    let texts = surface.texts();
    let margin = PageGeometry::A4.margin;
    assert_eq!(texts[0].text, "• first");
    assert!((texts[0].x - margin - 10.0).abs() < EPS);
    assert_eq!(texts[1].text, "1. numbered");
    assert!((texts[1].x - margin - 10.0).abs() < EPS);
}

#[test]
fn priority_box_wraps_its_text() {
    let (surface, placements, _) = lay_out("🔴 PRIORITY 1: Rewrite the intro");
    let (box_y, box_h) = surface
        .ops
        .iter()
        .find_map(|op| match op {
            Op::Rect { y, h, color, radius, .. } if *color == BOX_FILL => {
                assert!(*radius > 0.0);
                Some((*y, *h))
            }
            _ => None,
        })
        .expect("box drawn");
    assert!(box_h >= 32.0);
    let text = surface.find_text("Rewrite").expect("text drawn");
    assert!(text.y > box_y && text.bottom() <= box_y + box_h + EPS);
    assert_eq!(placements[0].kind, LineKind::PriorityBox);
}

#[test]
fn oversized_priority_box_splits_across_pages() {
    let source = format!("Intro line\nPRIORITET 1: {}", "word ".repeat(1200));
    let (surface, placements, limit) = lay_out(&source);

    let boxes: Vec<&Placement> = placements
        .iter()
        .filter(|p| p.kind == LineKind::PriorityBox)
        .collect();
    assert!(boxes.len() > 1, "one box segment per page, got {boxes:?}");
    assert!(boxes.windows(2).all(|w| w[1].page == w[0].page + 1));
    assert!(boxes.iter().all(|p| p.bottom <= limit + EPS));

    for op in &surface.ops {
        if let Op::Rect { page, y, h, .. } = op {
            assert!(y + h <= limit + EPS, "box on page {page} ends at {}", y + h);
        }
    }
    for t in surface.texts() {
        assert!(t.bottom() <= limit + EPS, "'{}' on page {} ends at {}", t.text, t.page, t.bottom());
    }
    let words: usize = surface.texts().iter().map(|t| t.text.matches("word").count()).sum();
    assert_eq!(words, 1200);
}

#[test]
fn blank_runs_stop_at_the_bottom_limit() {
    let mut surface = RecordingSurface::new();
    {
        let mut engine = LayoutEngine::new(&mut surface);
        let blank = classify_line("");
        for _ in 0..200 {
            engine.place(&blank);
        }
        assert!(engine.cursor().y <= engine.bottom_limit() + EPS);
        assert_eq!(engine.cursor().page_index, 0);

        engine.place(&classify_line("After the gap"));
        assert_eq!(engine.cursor().page_index, 1);
    }
    let t = surface.find_text("After the gap").expect("drawn");
    assert!((t.y - PageGeometry::A4.margin).abs() < EPS);
}

#[test]
fn wrapping_breaks_words_that_cannot_fit() {
    let surface = RecordingSurface::new();
    let style = StyleState::body();
    // 5.5pt per glyph: 10 glyphs per 55pt line
    let lines = wrap_text(&surface, "abcdefghijklmnopqrstuvwxy", &style, 55.0);
    assert_eq!(lines, vec!["abcdefghij", "klmnopqrst", "uvwxy"]);

    let lines = wrap_text(&surface, "aaa bbb ccc", &style, 44.0);
    assert_eq!(lines, vec!["aaa bbb", "ccc"]);

    assert_eq!(wrap_text(&surface, "", &style, 100.0), vec![String::new()]);
}
