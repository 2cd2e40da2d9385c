mod common;

use lopdf::content::Content;
use lopdf::{Document, Object};
use studio_report_pdf::{DocumentMetadata, Error, FontConfig, RenderOptions, render_report};

/// Built-in Helvetica only, so results do not depend on the fonts installed.
fn helvetica() -> RenderOptions {
    RenderOptions {
        fonts: FontConfig {
            family: String::new(),
            ..FontConfig::default()
        },
        ..RenderOptions::default()
    }
}

fn fixed_meta() -> DocumentMetadata {
    DocumentMetadata {
        created_at: Some("2025-01-31".into()),
        ..DocumentMetadata::default()
    }
}

/// Strings shown with `Tj`, per page in page order.
fn shown_strings(doc: &Document) -> Vec<Vec<String>> {
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let raw = doc.get_page_content(page_id).expect("page content");
            let content = Content::decode(&raw).expect("decodable content");
            content
                .operations
                .iter()
                .filter(|op| op.operator == "Tj")
                .filter_map(|op| match op.operands.first() {
                    Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                    _ => None,
                })
                .collect()
        })
        .collect()
}

fn parse(bytes: &[u8]) -> Document {
    assert!(bytes.starts_with(b"%PDF-"));
    Document::load_mem(bytes).expect("valid PDF")
}

#[test]
fn heading_and_paragraph_document() {
    let bytes = render_report("# Title\n\nSome paragraph.", &fixed_meta(), &helvetica()).unwrap();
    let doc = parse(&bytes);
    assert_eq!(doc.get_pages().len(), 2);

    let pages = shown_strings(&doc);
    assert!(pages[0].iter().any(|s| s == "Video Analyzer"));
    assert_eq!(&pages[1][..3], ["Detailed Report", "Title", "Some paragraph."]);
}

#[test]
fn long_report_numbers_pages_consistently() {
    let source = common::repeated_paragraphs(200);
    let bytes = render_report(&source, &fixed_meta(), &helvetica()).unwrap();
    let doc = parse(&bytes);
    let total = doc.get_pages().len();
    assert!(total > 3, "got {total} pages");

    println!();
    println!("+{:-<8}+{:-<14}+{:-<10}+", "", "", "");
    println!("| {:<6} | {:<12} | {:<8} |", "Page", "Footer", "Strings");
    println!("+{:-<8}+{:-<14}+{:-<10}+", "", "", "");
    for (i, strings) in shown_strings(&doc).iter().enumerate() {
        let expected = format!("Page {} / {total}", i + 1);
        let footer = strings.iter().find(|s| s.starts_with("Page ")).cloned().unwrap_or_default();
        println!("| {:<6} | {:<12} | {:<8} |", i + 1, footer, strings.len());
        assert_eq!(footer, expected);
    }
    println!("+{:-<8}+{:-<14}+{:-<10}+", "", "", "");

    // Every paragraph made it into the document
    let all: String = shown_strings(&doc).concat().join(" ");
    assert!(all.contains("Paragraph 1:"));
    assert!(all.contains("Paragraph 200:"));
}

#[test]
fn empty_request_is_a_minimal_document() {
    let bytes = render_report("", &DocumentMetadata::default(), &helvetica()).unwrap();
    let doc = parse(&bytes);
    assert_eq!(doc.get_pages().len(), 2);
    let pages = shown_strings(&doc);
    assert_eq!(pages[1], ["Detailed Report", "Kreator Akademija", "Page 2 / 2"]);
}

#[test]
fn identical_inputs_give_identical_bytes() {
    for options in [helvetica(), RenderOptions::default()] {
        let a = render_report(common::SAMPLE_REPORT, &fixed_meta(), &options).unwrap();
        let b = render_report(common::SAMPLE_REPORT, &fixed_meta(), &options).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn pages_are_a4_with_document_info() {
    let meta = DocumentMetadata {
        title: Some("Retention check".into()),
        ..fixed_meta()
    };
    let bytes = render_report("text", &meta, &helvetica()).unwrap();
    let doc = parse(&bytes);

    for &page_id in doc.get_pages().values() {
        let page = doc.get_object(page_id).and_then(Object::as_dict).unwrap();
        let media: Vec<f32> = page
            .get(b"MediaBox")
            .and_then(Object::as_array)
            .unwrap()
            .iter()
            .map(|v| v.as_float().unwrap())
            .collect();
        assert!((media[2] - 595.28).abs() < 0.01 && (media[3] - 841.89).abs() < 0.01);
    }

    let info_id = doc.trailer.get(b"Info").and_then(Object::as_reference).unwrap();
    let info = doc.get_object(info_id).and_then(Object::as_dict).unwrap();
    assert_eq!(info.get(b"Title").and_then(Object::as_str).unwrap(), b"Retention check");
    assert_eq!(info.get(b"Author").and_then(Object::as_str).unwrap(), b"Kreator Akademija");
}

#[test]
fn sample_report_renders() {
    let bytes = render_report(common::SAMPLE_REPORT, &fixed_meta(), &RenderOptions::default()).unwrap();
    let doc = parse(&bytes);
    assert!(doc.get_pages().len() >= 2);
}

#[test]
fn missing_explicit_font_is_an_error() {
    let options = RenderOptions {
        fonts: FontConfig {
            regular: Some("/nonexistent/Report-Regular.ttf".into()),
            ..FontConfig::default()
        },
        ..RenderOptions::default()
    };
    let err = render_report("text", &fixed_meta(), &options).unwrap_err();
    assert!(matches!(err, Error::Font { .. }), "{err}");
}
