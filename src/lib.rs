pub mod chat;
pub mod config;
mod error;
pub mod export;
mod fonts;
pub mod markdown;
pub mod model;
pub mod pdf;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

pub use error::Error;
pub use fonts::FontConfig;
pub use markdown::{classify, classify_line};
pub use model::{ClassifiedLine, DocumentMetadata, Labels, LineKind, PageGeometry};
pub use pdf::RenderOptions;

use std::path::Path;
use std::time::Instant;

/// Render report text (the markdown-ish dialect the chat produces) to PDF bytes.
pub fn render_report(
    source: &str,
    meta: &DocumentMetadata,
    options: &RenderOptions,
) -> Result<Vec<u8>, Error> {
    pdf::render(source, meta, options)
}

pub fn convert_markdown_to_pdf(
    input: &Path,
    output: &Path,
    meta: &DocumentMetadata,
    options: &RenderOptions,
) -> Result<(), Error> {
    let t0 = Instant::now();

    let source = std::fs::read_to_string(input)?;
    let t_read = t0.elapsed();

    let bytes = pdf::render(&source, meta, options)?;
    let t_render = t0.elapsed();

    std::fs::write(output, &bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: read={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_read.as_secs_f64() * 1000.0,
        (t_render - t_read).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}
