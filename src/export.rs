//! `POST /api/generate-pdf`: JSON in, PDF attachment out.

use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

use crate::error::Error;
use crate::model::DocumentMetadata;
use crate::pdf::{RenderOptions, render, today};

/// Export request body. Every field is optional and non-string values are
/// treated as absent.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub subtitle: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub report_markdown: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub report_text: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub content: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub filename: Option<String>,
    #[serde(deserialize_with = "lenient_meta")]
    pub meta: Option<ExportMeta>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportMeta {
    #[serde(deserialize_with = "lenient_string")]
    pub channel: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub video_title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub period: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub created_at: Option<String>,
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn lenient_meta<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ExportMeta>, D::Error> {
    Ok(match Value::deserialize(d)? {
        v @ Value::Object(_) => serde_json::from_value(v).ok(),
        _ => None,
    })
}

impl ExportRequest {
    /// Parse a request body. Anything that is not a JSON object yields an empty request.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_else(|e| {
            log::debug!("export body not understood ({e}), using defaults");
            Self::default()
        })
    }

    /// First non-empty of `reportMarkdown`, `reportText`, `content`, `subtitle`.
    pub fn report_text(&self) -> &str {
        [
            &self.report_markdown,
            &self.report_text,
            &self.content,
            &self.subtitle,
        ]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .find(|s| !s.is_empty())
        .unwrap_or("")
    }

    pub fn metadata(&self) -> DocumentMetadata {
        let meta = self.meta.clone().unwrap_or_default();
        DocumentMetadata {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            brand: None,
            created_at: meta.created_at,
            channel: meta.channel,
            video_title: meta.video_title,
            period: meta.period,
        }
    }
}

/// Trimmed caller filename, or `youtube-report-<today>.pdf`, always ending in `.pdf`.
pub fn build_filename(raw: Option<&str>, today: &str) -> String {
    let base = match raw.map(str::trim) {
        Some(name) if !name.is_empty() => sanitize_filename(name),
        _ => format!("youtube-report-{today}.pdf"),
    };
    if base.to_ascii_lowercase().ends_with(".pdf") {
        base
    } else {
        format!("{base}.pdf")
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' | '/' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// `Content-Disposition` value: an ASCII `filename` plus `filename*` for the full UTF-8 name.
pub fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '_' })
        .collect();
    if ascii == filename {
        return format!("attachment; filename=\"{filename}\"");
    }
    let mut encoded = String::new();
    for b in filename.bytes() {
        if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }
    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}

/// Transport-neutral response; the server maps it onto HTTP.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl ExportResponse {
    fn pdf(filename: &str, bytes: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: vec![
                ("Content-Type", "application/pdf".to_string()),
                ("Content-Disposition", content_disposition(filename)),
                ("Cache-Control", "no-store".to_string()),
            ],
            body: bytes,
        }
    }

    fn failure(err: &Error) -> Self {
        let message = err.to_string();
        let message = if message.is_empty() {
            "PDF generation failed".to_string()
        } else {
            message
        };
        let body = json!({ "ok": false, "error": message });
        Self {
            status: 500,
            headers: vec![("Content-Type", "application/json".to_string())],
            body: body.to_string().into_bytes(),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Handle one export: parse, render, answer. Render failures become a 500 JSON body.
pub fn handle(body: &[u8], options: &RenderOptions) -> ExportResponse {
    let t0 = std::time::Instant::now();
    let request = ExportRequest::from_body(body);
    let filename = build_filename(request.filename.as_deref(), &today());

    match render(request.report_text(), &request.metadata(), options) {
        Ok(bytes) => {
            log::info!(
                "export {filename}: {} bytes in {:.1}ms",
                bytes.len(),
                t0.elapsed().as_secs_f64() * 1000.0,
            );
            ExportResponse::pdf(&filename, bytes)
        }
        Err(e) => {
            log::error!("PDF generation error: {e}");
            ExportResponse::failure(&e)
        }
    }
}
