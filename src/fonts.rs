use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::error::Error;
use crate::model::FontWeight;

/// Where the regular and bold faces come from.
#[derive(Clone, Debug, PartialEq)]
pub struct FontConfig {
    /// Explicit TrueType file for the regular face. Takes precedence over the search.
    pub regular: Option<PathBuf>,
    pub bold: Option<PathBuf>,
    /// Family searched for in `dirs` and the system font directories.
    pub family: String,
    pub dirs: Vec<PathBuf>,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            regular: None,
            bold: None,
            family: "DejaVu Sans".to_string(),
            dirs: Vec::new(),
        }
    }
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    pub(crate) widths_1000: Vec<f32>,
    pub(crate) ascender_ratio: f32,
    pub(crate) char_to_gid: Option<HashMap<char, u16>>,
    pub(crate) char_widths_1000: Option<HashMap<char, f32>>,
}

impl FontEntry {
    /// Width of a single character in 1000-units. Uses the per-char cache (covers
    /// all chars seen in the document), falls back to the WinAnsi table.
    pub(crate) fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(ref map) = self.char_widths_1000
            && let Some(&w) = map.get(&ch)
        {
            return w;
        }
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    pub(crate) fn word_width(&self, word: &str, font_size: f32) -> f32 {
        word.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    /// Bytes for a `Tj` operand: glyph ids for embedded fonts, WinAnsi otherwise.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }

    /// False for characters the font will silently drop or replace.
    pub(crate) fn covers(&self, ch: char) -> bool {
        match &self.char_to_gid {
            Some(map) => map.contains_key(&ch),
            None => ch.is_ascii() || char_to_winansi(ch) != 0,
        }
    }
}

/// A resolved face: file path, index within a collection, and whether the
/// caller named it explicitly (explicit faces must load or the render fails).
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FontSource {
    pub(crate) path: PathBuf,
    pub(crate) face_index: u32,
    pub(crate) explicit: bool,
}

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn font_directories(extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = extra.to_vec();

    // Project-local fonts, as shipped next to the server binary
    dirs.extend([PathBuf::from("fonts"), PathBuf::from("public/fonts")]);

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(&home).join("Library/Fonts"));
        }
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend(["/usr/share/fonts".into(), "/usr/local/share/fonts".into()]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}

fn is_font_file(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("ttf" | "otf" | "ttc")
    )
}

fn is_font_collection(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttc"))
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Walk the font directories for the upright regular and bold faces of `family`.
/// Only files whose name starts with the squashed family name are parsed.
fn scan_for_family(family: &str, extra_dirs: &[PathBuf]) -> (Option<FontSource>, Option<FontSource>) {
    let t0 = std::time::Instant::now();
    let wanted = squash(family);
    let mut regular: Option<FontSource> = None;
    let mut bold: Option<FontSource> = None;
    let mut files_parsed = 0u32;
    let mut visited: std::collections::HashSet<PathBuf> = std::collections::HashSet::new();

    let mut stack: Vec<PathBuf> = font_directories(extra_dirs);
    stack.reverse();
    while let Some(dir) = stack.pop() {
        if regular.is_some() && bold.is_some() {
            break;
        }
        if !visited.insert(dir.clone()) {
            continue;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };

        let mut subdirs = Vec::new();
        let mut font_files = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                subdirs.push(path);
            } else if is_font_file(&path) {
                let stem = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .map(squash)
                    .unwrap_or_default();
                if stem.starts_with(&wanted) {
                    font_files.push(path);
                }
            }
        }
        subdirs.sort();
        font_files.sort();
        stack.extend(subdirs.into_iter().rev());

        for file_path in font_files {
            files_parsed += 1;
            let Ok(file) = std::fs::File::open(&file_path) else {
                continue;
            };
            let Ok(data) = (unsafe { Mmap::map(&file) }) else {
                continue;
            };
            let face_count = if is_font_collection(&file_path) {
                ttf_parser::fonts_in_collection(&data).unwrap_or(1)
            } else {
                1
            };
            for face_index in 0..face_count {
                let Ok(face) = Face::parse(&data, face_index) else {
                    continue;
                };
                if face.is_italic() || font_family_name(&face).is_none_or(|f| squash(&f) != wanted) {
                    continue;
                }
                let slot = if face.is_bold() { &mut bold } else { &mut regular };
                if slot.is_none() {
                    *slot = Some(FontSource {
                        path: file_path.clone(),
                        face_index,
                        explicit: false,
                    });
                }
            }
        }
    }

    log::debug!(
        "Font scan for '{family}': {:.1}ms, {files_parsed} files parsed, regular={}, bold={}",
        t0.elapsed().as_secs_f64() * 1000.0,
        regular.is_some(),
        bold.is_some(),
    );

    (regular, bold)
}

/// Resolve both faces for one render. Nothing is cached between calls.
pub(crate) fn resolve_sources(config: &FontConfig) -> (Option<FontSource>, Option<FontSource>) {
    let explicit = |p: &Option<PathBuf>| {
        p.as_ref().map(|path| FontSource {
            path: path.clone(),
            face_index: 0,
            explicit: true,
        })
    };
    let mut regular = explicit(&config.regular);
    let mut bold = explicit(&config.bold);

    if (regular.is_none() || bold.is_none()) && !config.family.trim().is_empty() {
        let (found_regular, found_bold) = scan_for_family(&config.family, &config.dirs);
        regular = regular.or(found_regular);
        bold = bold.or(found_bold);
    }
    (regular, bold)
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi bytes, dropping what WinAnsi cannot hold.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter_map(|c| match char_to_winansi(c) {
            0 if c.is_ascii() => Some(c as u8),
            0 => None,
            b => Some(b),
        })
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths(weight: FontWeight) -> Vec<f32> {
    let bold = weight == FontWeight::Bold;
    (32u8..=255u8)
        .map(|b| match b {
            32 => 278.0,
            33..=47 => 333.0,
            48..=57 => 556.0,
            58..=64 => 333.0,
            73 | 74 => 278.0,
            77 => 833.0,
            65..=90 if bold => 722.0,
            65..=90 => 667.0,
            91..=96 => 333.0,
            102 | 105 | 106 | 108 | 116 => 278.0,
            109 | 119 => 833.0,
            97..=122 if bold => 611.0,
            97..=122 => 556.0,
            _ => 556.0,
        })
        .collect()
}

struct EmbeddedMetrics {
    widths_1000: Vec<f32>,
    ascender_ratio: f32,
    char_to_gid: HashMap<char, u16>,
    char_widths_1000: HashMap<char, f32>,
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding.
/// The font data is subsetted to only include glyphs used in the document.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_name: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Option<EmbeddedMetrics> {
    let face = Face::parse(font_data, face_index).ok()?;

    let units = face.units_per_em() as f32;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    let widths_1000: Vec<f32> = (32u8..=255u8)
        .map(|byte| {
            face.glyph_index(winansi_to_char(byte))
                .and_then(|gid| face.glyph_hor_advance(gid))
                .map(|adv| adv as f32 / units * 1000.0)
                .unwrap_or(0.0)
        })
        .collect();

    // Ordered iteration keeps glyph remapping, and so the output bytes, stable
    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    let mut char_widths_1000 = HashMap::new();
    let mut gid_widths: Vec<(u16, f32)> = Vec::new();
    let mut cmap_pairs: Vec<(u16, char)> = Vec::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            let new_gid = remapper.remap(gid.0);
            let w = face
                .glyph_hor_advance(gid)
                .map(|adv| adv as f32 / units * 1000.0)
                .unwrap_or(0.0);
            if char_to_gid.insert(ch, new_gid).is_none() {
                cmap_pairs.push((new_gid, ch));
            }
            char_widths_1000.insert(ch, w);
            gid_widths.push((new_gid, w));
        }
    }
    gid_widths.sort_by_key(|&(gid, _)| gid);
    gid_widths.dedup_by_key(|&mut (gid, _)| gid);

    let subset_data = subsetter::subset(font_data, face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {font_name}: {e}, embedding full font");
        font_data.to_vec()
    });

    let descriptor_ref = alloc();
    let data_ref = alloc();
    let data_len = i32::try_from(subset_data.len()).ok()?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font_name.replace(' ', "");

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let cid_font_ref = alloc();
    let system_info = pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{}-UTF16", ps_name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        pdf_writer::types::SystemInfo {
            registry: pdf_writer::Str(b"Adobe"),
            ordering: pdf_writer::Str(b"Identity"),
            supplement: 0,
        },
    );
    for &(new_gid, ch) in &cmap_pairs {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Some(EmbeddedMetrics {
        widths_1000,
        ascender_ratio: face.ascender() as f32 / units,
        char_to_gid,
        char_widths_1000,
    })
}

fn load_and_embed(
    pdf: &mut Pdf,
    font_ref: Ref,
    source: &FontSource,
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<EmbeddedMetrics, String> {
    let file = std::fs::File::open(&source.path).map_err(|e| e.to_string())?;
    let data = unsafe { Mmap::map(&file) }.map_err(|e| e.to_string())?;
    let face = Face::parse(&data, source.face_index).map_err(|e| e.to_string())?;
    let name = font_family_name(&face).unwrap_or_else(|| {
        source
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "EmbeddedFont".to_string())
    });
    let name = if face.is_bold() { format!("{name}-Bold") } else { name };
    embed_truetype(pdf, font_ref, &name, &data, source.face_index, used_chars, alloc)
        .ok_or_else(|| "font could not be embedded".to_string())
}

/// Register one face in `pdf`. Explicitly configured faces that fail to load are
/// an error; discovered faces that fail fall back to the built-in Helvetica.
pub(crate) fn register_font(
    pdf: &mut Pdf,
    weight: FontWeight,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    source: Option<&FontSource>,
    used_chars: &BTreeSet<char>,
) -> Result<FontEntry, Error> {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let embedded = match source {
        Some(src) => match load_and_embed(pdf, font_ref, src, used_chars, alloc) {
            Ok(metrics) => Some(metrics),
            Err(reason) if src.explicit => {
                return Err(Error::Font {
                    path: src.path.clone(),
                    reason,
                });
            }
            Err(reason) => {
                log::warn!("Font {} unusable ({reason}), using Helvetica", src.path.display());
                None
            }
        },
        None => {
            log::warn!("No TrueType face found for {weight:?}, using Helvetica");
            None
        }
    };

    let entry = match embedded {
        Some(m) => FontEntry {
            pdf_name,
            font_ref,
            widths_1000: m.widths_1000,
            ascender_ratio: m.ascender_ratio,
            char_to_gid: Some(m.char_to_gid),
            char_widths_1000: Some(m.char_widths_1000),
        },
        None => {
            let base: &[u8] = match weight {
                FontWeight::Regular => b"Helvetica",
                FontWeight::Bold => b"Helvetica-Bold",
            };
            pdf.type1_font(font_ref)
                .base_font(Name(base))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            FontEntry {
                pdf_name,
                font_ref,
                widths_1000: helvetica_widths(weight),
                ascender_ratio: 0.718,
                char_to_gid: None,
                char_widths_1000: None,
            }
        }
    };

    log::debug!(
        "register_font: {weight:?} embedded={} → {:.1}ms",
        entry.char_to_gid.is_some(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn winansi_keeps_latin_and_drops_the_rest() {
        assert_eq!(to_winansi_bytes("Ašć"), vec![b'A', 0x9A]);
        assert_eq!(to_winansi_bytes("•"), vec![0x95]);
    }

    #[test]
    fn family_names_are_squashed() {
        assert_eq!(squash("DejaVu Sans"), "dejavusans");
        assert!(squash("DejaVuSans-Bold").starts_with(&squash("DejaVu Sans")));
    }
}
