//! Line classification for the markdown-flavoured report text.
//!
//! Each input line maps to exactly one [`ClassifiedLine`]. Rules are checked
//! top to bottom and the first match wins, so `### x` is never a level-1
//! heading and `---` is a rule, not a bullet.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{ClassifiedLine, LineKind};

static PRIORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:🟥|🟨|🟩|🔴|🟡|🟢|(?i:PRIORITET|PRIORITY)\s+\d+:)").expect("valid regex")
});
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-•]\s+").expect("valid regex"));
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s+").expect("valid regex"));
static RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-─]{3,}$").expect("valid regex"));
static TABLE_SEPARATOR_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:?-{3,}:?$").expect("valid regex"));

/// Split the whole source into classified lines, one per `\n`-separated line.
pub fn classify(source: &str) -> Vec<ClassifiedLine> {
    let normalized = source.replace("\r\n", "\n");
    normalized.split('\n').map(classify_line).collect()
}

pub fn classify_line(raw: &str) -> ClassifiedLine {
    let expanded = raw.replace('\t', "  ");
    let line = expanded.trim();

    if line.is_empty() {
        return ClassifiedLine::new(LineKind::Blank, "");
    }

    for (prefix, kind) in [
        ("###", LineKind::Heading3),
        ("##", LineKind::Heading2),
        ("#", LineKind::Heading1),
    ] {
        if let Some(rest) = line.strip_prefix(prefix)
            && rest.starts_with(char::is_whitespace)
        {
            return ClassifiedLine::new(kind, strip_emphasis(rest.trim_start()));
        }
    }

    if PRIORITY.is_match(line) {
        return ClassifiedLine::new(LineKind::PriorityBox, strip_emphasis(line));
    }

    if let Some(m) = BULLET.find(line) {
        return ClassifiedLine::new(LineKind::Bullet, strip_emphasis(&line[m.end()..]));
    }

    if NUMBERED.is_match(line) {
        return ClassifiedLine::new(LineKind::Numbered, strip_emphasis(line));
    }

    if let Some(inner) = bold_wrapped(line) {
        return ClassifiedLine::new(LineKind::BoldEmphasis, strip_emphasis(inner));
    }

    if line.len() >= 2 && line.starts_with('|') && line.ends_with('|') {
        return ClassifiedLine::new(LineKind::TableRow, line);
    }

    if RULE.is_match(line) {
        return ClassifiedLine::new(LineKind::Rule, "");
    }

    ClassifiedLine::new(LineKind::Paragraph, strip_emphasis(line))
}

/// Inner text of a line that is entirely `**...**`, with no bold markers inside.
fn bold_wrapped(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("**")?.strip_suffix("**")?;
    if inner.trim().is_empty() || inner.contains("**") {
        return None;
    }
    Some(inner.trim())
}

/// Remove `**` markers and `*` emphasis markers for display.
/// A `*` standing alone between spaces (`5 * 3`) is kept.
pub fn strip_emphasis(text: &str) -> String {
    let without_bold = text.replace("**", "");
    let chars: Vec<char> = without_bold.chars().collect();
    let mut out = String::with_capacity(without_bold.len());
    for (i, &ch) in chars.iter().enumerate() {
        if ch == '*' {
            let prev_ws = i == 0 || chars[i - 1].is_whitespace();
            let next_ws = i + 1 >= chars.len() || chars[i + 1].is_whitespace();
            if !(prev_ws && next_ws) {
                continue;
            }
        }
        out.push(ch);
    }
    out.trim().to_string()
}

/// Cells of a pipe-delimited row. Empty leading/trailing fields are dropped.
pub fn table_cells(row: &str) -> Vec<String> {
    let mut cells: Vec<&str> = row.trim().split('|').collect();
    if cells.first().is_some_and(|c| c.trim().is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.trim().is_empty()) {
        cells.pop();
    }
    cells.into_iter().map(strip_emphasis).collect()
}

/// Markdown alignment row such as `|---|:---:|`.
pub fn is_table_separator(row: &str) -> bool {
    let cells = table_cells(row);
    !cells.is_empty() && cells.iter().all(|c| TABLE_SEPARATOR_CELL.is_match(c))
}
