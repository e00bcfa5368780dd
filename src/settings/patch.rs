//! Line-exact serializer.
//!
//! Regenerates only the lines of modified fields. Everything else, including
//! whitespace, comments and unknown elements, is copied from the original.

use super::document::ParsedDocument;
use super::field::Field;

/// A line that `apply` will rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    /// 1-based line number.
    pub line: usize,
    pub old: String,
    pub new: String,
}

/// Render the document with every modified field's line regenerated.
///
/// With no modified fields this is the identity on the original text.
pub fn apply(doc: &ParsedDocument) -> String {
    let mut lines: Vec<&str> = doc.all_lines().iter().map(String::as_str).collect();
    let changes = changed_lines(doc);
    for change in &changes {
        lines[change.line - 1] = &change.new;
    }
    lines.join("\n")
}

/// The lines `apply` would rewrite, in file order.
pub fn changed_lines(doc: &ParsedDocument) -> Vec<LineChange> {
    let all = doc.all_lines();
    doc.modified()
        .filter(|f| f.source_line >= 1 && f.source_line <= all.len())
        .map(|f| {
            let old = &all[f.source_line - 1];
            LineChange {
                line: f.source_line,
                old: old.clone(),
                new: render_over(f, old),
            }
        })
        .collect()
}

/// Render `field` in place of `original`, keeping its indentation and
/// line-ending style.
fn render_over(field: &Field, original: &str) -> String {
    let indent_len = original.len() - original.trim_start().len();
    let mut line = field.render(&original[..indent_len]);
    if original.ends_with('\r') {
        line.push('\r');
    }
    line
}

// ============================================================================
// Tests
// ============================================================================
