//! Line-oriented parser for the flat settings document.
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>   ┐ header
//! <rage__GraphicsOptions v="83.0">          ┘
//!     <ResolutionX value="1600"/>          ┐ body: one Field per line
//!     <!-- anything else is kept -->       ┘
//! </rage__GraphicsOptions>                 ─ footer
//! ```
//!
//! Every original line is retained in `all_lines`, so lines the parser does
//! not understand survive a patch untouched.

use super::edit::{EditError, EditReport, EditSet, EditValue};
use super::field::Field;
use super::value::FieldValue;
use crate::debug;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("document is empty")]
    Empty,

    #[error("no root element and no field lines found")]
    NoRecognizedFields,
}

// ============================================================================
// Types
// ============================================================================

/// Root element of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootTag {
    pub name: String,
    /// The `v="..."` attribute, if present.
    pub version: Option<String>,
    /// 1-based line of the opening tag.
    pub line: usize,
}

/// A parsed document. Created fresh on every read.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    header_lines: Vec<String>,
    fields: Vec<Field>,
    footer_lines: Vec<String>,
    all_lines: Vec<String>,
    root: Option<RootTag>,
    unparsed_lines: Vec<usize>,
}

enum Section {
    Header,
    Body,
    Footer,
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse document text.
///
/// Unrecognized lines are never an error: the format is owned by another
/// application and may gain entries this crate does not know about.
pub fn parse(text: &str) -> Result<ParsedDocument, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let all_lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
    let mut doc = ParsedDocument {
        header_lines: Vec::new(),
        fields: Vec::new(),
        footer_lines: Vec::new(),
        all_lines: Vec::new(),
        root: None,
        unparsed_lines: Vec::new(),
    };

    let mut section = Section::Header;
    for (idx, line) in all_lines.iter().enumerate() {
        let number = idx + 1;
        let trimmed = line.trim();

        match section {
            Section::Header => {
                doc.header_lines.push(line.clone());
                if let Some(root) = parse_root_open(trimmed, number) {
                    section = if trimmed.ends_with("/>") {
                        Section::Footer
                    } else {
                        Section::Body
                    };
                    doc.root = Some(root);
                }
            }
            Section::Body => {
                let closes_root = doc
                    .root
                    .as_ref()
                    .is_some_and(|r| is_root_close(trimmed, &r.name));
                if closes_root {
                    doc.footer_lines.push(line.clone());
                    section = Section::Footer;
                } else if trimmed.is_empty() {
                    continue;
                } else if let Some((name, raw)) = parse_field_line(trimmed) {
                    doc.fields.push(Field::parse(name, &unescape(raw), number));
                } else {
                    debug!("parse"; "unparsed line {}: {}", number, trimmed);
                    doc.unparsed_lines.push(number);
                }
            }
            Section::Footer => doc.footer_lines.push(line.clone()),
        }
    }

    if doc.root.is_none() && doc.fields.is_empty() {
        return Err(ParseError::NoRecognizedFields);
    }

    doc.all_lines = all_lines;
    debug!("parse"; "{} fields, {} unparsed lines", doc.fields.len(), doc.unparsed_lines.len());
    Ok(doc)
}

fn root_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<([A-Za-z_][A-Za-z0-9_.:-]*)").unwrap())
}

fn field_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<([A-Za-z_][A-Za-z0-9_.:-]*)([ \t\r\n][^<>]*)?/>$").unwrap())
}

/// Extract a double-quoted attribute from an attribute list.
fn attr<'a>(attrs: &'a str, key: &str) -> Option<&'a str> {
    static VALUE_RE: OnceLock<Regex> = OnceLock::new();
    static VERSION_RE: OnceLock<Regex> = OnceLock::new();

    let re = match key {
        "value" => VALUE_RE.get_or_init(|| Regex::new(r#"(?:^|[ \t\r\n])value[ \t]*=[ \t]*"([^"]*)""#).unwrap()),
        "v" => VERSION_RE.get_or_init(|| Regex::new(r#"(?:^|[ \t\r\n])v[ \t]*=[ \t]*"([^"]*)""#).unwrap()),
        _ => return None,
    };
    re.captures(attrs)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn parse_root_open(trimmed: &str, line: usize) -> Option<RootTag> {
    let caps = root_open_re().captures(trimmed)?;
    let name = caps.get(1)?;
    let rest = &trimmed[name.end()..];
    Some(RootTag {
        name: name.as_str().to_owned(),
        version: attr(rest, "v").map(str::to_owned),
        line,
    })
}

fn is_root_close(trimmed: &str, root: &str) -> bool {
    trimmed
        .strip_prefix("</")
        .and_then(|rest| rest.strip_prefix(root))
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(|c: char| c == '>' || c.is_whitespace()))
}

/// `<Name ... value="V" .../>` → `(Name, V)`.
fn parse_field_line(trimmed: &str) -> Option<(&str, &str)> {
    let caps = field_line_re().captures(trimmed)?;
    let name = caps.get(1)?.as_str();
    let value = attr(caps.get(2)?.as_str(), "value")?;
    Some((name, value))
}

fn unescape(raw: &str) -> String {
    quick_xml::escape::unescape(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_owned())
}

// ============================================================================
// Document API
// ============================================================================

impl ParsedDocument {
    pub fn header_lines(&self) -> &[String] {
        &self.header_lines
    }

    pub fn footer_lines(&self) -> &[String] {
        &self.footer_lines
    }

    /// The complete original text, split on `\n`.
    pub fn all_lines(&self) -> &[String] {
        &self.all_lines
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn root(&self) -> Option<&RootTag> {
        self.root.as_ref()
    }

    /// 1-based numbers of body lines that were not recognized.
    pub fn unparsed_lines(&self) -> &[usize] {
        &self.unparsed_lines
    }

    /// First field with this name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Set a typed value. Returns whether the field is now modified.
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<bool, EditError> {
        let field = self
            .field_mut(name)
            .ok_or_else(|| EditError::UnknownField(name.to_owned()))?;
        let kind = field.kind();
        let given = value.to_string();
        field.set(value).ok_or(EditError::KindMismatch {
            name: name.to_owned(),
            expected: kind,
            given,
        })
    }

    /// Set a value from user text, parsed with the field's kind.
    pub fn set_raw(&mut self, name: &str, raw: &str) -> Result<bool, EditError> {
        let field = self
            .field_mut(name)
            .ok_or_else(|| EditError::UnknownField(name.to_owned()))?;
        let kind = field.kind();
        field.set_raw(raw).ok_or_else(|| EditError::KindMismatch {
            name: name.to_owned(),
            expected: kind,
            given: raw.to_owned(),
        })
    }

    /// Apply a batch of edits. Entries that fail are reported, not fatal.
    pub fn apply_edits(&mut self, edits: &EditSet) -> EditReport {
        let mut report = EditReport::default();
        for (name, value) in edits.iter() {
            let result = match value {
                EditValue::Raw(raw) => self.set_raw(name, raw),
                EditValue::Typed(v) => self.set(name, v.clone()),
            };
            match result {
                Ok(true) => push_unique(&mut report.changed, name),
                Ok(false) => {
                    report.changed.retain(|n| n != name);
                    push_unique(&mut report.unchanged, name);
                }
                Err(e) => report.errors.push(e),
            }
        }
        report
    }

    /// Fields whose value differs from the load-time value.
    pub fn modified(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_modified())
    }

    pub fn has_changes(&self) -> bool {
        self.fields.iter().any(Field::is_modified)
    }

    /// Drop every in-memory edit.
    pub fn reset(&mut self) {
        self.fields.iter_mut().for_each(Field::reset);
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_owned());
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::value::FieldKind;

    const DOC: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<rage__GraphicsOptions v=\"83.0\">\n\
\t<Fullscreen value=\"false\"/>\n\
\t<Monitor value=\"1\"/>\n\
\t<ResolutionX value=\"1600\"/>\n\
\t<MotionBlurStrength value=\"0.100000\"/>\n\
</rage__GraphicsOptions>\n";

    #[test]
    fn test_parse_sections() {
        let doc = parse(DOC).unwrap();
        assert_eq!(doc.header_lines().len(), 2);
        assert_eq!(doc.fields().len(), 4);
        // Closing tag plus the empty string after the final newline.
        assert_eq!(doc.footer_lines(), ["</rage__GraphicsOptions>", ""]);
        assert_eq!(doc.all_lines().len(), 8);

        let root = doc.root().unwrap();
        assert_eq!(root.name, "rage__GraphicsOptions");
        assert_eq!(root.version.as_deref(), Some("83.0"));
        assert_eq!(root.line, 2);
    }

    #[test]
    fn test_parse_field_lines() {
        let doc = parse(DOC).unwrap();
        let x = doc.field("ResolutionX").unwrap();
        assert_eq!(x.source_line, 5);
        assert_eq!(x.kind(), FieldKind::Integer);

        let blur = doc.field("MotionBlurStrength").unwrap();
        assert_eq!(blur.value(), &FieldValue::Float(0.1));
        assert_eq!(doc.field("Fullscreen").unwrap().kind(), FieldKind::Boolean);
    }

    #[test]
    fn test_line_count_invariant() {
        let doc = parse(DOC).unwrap();
        assert!(doc.all_lines().len() >= doc.header_lines().len() + doc.footer_lines().len());
        for field in doc.fields() {
            let line = &doc.all_lines()[field.source_line - 1];
            assert!(line.contains(&format!("<{} ", field.name)));
        }
    }

    #[test]
    fn test_unrecognized_lines_tolerated() {
        let text = "<Root v=\"1\">\n  <!-- comment -->\n\n  <Nested>\n  <A value=\"1\"/>\n  <NoValue/>\n</Root>";
        let doc = parse(text).unwrap();
        assert_eq!(doc.fields().len(), 1);
        assert_eq!(doc.unparsed_lines(), [2, 4, 6]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("").unwrap_err(), ParseError::Empty);
        assert_eq!(parse(" \n\t\n").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn test_not_this_format() {
        assert_eq!(
            parse("LANGUAGE=en-US\nSLOTS=").unwrap_err(),
            ParseError::NoRecognizedFields
        );
    }

    #[test]
    fn test_root_without_fields_is_valid() {
        let doc = parse("<?xml version=\"1.0\"?>\n<Root v=\"2\">\n</Root>").unwrap();
        assert!(doc.fields().is_empty());
        assert_eq!(doc.footer_lines(), ["</Root>"]);
    }

    #[test]
    fn test_self_closing_root() {
        let doc = parse("<Root v=\"2\"/>\n").unwrap();
        assert!(doc.fields().is_empty());
        assert_eq!(doc.header_lines().len(), 1);
        assert_eq!(doc.footer_lines(), [""]);
    }

    #[test]
    fn test_close_tag_prefix_and_trailing_lines() {
        let text = "<Root>\n\t<A value=\"1\"/>\n   </Root>\n<!-- trailer -->";
        let doc = parse(text).unwrap();
        assert_eq!(doc.footer_lines(), ["   </Root>", "<!-- trailer -->"]);
    }

    #[test]
    fn test_similar_close_tag_is_not_root() {
        let text = "<Root>\n</RootExtra>\n\t<A value=\"1\"/>\n</Root>";
        let doc = parse(text).unwrap();
        assert_eq!(doc.fields().len(), 1);
        assert_eq!(doc.unparsed_lines(), [2]);
    }

    #[test]
    fn test_duplicate_first_is_authoritative() {
        let text = "<Root>\n<A value=\"1\"/>\n<A value=\"2\"/>\n</Root>";
        let mut doc = parse(text).unwrap();
        assert_eq!(doc.field("A").unwrap().source_line, 2);
        doc.set_raw("A", "5").unwrap();
        assert_eq!(doc.fields()[0].value(), &FieldValue::Integer(5));
        assert_eq!(doc.fields()[1].value(), &FieldValue::Integer(2));
    }

    #[test]
    fn test_entities_unescaped() {
        let doc = parse("<Root>\n<Label value=\"a &amp; b\"/>\n</Root>").unwrap();
        assert_eq!(
            doc.field("Label").unwrap().value(),
            &FieldValue::String("a & b".into())
        );
    }

    #[test]
    fn test_crlf_lines() {
        let doc = parse("<Root>\r\n\t<A value=\"1\"/>\r\n</Root>\r\n").unwrap();
        assert_eq!(doc.field("A").unwrap().value(), &FieldValue::Integer(1));
        assert_eq!(doc.footer_lines(), ["</Root>\r", ""]);
    }

    #[test]
    fn test_dotted_names_and_loose_attributes() {
        let text = "<ns:Root_1 v = \"4\">\n\t<gfx.Scale-2  value = \"0.5\" />\n\t<Tab\tvalue=\"7\"/>\n</ns:Root_1>";
        let doc = parse(text).unwrap();
        assert_eq!(doc.root().unwrap().name, "ns:Root_1");
        assert_eq!(doc.root().unwrap().version.as_deref(), Some("4"));
        assert_eq!(doc.field("gfx.Scale-2").unwrap().value(), &FieldValue::Float(0.5));
        assert_eq!(doc.field("Tab").unwrap().value(), &FieldValue::Integer(7));
        assert!(doc.unparsed_lines().is_empty());
    }

    #[test]
    fn test_apply_edits_report() {
        let mut doc = parse(DOC).unwrap();
        let mut edits = EditSet::new();
        edits
            .push_raw("ResolutionX", "1920")
            .push_raw("Monitor", "1")
            .push_raw("Fullscreen", "maybe")
            .push_raw("Missing", "1");

        let report = doc.apply_edits(&edits);
        assert_eq!(report.changed, ["ResolutionX"]);
        assert_eq!(report.unchanged, ["Monitor"]);
        assert_eq!(report.errors.len(), 2);
        assert!(matches!(report.errors[0], EditError::KindMismatch { .. }));
        assert_eq!(report.errors[1], EditError::UnknownField("Missing".into()));
        assert_eq!(doc.modified().count(), 1);
    }

    #[test]
    fn test_edit_back_to_original_not_reported_changed() {
        let mut doc = parse(DOC).unwrap();
        let mut edits = EditSet::new();
        edits.push_raw("ResolutionX", "1920").push_raw("ResolutionX", "1600");
        let report = doc.apply_edits(&edits);
        assert!(report.changed.is_empty());
        assert_eq!(report.unchanged, ["ResolutionX"]);
        assert!(!doc.has_changes());
    }
}
