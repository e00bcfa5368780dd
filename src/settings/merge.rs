//! Structural merge of a `{name: value}` map onto existing content.
//!
//! Unlike the line patcher this re-parses the document into a tree and
//! re-serializes it, so formatting is normalized: one tab of indentation,
//! self-closing children, double-quoted attributes. Use it when there is no
//! fresh [`ParsedDocument`](super::document::ParsedDocument) to patch.

use super::field::escape_attr;
use super::value::{FieldKind, FieldValue, decode, encode};
use quick_xml::{
    Reader,
    escape::{EscapeError, unescape},
    events::{BytesStart, Event, attributes::AttrError},
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt::Write as _;
use thiserror::Error;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("XML parse error at position {position}: {source}")]
    Xml {
        position: u64,
        #[source]
        source: quick_xml::Error,
    },

    #[error("malformed attribute: {0}")]
    Attr(#[from] AttrError),

    #[error("invalid escape sequence: {0}")]
    Escape(#[from] EscapeError),

    #[error("document has no root element")]
    NoRoot,
}

/// Result of [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub text: String,
    /// Number of elements whose `value` was replaced.
    pub applied: usize,
    /// Update keys with no matching element, sorted. Never added to `text`.
    pub unknown: Vec<String>,
}

// ============================================================================
// Tree
// ============================================================================

struct Element {
    name: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    fn from_start(e: &BytesStart<'_>) -> Result<Self, MergeError> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value);
            attrs.push((key, unescape(&raw)?.into_owned()));
        }
        Ok(Self { name, attrs })
    }

    fn value(&self) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == "value")
            .map(|(_, v)| v.as_str())
    }

    /// Render `update` in the encoding of the current value's kind.
    ///
    /// Falls back to the text as given when there is no current value, the
    /// field holds a string, or the update does not fit the kind.
    fn conformed(&self, update: &str) -> String {
        let Some(current) = self.value() else {
            return update.to_owned();
        };
        match decode(current.trim()).kind() {
            FieldKind::String => update.to_owned(),
            kind => FieldValue::coerce(kind, update)
                .map_or_else(|| update.to_owned(), |value| encode(&value)),
        }
    }

    fn set_value(&mut self, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == "value") {
            Some((_, v)) => *v = value.to_owned(),
            None => self.attrs.push(("value".to_owned(), value.to_owned())),
        }
    }

    fn write_open(&self, out: &mut String, self_closing: bool) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            let _ = write!(out, " {key}=\"{}\"", escape_attr(value));
        }
        out.push_str(if self_closing { "/>" } else { ">" });
    }
}

enum Node {
    Element(Element),
    Comment(String),
}

struct Tree {
    root: Element,
    children: Vec<Node>,
}

fn xml_error(reader: &Reader<&[u8]>, source: quick_xml::Error) -> MergeError {
    MergeError::Xml {
        position: reader.error_position(),
        source,
    }
}

/// Read the root and its direct children. Nested content is skipped.
fn read_tree(text: &str) -> Result<Tree, MergeError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut root: Option<Element> = None;
    let mut closed = false;
    let mut children = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if root.is_none() {
                    root = Some(Element::from_start(&e)?);
                } else if !closed {
                    children.push(Node::Element(Element::from_start(&e)?));
                    reader
                        .read_to_end(e.name())
                        .map_err(|err| xml_error(&reader, err))?;
                }
            }
            Ok(Event::Empty(e)) => {
                if root.is_none() {
                    root = Some(Element::from_start(&e)?);
                    closed = true;
                } else if !closed {
                    children.push(Node::Element(Element::from_start(&e)?));
                }
            }
            Ok(Event::End(_)) => closed = true,
            Ok(Event::Comment(c)) if root.is_some() && !closed => {
                children.push(Node::Comment(String::from_utf8_lossy(&c).into_owned()));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(xml_error(&reader, e)),
        }
    }

    let root = root.ok_or(MergeError::NoRoot)?;
    Ok(Tree { root, children })
}

fn write_tree(tree: &Tree) -> String {
    let mut out = String::with_capacity(64 * (tree.children.len() + 2));
    out.push_str(XML_DECLARATION);
    out.push('\n');
    tree.root.write_open(&mut out, false);
    out.push('\n');
    for child in &tree.children {
        out.push('\t');
        match child {
            Node::Element(e) => e.write_open(&mut out, true),
            Node::Comment(c) => {
                let _ = write!(out, "<!--{c}-->");
            }
        }
        out.push('\n');
    }
    let _ = writeln!(out, "</{}>", tree.root.name);
    out
}

// ============================================================================
// Public API
// ============================================================================

/// Merge `updates` into `existing` and report what was applied.
pub fn reconcile(
    existing: &str,
    updates: &FxHashMap<String, String>,
) -> Result<MergeOutcome, MergeError> {
    let mut tree = read_tree(existing)?;

    let mut applied = 0;
    let mut matched = FxHashSet::default();
    for child in &mut tree.children {
        if let Node::Element(e) = child
            && let Some(update) = updates.get(&e.name)
        {
            let value = e.conformed(update);
            e.set_value(&value);
            matched.insert(e.name.clone());
            applied += 1;
        }
    }

    let mut unknown: Vec<String> = updates
        .keys()
        .filter(|k| !matched.contains(*k))
        .cloned()
        .collect();
    unknown.sort();

    Ok(MergeOutcome {
        text: write_tree(&tree),
        applied,
        unknown,
    })
}

/// Merge `updates` into `existing`, returning the new document text.
pub fn merge(existing: &str, updates: &FxHashMap<String, String>) -> Result<String, MergeError> {
    reconcile(existing, updates).map(|outcome| outcome.text)
}

/// `(tag, value)` of every direct child carrying a `value` attribute.
pub fn read_values(text: &str) -> Result<Vec<(String, String)>, MergeError> {
    let tree = read_tree(text)?;
    Ok(tree
        .children
        .iter()
        .filter_map(|node| match node {
            Node::Element(e) => e.value().map(|v| (e.name.clone(), v.to_owned())),
            Node::Comment(_) => None,
        })
        .collect())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::EditSet;

    const DOC: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<rage__GraphicsOptions v=\"83.0\">\n\
    <Fullscreen value=\"false\"/>\n\
    <!-- display -->\n\
    <ResolutionX value=\"1600\"/>\n\
    <ResolutionY value=\"720\"  />\n\
</rage__GraphicsOptions>\n";

    fn updates(pairs: &[(&str, &str)]) -> FxHashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_empty_update_keeps_values() {
        let merged = merge(DOC, &FxHashMap::default()).unwrap();
        assert_eq!(read_values(&merged).unwrap(), read_values(DOC).unwrap());
    }

    #[test]
    fn test_normalized_output() {
        let merged = merge(DOC, &updates(&[("ResolutionX", "1920")])).unwrap();
        assert_eq!(
            merged,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<rage__GraphicsOptions v=\"83.0\">\n\
\t<Fullscreen value=\"false\"/>\n\
\t<!-- display -->\n\
\t<ResolutionX value=\"1920\"/>\n\
\t<ResolutionY value=\"720\"/>\n\
</rage__GraphicsOptions>\n"
        );
    }

    #[test]
    fn test_unknown_keys_not_fabricated() {
        let outcome = reconcile(DOC, &updates(&[("Bogus", "1"), ("Fullscreen", "true")])).unwrap();
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.unknown, ["Bogus"]);
        assert!(!outcome.text.contains("Bogus"));
        assert_eq!(
            read_values(&outcome.text).unwrap()[0],
            ("Fullscreen".to_string(), "true".to_string())
        );
    }

    #[test]
    fn test_other_attributes_preserved() {
        let text = "<Root v=\"2\" flavor=\"a&amp;b\">\n<A min=\"0\" value=\"1\"/>\n</Root>";
        let merged = merge(text, &updates(&[("A", "5")])).unwrap();
        assert!(merged.contains("<Root v=\"2\" flavor=\"a&amp;b\">"));
        assert!(merged.contains("\t<A min=\"0\" value=\"5\"/>"));
    }

    #[test]
    fn test_missing_value_attribute_is_added() {
        let merged = merge("<Root>\n<A/>\n</Root>", &updates(&[("A", "x")])).unwrap();
        assert!(merged.contains("\t<A value=\"x\"/>"));
    }

    #[test]
    fn test_nested_children_flattened() {
        let text = "<Root>\n<A value=\"1\"><Inner value=\"2\"/></A>\n<B value=\"3\"/>\n</Root>";
        let values = read_values(text).unwrap();
        assert_eq!(
            values,
            [
                ("A".to_string(), "1".to_string()),
                ("B".to_string(), "3".to_string())
            ]
        );
        let merged = merge(text, &FxHashMap::default()).unwrap();
        assert!(merged.contains("\t<A value=\"1\"/>\n\t<B value=\"3\"/>"));
        assert!(!merged.contains("Inner"));
    }

    #[test]
    fn test_self_closing_root() {
        let merged = merge("<Root v=\"1\"/>", &updates(&[("A", "1")])).unwrap();
        assert_eq!(
            merged,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Root v=\"1\">\n</Root>\n"
        );
    }

    #[test]
    fn test_no_root() {
        assert!(matches!(merge("", &FxHashMap::default()), Err(MergeError::NoRoot)));
        assert!(matches!(
            merge("LANGUAGE=en", &FxHashMap::default()),
            Err(MergeError::NoRoot)
        ));
    }

    #[test]
    fn test_malformed_input() {
        let result = merge("<Root>\n<A value=\"1\">\n</Root>", &FxHashMap::default());
        assert!(matches!(result, Err(MergeError::Xml { .. })));
    }

    #[test]
    fn test_integer_literal_into_float_field() {
        let text = "<Root v=\"1\">\n\t<PeakBrightness value=\"100.000000\"/>\n</Root>\n";
        let updates = EditSet::from_assignments(["PeakBrightness=400"])
            .unwrap()
            .to_update_map();
        let merged = merge(text, &updates).unwrap();
        assert!(merged.contains("\t<PeakBrightness value=\"400.000000\"/>"));
    }

    #[test]
    fn test_update_that_does_not_fit_kind_kept_verbatim() {
        let text = "<Root>\n<A value=\"1\"/>\n<B value=\"true\"/>\n</Root>";
        let merged = merge(text, &updates(&[("A", "high"), ("B", "TRUE")])).unwrap();
        assert!(merged.contains("\t<A value=\"high\"/>"));
        assert!(merged.contains("\t<B value=\"true\"/>"));
    }

    #[test]
    fn test_escaped_values_round_trip() {
        let merged = merge("<Root>\n<L value=\"x\"/>\n</Root>", &updates(&[("L", "a<b")])).unwrap();
        assert!(merged.contains("value=\"a&lt;b\""));
        assert_eq!(read_values(&merged).unwrap()[0].1, "a<b");
    }
}
