//! A single configuration entry.

use super::infer::{FieldRange, infer_range};
use super::value::{FieldKind, FieldValue, decode, encode};
use serde::Serialize;
use std::borrow::Cow;

/// One `<Name value="..."/>` line of the target file.
///
/// The value is a tagged union; name, line and modification state are shared
/// metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    value: FieldValue,
    #[serde(skip)]
    original: FieldValue,
    pub range: Option<FieldRange>,
    /// 1-based line number in the text the field was parsed from.
    pub source_line: usize,
    modified: bool,
}

impl Field {
    /// Build a field from its tag name and raw attribute text.
    pub fn parse(name: impl Into<String>, raw: &str, source_line: usize) -> Self {
        let name = name.into();
        let value = decode(raw);
        let range = infer_range(&name, &value);
        Self {
            name,
            original: value.clone(),
            value,
            range,
            source_line,
            modified: false,
        }
    }

    #[inline]
    pub fn kind(&self) -> FieldKind {
        self.value.kind()
    }

    #[inline]
    pub fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Value as parsed at load time.
    #[inline]
    pub fn original(&self) -> &FieldValue {
        &self.original
    }

    #[inline]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Replace the value without clamping.
    ///
    /// Returns `None` if `value` cannot be stored in a field of this kind,
    /// otherwise whether the field now differs from its load-time value.
    pub fn set(&mut self, value: FieldValue) -> Option<bool> {
        let value = value.into_kind(self.kind())?;
        self.modified = !value.same_as(&self.original);
        self.value = value;
        Some(self.modified)
    }

    /// Parse `raw` according to this field's kind and store it.
    pub fn set_raw(&mut self, raw: &str) -> Option<bool> {
        let value = FieldValue::coerce(self.kind(), raw)?;
        self.set(value)
    }

    /// Drop any in-memory edit.
    pub fn reset(&mut self) {
        self.value = self.original.clone();
        self.modified = false;
    }

    /// Current value in the consumer's text form.
    pub fn encoded(&self) -> String {
        encode(&self.value)
    }

    /// Render as a field line with the given indentation.
    pub fn render(&self, indent: &str) -> String {
        format!("{indent}<{} value=\"{}\"/>", self.name, escape_attr(&self.encoded()))
    }
}

/// Escape the characters that would break a double-quoted attribute.
///
/// Scalar encodings never contain these; only string fields can.
pub(crate) fn escape_attr(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}
