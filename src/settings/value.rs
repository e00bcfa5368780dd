//! Value codec for field attributes.
//!
//! The external consumer writes three scalar encodings into `value="..."`:
//!
//! | Kind      | Text form                  | Example      |
//! |-----------|----------------------------|--------------|
//! | `Boolean` | `true` / `false`           | `true`       |
//! | `Integer` | plain decimal              | `1920`       |
//! | `Float`   | exactly 6 decimal places   | `0.100000`   |
//!
//! Anything else is kept verbatim as a `String` value.

use serde::Serialize;
use std::fmt;

// ============================================================================
// Types
// ============================================================================

/// Semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Boolean,
    Integer,
    Float,
    String,
}

impl FieldKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed value of a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl FieldValue {
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Boolean(_) => FieldKind::Boolean,
            Self::Integer(_) => FieldKind::Integer,
            Self::Float(_) => FieldKind::Float,
            Self::String(_) => FieldKind::String,
        }
    }

    /// Interpret caller input as a value of `kind`.
    ///
    /// Integer literals are accepted for float fields. Returns `None` when the
    /// text does not fit the kind.
    pub fn coerce(kind: FieldKind, raw: &str) -> Option<Self> {
        if kind == FieldKind::String {
            return Some(Self::String(raw.to_owned()));
        }
        match (kind, decode(raw.trim())) {
            (FieldKind::Float, Self::Integer(i)) => Some(Self::Float(i as f64)),
            (kind, value) if value.kind() == kind => Some(value),
            _ => None,
        }
    }

    /// Promote `self` to `kind` where that is lossless.
    pub fn into_kind(self, kind: FieldKind) -> Option<Self> {
        match (kind, self) {
            (FieldKind::Float, Self::Integer(i)) => Some(Self::Float(i as f64)),
            (kind, value) if value.kind() == kind => Some(value),
            _ => None,
        }
    }

    /// Two values are the same setting when their encodings match.
    pub fn same_as(&self, other: &Self) -> bool {
        self.kind() == other.kind() && encode(self) == encode(other)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode(self))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

// ============================================================================
// Codec
// ============================================================================

/// Classify and parse a raw attribute value.
///
/// Order: boolean (case-insensitive), integer, finite float, string.
pub fn decode(raw: &str) -> FieldValue {
    if raw.eq_ignore_ascii_case("true") {
        return FieldValue::Boolean(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return FieldValue::Boolean(false);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => FieldValue::Float(f),
        _ => FieldValue::String(raw.to_owned()),
    }
}

/// Render a value in the consumer's text form.
pub fn encode(value: &FieldValue) -> String {
    match value {
        FieldValue::Boolean(b) => b.to_string(),
        FieldValue::Integer(i) => i.to_string(),
        FieldValue::Float(f) => format!("{f:.6}"),
        FieldValue::String(s) => s.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================
