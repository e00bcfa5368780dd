//! Batches of intended changes submitted by the UI.
//!
//! The UI never flips `modified` flags itself: it collects `NAME=VALUE`
//! intents into an [`EditSet`] and hands the whole batch to the engine.

use super::value::{FieldKind, FieldValue, decode, encode};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Why a single edit could not be applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    #[error("no field named `{0}`")]
    UnknownField(String),

    #[error("`{name}` is {expected}, cannot store `{given}`")]
    KindMismatch {
        name: String,
        expected: FieldKind,
        given: String,
    },

    #[error("expected NAME=VALUE, got `{0}`")]
    Malformed(String),
}

/// New value for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum EditValue {
    /// Text as typed by the user, interpreted with the target field's kind.
    Raw(String),
    Typed(FieldValue),
}

impl EditValue {
    /// Text form for the structural merge path, where field kinds are unknown.
    pub fn encoded(&self) -> String {
        match self {
            Self::Raw(raw) => encode(&decode(raw.trim())),
            Self::Typed(value) => encode(value),
        }
    }
}

/// Ordered batch of edits. Later entries for the same name win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditSet {
    entries: Vec<(String, EditValue)>,
}

impl EditSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `NAME=VALUE` assignments (e.g. from the command line).
    pub fn from_assignments<I, S>(items: I) -> Result<Self, EditError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for item in items {
            let item = item.as_ref();
            match item.split_once('=') {
                Some((name, value)) if !name.trim().is_empty() => {
                    set.push_raw(name.trim(), value);
                }
                _ => return Err(EditError::Malformed(item.to_owned())),
            }
        }
        Ok(set)
    }

    pub fn push_raw(&mut self, name: impl Into<String>, raw: impl Into<String>) -> &mut Self {
        self.entries.push((name.into(), EditValue::Raw(raw.into())));
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.entries
            .push((name.into(), EditValue::Typed(value.into())));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EditValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `{name: encoded}` map for [`merge`](super::merge::merge).
    pub fn to_update_map(&self) -> FxHashMap<String, String> {
        self.entries
            .iter()
            .map(|(name, value)| (name.clone(), value.encoded()))
            .collect()
    }
}

/// Outcome of applying an [`EditSet`] to a document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct EditReport {
    /// Fields whose value now differs from the load-time value.
    pub changed: Vec<String>,
    /// Edits that left the field equal to its load-time value.
    pub unchanged: Vec<String>,
    pub errors: Vec<EditError>,
}

impl EditReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_assignments() {
        let set = EditSet::from_assignments(["ResolutionX=1920", " HDR = true"]).unwrap();
        let entries: Vec<_> = set.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], ("ResolutionX", &EditValue::Raw("1920".into())));
        assert_eq!(entries[1], ("HDR", &EditValue::Raw(" true".into())));
    }

    #[test]
    fn test_from_assignments_malformed() {
        assert_eq!(
            EditSet::from_assignments(["novalue"]),
            Err(EditError::Malformed("novalue".into()))
        );
        assert!(EditSet::from_assignments(["=1"]).is_err());
    }

    #[test]
    fn test_update_map_normalizes_encoding() {
        let mut set = EditSet::new();
        set.push_raw("MotionBlurStrength", "0.25")
            .push_raw("HDR", "TRUE")
            .push("ResolutionY", 1080_i64);
        let map = set.to_update_map();
        assert_eq!(map["MotionBlurStrength"], "0.250000");
        assert_eq!(map["HDR"], "true");
        assert_eq!(map["ResolutionY"], "1080");
    }
}
