//! Built-in document used when the target cannot be read.

use super::field::escape_attr;
use super::value::{FieldValue, encode};
use std::fmt::Write as _;

pub const DEFAULT_ROOT_TAG: &str = "rage__GraphicsOptions";
pub const DEFAULT_ROOT_VERSION: &str = "83.0";

/// Fields of a stock configuration, in file order.
pub const DEFAULT_FIELDS: &[(&str, FieldValue)] = &[
    ("Fullscreen", FieldValue::Boolean(false)),
    ("Monitor", FieldValue::Integer(1)),
    ("ResolutionX", FieldValue::Integer(1600)),
    ("ResolutionY", FieldValue::Integer(720)),
    ("RefreshRate", FieldValue::Float(0.0)),
    ("FrameRateLimit", FieldValue::Integer(0)),
    ("Vsync", FieldValue::Integer(1)),
    ("TripleBuffer", FieldValue::Boolean(true)),
    ("DynamicResolution", FieldValue::Boolean(true)),
    ("DynamicResolutionTargetFramerate", FieldValue::Integer(0)),
    ("DynamicResolutionMinScaleIndex", FieldValue::Integer(5)),
    ("MinAnisotropicFiltering", FieldValue::Integer(4)),
    ("MotionBlurStyle", FieldValue::Integer(1)),
    ("MotionBlurStrength", FieldValue::Float(0.1)),
    ("ShadowQuality", FieldValue::Integer(0)),
    ("ShadowSoftness", FieldValue::Integer(0)),
    ("ShadowBlend", FieldValue::Integer(0)),
    ("WorldStreamingRadius", FieldValue::Float(100.0)),
    ("TerrainStreamingFactor", FieldValue::Float(1.0)),
    ("TreeLevelOfDetail", FieldValue::Float(1.0)),
    ("TreeImposterHighLodStreamingDistance", FieldValue::Float(0.0)),
    ("GrassStreamingDistance", FieldValue::Float(0.0)),
    ("bFocusPaused", FieldValue::Boolean(true)),
    ("bConstrainMouse", FieldValue::Boolean(false)),
    ("HDR", FieldValue::Boolean(false)),
    ("PeakBrightness", FieldValue::Float(100.0)),
    ("PaperWhite", FieldValue::Float(80.0)),
    ("aaAntiAliasing", FieldValue::Integer(1)),
    ("FSR3UpscalingQuality", FieldValue::Integer(0)),
    ("FSR3AdditionalSharpness", FieldValue::Float(0.0)),
    ("NVIDIAReflex", FieldValue::Integer(0)),
    ("DLSSUpscalingQuality", FieldValue::Integer(0)),
    ("DLSSFrameGeneration", FieldValue::Integer(0)),
    ("MobilePreset", FieldValue::Integer(0)),
    ("ScreenPercentage", FieldValue::Float(1.0)),
];

/// Render the stock document under the given root tag.
pub fn default_document(root_tag: &str, version: Option<&str>) -> String {
    let mut out = String::with_capacity(48 * (DEFAULT_FIELDS.len() + 3));
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    match version {
        Some(v) => {
            let _ = writeln!(out, "<{root_tag} v=\"{}\">", escape_attr(v));
        }
        None => {
            let _ = writeln!(out, "<{root_tag}>");
        }
    }
    for (name, value) in DEFAULT_FIELDS {
        let _ = writeln!(out, "\t<{name} value=\"{}\"/>", encode(value));
    }
    let _ = write!(out, "</{root_tag}>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::document::parse;
    use crate::settings::patch;

    fn stock() -> String {
        default_document(DEFAULT_ROOT_TAG, Some(DEFAULT_ROOT_VERSION))
    }

    #[test]
    fn test_default_document_parses() {
        let text = stock();
        let doc = parse(&text).unwrap();
        assert_eq!(doc.fields().len(), DEFAULT_FIELDS.len());
        assert_eq!(doc.root().unwrap().version.as_deref(), Some("83.0"));
        for ((name, value), field) in DEFAULT_FIELDS.iter().zip(doc.fields()) {
            assert_eq!(field.name, *name);
            assert!(field.value().same_as(value), "{name}");
        }
        assert_eq!(patch::apply(&doc), text);
    }

    #[test]
    fn test_default_document_layout() {
        let text = stock();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[1], "<rage__GraphicsOptions v=\"83.0\">");
        assert_eq!(lines[2], "\t<Fullscreen value=\"false\"/>");
        assert_eq!(lines[15], "\t<MotionBlurStrength value=\"0.100000\"/>");
        assert_eq!(lines.last(), Some(&"</rage__GraphicsOptions>"));
    }

    #[test]
    fn test_custom_root() {
        let text = default_document("Options", None);
        assert!(text.contains("\n<Options>\n"));
        assert!(text.ends_with("</Options>"));
    }
}
