//! Heuristic range inference from field names.
//!
//! The target file carries no schema, so slider bounds are guessed from the
//! tag name. Rules are case-insensitive substring matches evaluated in order;
//! the first match wins. Unmatched names get a window of ±50 around the
//! current value. Every range is widened to contain the current value.

use super::value::FieldValue;
use serde::Serialize;

// ============================================================================
// Range types
// ============================================================================

/// Inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, v: T) -> bool {
        self.min <= v && v <= self.max
    }

    /// Extend the bounds so that `v` is inside.
    fn widened(self, v: T) -> Self {
        Self {
            min: if v < self.min { v } else { self.min },
            max: if v > self.max { v } else { self.max },
        }
    }

    fn clamp(&self, v: T) -> T {
        if v < self.min {
            self.min
        } else if v > self.max {
            self.max
        } else {
            v
        }
    }
}

/// Advisory range of a field, typed like its value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldRange {
    Boolean,
    Integer(Bounds<i64>),
    Float(Bounds<f64>),
}

impl FieldRange {
    pub fn contains(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (Self::Boolean, FieldValue::Boolean(_)) => true,
            (Self::Integer(b), FieldValue::Integer(v)) => b.contains(*v),
            (Self::Float(b), FieldValue::Float(v)) => b.contains(*v),
            _ => false,
        }
    }

    /// Clamp for slider-style consumers. The patch path never calls this.
    pub fn clamp(&self, value: &FieldValue) -> FieldValue {
        match (self, value) {
            (Self::Integer(b), FieldValue::Integer(v)) => FieldValue::Integer(b.clamp(*v)),
            (Self::Float(b), FieldValue::Float(v)) => FieldValue::Float(b.clamp(*v)),
            _ => value.clone(),
        }
    }

    /// `(min, max)` in the consumer's text form.
    pub fn encoded(&self) -> (String, String) {
        match self {
            Self::Boolean => ("false".into(), "true".into()),
            Self::Integer(b) => (b.min.to_string(), b.max.to_string()),
            Self::Float(b) => (format!("{:.6}", b.min), format!("{:.6}", b.max)),
        }
    }
}

// ============================================================================
// Rule tables
// ============================================================================

/// Name pattern: substring plus optional extra condition.
struct Rule<T> {
    needle: &'static str,
    matcher: Matcher,
    bounds: Bounds<T>,
}

#[derive(Clone, Copy)]
enum Matcher {
    Contains,
    /// Contains the needle and ends with the given character.
    EndsWith(char),
    /// Contains the needle but not the excluded word.
    Without(&'static str),
}

const fn rule<T>(needle: &'static str, min: T, max: T) -> Rule<T> {
    Rule {
        needle,
        matcher: Matcher::Contains,
        bounds: Bounds { min, max },
    }
}

const fn rule_with<T>(needle: &'static str, matcher: Matcher, min: T, max: T) -> Rule<T> {
    Rule {
        needle,
        matcher,
        bounds: Bounds { min, max },
    }
}

// Specific names come first: "DynamicResolutionTargetFramerate" is a frame
// rate, not a resolution.
const INTEGER_RULES: &[Rule<i64>] = &[
    rule("scaleindex", 0, 10),
    rule("framerate", 0, 240),
    rule("quality", 0, 4),
    rule("preset", 0, 4),
    rule_with("resolution", Matcher::EndsWith('x'), 640, 3840),
    rule_with("resolution", Matcher::EndsWith('y'), 360, 2160),
    rule("vsync", 0, 1),
    rule("monitor", 1, 4),
    rule("reflex", 0, 2),
    rule("dlss", 0, 4),
    rule("fsr", 0, 4),
    rule("antialiasing", 0, 4),
    rule("filtering", 0, 16),
    rule_with("blur", Matcher::Without("strength"), 0, 2),
    rule("shadow", 0, 4),
];

const FLOAT_RULES: &[Rule<f64>] = &[
    rule("strength", 0.0, 1.0),
    rule("sharpness", 0.0, 1.0),
    rule("percentage", 0.1, 2.0),
    rule("brightness", 50.0, 2000.0),
    rule("white", 50.0, 500.0),
    rule("distance", 0.0, 500.0),
    rule("radius", 50.0, 500.0),
    rule("factor", 0.1, 5.0),
    rule("detail", 0.1, 5.0),
    rule("rate", 0.0, 500.0),
];

const FALLBACK_WINDOW: i64 = 50;

fn lookup<T: Copy>(rules: &[Rule<T>], name: &str) -> Option<Bounds<T>> {
    let lower = name.to_ascii_lowercase();
    rules
        .iter()
        .find(|r| {
            lower.contains(r.needle)
                && match r.matcher {
                    Matcher::Contains => true,
                    Matcher::EndsWith(c) => lower.ends_with(c),
                    Matcher::Without(word) => !lower.contains(word),
                }
        })
        .map(|r| r.bounds)
}

// ============================================================================
// Public API
// ============================================================================

/// Infer the advisory range of a field.
///
/// Returns `None` only for string values. The result always contains `value`.
pub fn infer_range(name: &str, value: &FieldValue) -> Option<FieldRange> {
    match value {
        FieldValue::Boolean(_) => Some(FieldRange::Boolean),
        FieldValue::Integer(v) => {
            let bounds = lookup(INTEGER_RULES, name).unwrap_or_else(|| {
                Bounds::new(
                    v.saturating_sub(FALLBACK_WINDOW),
                    v.saturating_add(FALLBACK_WINDOW),
                )
            });
            Some(FieldRange::Integer(bounds.widened(*v)))
        }
        FieldValue::Float(v) => {
            let window = FALLBACK_WINDOW as f64;
            let bounds = lookup(FLOAT_RULES, name)
                .unwrap_or_else(|| Bounds::new(v - window, v + window));
            Some(FieldRange::Float(bounds.widened(*v)))
        }
        FieldValue::String(_) => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn int_bounds(name: &str, v: i64) -> Bounds<i64> {
        match infer_range(name, &FieldValue::Integer(v)) {
            Some(FieldRange::Integer(b)) => b,
            other => panic!("unexpected range {other:?}"),
        }
    }

    fn float_bounds(name: &str, v: f64) -> Bounds<f64> {
        match infer_range(name, &FieldValue::Float(v)) {
            Some(FieldRange::Float(b)) => b,
            other => panic!("unexpected range {other:?}"),
        }
    }

    #[test]
    fn test_quality_range() {
        assert_eq!(int_bounds("ShadowQuality", 2), Bounds::new(0, 4));
        assert_eq!(int_bounds("fsr3upscalingquality", 0), Bounds::new(0, 4));
    }

    #[test]
    fn test_resolution_axes() {
        assert_eq!(int_bounds("ResolutionX", 1600), Bounds::new(640, 3840));
        assert_eq!(int_bounds("ResolutionY", 720), Bounds::new(360, 2160));
    }

    #[test]
    fn test_framerate_beats_resolution() {
        assert_eq!(
            int_bounds("DynamicResolutionTargetFramerate", 0),
            Bounds::new(0, 240)
        );
        assert_eq!(
            int_bounds("DynamicResolutionMinScaleIndex", 5),
            Bounds::new(0, 10)
        );
    }

    #[test]
    fn test_blur_excludes_strength() {
        assert_eq!(int_bounds("MotionBlurStyle", 1), Bounds::new(0, 2));
        // An integer "...BlurStrength" falls through to the window.
        assert_eq!(int_bounds("MotionBlurStrength", 1), Bounds::new(-49, 51));
    }

    #[test]
    fn test_float_rules() {
        assert_eq!(float_bounds("PeakBrightness", 100.0), Bounds::new(50.0, 2000.0));
        assert_eq!(float_bounds("MotionBlurStrength", 0.1), Bounds::new(0.0, 1.0));
        assert_eq!(float_bounds("RefreshRate", 60.0), Bounds::new(0.0, 500.0));
    }

    #[test]
    fn test_fallback_window() {
        assert_eq!(int_bounds("Unknown", 100), Bounds::new(50, 150));
        assert_eq!(float_bounds("Mystery", 10.0), Bounds::new(-40.0, 60.0));
    }

    #[test]
    fn test_widened_to_contain_current() {
        assert_eq!(int_bounds("ResolutionX", 7680), Bounds::new(640, 7680));
        assert_eq!(float_bounds("PeakBrightness", 10.0), Bounds::new(10.0, 2000.0));
        assert_eq!(int_bounds("Huge", i64::MAX).max, i64::MAX);
    }

    #[test]
    fn test_range_always_contains_value() {
        let names = ["Quality", "ResolutionX", "Monitor", "Foo", "Rate", "Radius"];
        for name in names {
            for v in [-1000_i64, -1, 0, 1, 5, 240, 5000] {
                let value = FieldValue::Integer(v);
                assert!(infer_range(name, &value).unwrap().contains(&value));
                let value = FieldValue::Float(v as f64 / 3.0);
                assert!(infer_range(name, &value).unwrap().contains(&value));
            }
        }
    }

    #[test]
    fn test_boolean_and_string() {
        assert_eq!(
            infer_range("HDR", &FieldValue::Boolean(true)),
            Some(FieldRange::Boolean)
        );
        assert_eq!(infer_range("Name", &FieldValue::String("x".into())), None);
    }

    #[test]
    fn test_clamp_for_sliders() {
        let range = infer_range("ShadowQuality", &FieldValue::Integer(2)).unwrap();
        assert_eq!(range.clamp(&FieldValue::Integer(9)), FieldValue::Integer(4));
        assert_eq!(range.clamp(&FieldValue::Integer(3)), FieldValue::Integer(3));
    }
}
