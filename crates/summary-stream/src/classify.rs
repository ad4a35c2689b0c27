//! Per-unit classification of decoded text.

/// Field read from structured units.
pub const SUMMARY_FIELD: &str = "summary";

/// Outcome of classifying one decoded unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassifiedContent {
    /// The unit was a JSON object with a string `summary` field.
    Structured(String),
    /// Anything else, kept verbatim.
    Opaque(String),
}

impl ClassifiedContent {
    /// Text this content contributes to the aggregate output.
    pub fn text(&self) -> &str {
        match self {
            Self::Structured(text) | Self::Opaque(text) => text,
        }
    }

    /// Consumes the content and returns its text.
    pub fn into_text(self) -> String {
        match self {
            Self::Structured(text) | Self::Opaque(text) => text,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

/// Classifies decoded units as structured summary records or opaque text.
///
/// Each unit is judged on its own. A JSON object split across two chunks
/// arrives as two fragments, and both classify as `Opaque`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChunkClassifier;

impl ChunkClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classifies one unit. Never fails: anything that is not a record with a
    /// string summary is `Opaque`.
    pub fn classify(&self, text: &str) -> ClassifiedContent {
        match extract_summary(text) {
            Some(summary) => ClassifiedContent::Structured(summary),
            None => ClassifiedContent::Opaque(text.to_owned()),
        }
    }
}

fn extract_summary(text: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    value
        .get(SUMMARY_FIELD)
        .and_then(|v| v.as_str())
        .map(ToOwned::to_owned)
}
