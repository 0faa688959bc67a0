use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tagged unit of tool output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
    Json { json: Value },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn json(json: Value) -> Self {
        Self::Json { json }
    }
}

/// Line selector forwarded verbatim to the backend (`"40"`, `"10-20"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineRange(pub String);

impl LineRange {
    /// Accept a JSON number or a non-empty string.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self(n.to_string())),
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            _ => None,
        }
    }
}

impl std::fmt::Display for LineRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Normalized result list of a backend search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResults(pub Vec<Value>);

impl SearchResults {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Normalized payload of a backend fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileContent(pub Value);

impl FileContent {
    /// Literal text, present only when the backend flagged the file as inline.
    #[must_use]
    pub fn inline_text(&self) -> Option<&str> {
        let inline = self.0.get("inline").and_then(Value::as_bool).unwrap_or(false);
        if !inline {
            return None;
        }
        self.0.get("text").and_then(Value::as_str)
    }
}
