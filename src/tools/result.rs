//! Invocation result shared by every tool.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of one tool call: either content with metadata, or an error.
///
/// On the wire this is `{success, content, error, metadata}` with exactly one
/// of `content`/`error` populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ToolResultWire", try_from = "ToolResultWire")]
pub enum ToolResult {
    Success {
        content: Value,
        metadata: Map<String, Value>,
    },
    Failure {
        error: String,
    },
}

impl ToolResult {
    #[inline]
    pub fn success(content: impl Into<Value>) -> Self {
        Self::Success {
            content: content.into(),
            metadata: Map::new(),
        }
    }

    #[inline]
    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    /// Attach a metadata entry. Failures carry no metadata, so this is a
    /// no-op on them.
    #[must_use]
    #[inline]
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let Self::Success { metadata, .. } = &mut self {
            metadata.insert(key.to_string(), value.into());
        }
        self
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[inline]
    pub fn content(&self) -> Option<&Value> {
        match self {
            Self::Success { content, .. } => Some(content),
            Self::Failure { .. } => None,
        }
    }

    #[inline]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }

    #[inline]
    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Success { metadata, .. } => Some(metadata),
            Self::Failure { .. } => None,
        }
    }

    /// Text rendering for clients: string content verbatim, anything else as
    /// pretty JSON, failures as their error message.
    #[inline]
    pub fn text(&self) -> String {
        match self {
            Self::Success {
                content: Value::String(s),
                ..
            } => s.clone(),
            Self::Success { content, .. } => {
                serde_json::to_string_pretty(content).unwrap_or_else(|_| content.to_string())
            }
            Self::Failure { error } => error.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ToolResultWire {
    success: bool,
    content: Option<Value>,
    error: Option<String>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl From<ToolResult> for ToolResultWire {
    #[inline]
    fn from(result: ToolResult) -> Self {
        match result {
            ToolResult::Success { content, metadata } => Self {
                success: true,
                content: Some(content),
                error: None,
                metadata,
            },
            ToolResult::Failure { error } => Self {
                success: false,
                content: None,
                error: Some(error),
                metadata: Map::new(),
            },
        }
    }
}

impl TryFrom<ToolResultWire> for ToolResult {
    type Error = String;

    #[inline]
    fn try_from(wire: ToolResultWire) -> Result<Self, Self::Error> {
        match (wire.success, wire.content, wire.error) {
            (true, _, Some(_)) => Err("a successful result cannot carry an error".to_string()),
            (true, content, None) => Ok(Self::Success {
                content: content.unwrap_or(Value::Null),
                metadata: wire.metadata,
            }),
            (false, Some(content), _) if !content.is_null() => {
                Err("a failed result cannot carry content".to_string())
            }
            (false, _, Some(error)) => Ok(Self::Failure { error }),
            (false, _, None) => Err("a failed result must carry an error message".to_string()),
        }
    }
}
