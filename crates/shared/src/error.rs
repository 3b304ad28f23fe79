use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error body returned by the backend on a rejected request. Only `message`
/// is read; the rest is kept for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ApiErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(Value::String(message.into())),
            extra: serde_json::Map::new(),
        }
    }

    pub fn from_value(value: Value) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// The server message, when it is a non-empty string.
    pub fn message(&self) -> Option<&str> {
        match &self.message {
            Some(Value::String(text)) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}
