use serde::{Deserialize, Serialize};

/// Error body returned by the gateways. The account service answers with a
/// flat `{ "message": ... }`, the card service nests it under `error`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiErrorBody {
    pub message: Option<String>,
    pub error: Option<NestedError>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NestedError {
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Nested `error.message` wins over the top-level `message`.
    pub fn into_message(self) -> Option<String> {
        self.error
            .and_then(|e| e.message)
            .or(self.message)
            .filter(|m| !m.trim().is_empty())
    }
}
