//! API response types

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// HTTP response as seen by the executor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,

    /// Response headers, names lowercased
    pub headers: HashMap<String, String>,

    /// Response body
    pub body: Vec<u8>,

    /// Response time in milliseconds
    pub duration_ms: u64,
}

/// Error body the server sends with non-2xx responses
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, FieldMessages>,
}

/// Field errors come as a list, occasionally as a bare string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldMessages {
    Many(Vec<String>),
    One(String),
}

impl From<FieldMessages> for Vec<String> {
    fn from(messages: FieldMessages) -> Self {
        match messages {
            FieldMessages::Many(list) => list,
            FieldMessages::One(single) => vec![single],
        }
    }
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Default::default()
        }
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_validation_error(&self) -> bool {
        self.status == 422
    }

    /// Get body as string
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Parse body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Get a specific header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Convert a non-2xx response into the matching error.
    /// 422 keeps the server's per-field messages.
    pub fn into_error(self) -> ApiError {
        let parsed: ErrorBody = serde_json::from_slice(&self.body).unwrap_or_default();

        if self.is_validation_error() {
            return ApiError::Validation {
                message: parsed
                    .message
                    .unwrap_or_else(|| "The given data was invalid.".to_string()),
                errors: parsed
                    .errors
                    .into_iter()
                    .map(|(field, messages)| (field, messages.into()))
                    .collect(),
            };
        }

        let body = self.body_text();
        ApiError::Status {
            status: self.status,
            message: parsed.message.unwrap_or_default(),
            body,
        }
    }
}
