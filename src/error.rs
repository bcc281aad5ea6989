//! Error types for the dispatch console
//!
//! Splits failures the way callers need to react to them: validation
//! problems go back to the form, an expired session goes back to login,
//! everything else is shown as-is.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::session::Scope;

/// Errors surfaced by API calls
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request never produced an HTTP response
    #[error("Network error: {0}")]
    Network(String),

    /// Server rejected the payload (HTTP 422)
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        errors: BTreeMap<String, Vec<String>>,
    },

    /// Any other non-2xx response
    #[error("Request failed with status {status}: {message}")]
    Status {
        status: u16,
        message: String,
        body: String,
    },

    /// Refresh was impossible; stored tokens for the scope were cleared
    #[error("Session expired for {scope} scope, login required")]
    LoginRequired { scope: Scope },

    /// Response body did not match the expected envelope
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Request could not be built (bad URL, header or method)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Token storage failure
    #[error("Token store error: {0}")]
    Store(#[from] StoreError),
}

/// Token storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read token store {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write token store {path}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Token store {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value: {field} - {reason}")]
    ValidationError { field: String, reason: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

impl ApiError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { .. } => Some(422),
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the caller should send the user back to the login view
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::LoginRequired { .. })
    }

    /// Field-level messages from a 422 response
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            ApiError::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        self.user_hint()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ApiError::InvalidRequest(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Trait for providing user-friendly hints
pub trait UserHint {
    fn user_hint(&self) -> String;
}

impl UserHint for ApiError {
    fn user_hint(&self) -> String {
        match self {
            ApiError::Network(_) => {
                "Could not reach the server. Check your connection and the configured base URL.".into()
            }
            ApiError::Validation { message, errors } => {
                if errors.is_empty() {
                    return message.clone();
                }
                let fields: Vec<String> = errors
                    .iter()
                    .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
                    .collect();
                format!("{} ({})", message, fields.join("; "))
            }
            ApiError::Status { status, message, .. } => {
                if message.is_empty() {
                    format!("Something went wrong (HTTP {})", status)
                } else {
                    message.clone()
                }
            }
            ApiError::LoginRequired { .. } => {
                "Your session has expired. Please log in again.".into()
            }
            ApiError::Store(e) => e.user_hint(),
            _ => self.to_string(),
        }
    }
}

impl UserHint for StoreError {
    fn user_hint(&self) -> String {
        match self {
            StoreError::Read { path, .. } | StoreError::Write { path, .. } => {
                format!("Could not access '{}'. Check file permissions.", path)
            }
            StoreError::Corrupt { path, .. } => {
                format!("Session file '{}' is unreadable. Delete it and log in again.", path)
            }
        }
    }
}

impl UserHint for ConfigError {
    fn user_hint(&self) -> String {
        match self {
            ConfigError::ValidationError { field, reason } => {
                format!("Invalid value for '{}': {}", field, reason)
            }
            ConfigError::ParseError(_) => {
                "The configuration file has invalid syntax. Check for TOML formatting errors.".into()
            }
        }
    }
}
