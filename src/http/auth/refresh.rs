//! Token refresh call

use serde::Deserialize;

use super::token_hint;
use crate::error::ApiError;
use crate::http::client::Transport;
use crate::http::request::ApiRequest;
use crate::resources::Envelope;

/// Token material returned by the login and refresh endpoints (`data.token`)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenPayload {
    pub token: String,

    /// Present only when the server rotates the refresh credential
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Exchange `refresh_token` for a new access token at `path`.
///
/// Any failure (transport, status or body shape) is an error; the caller
/// decides what an unusable refresh means for the session.
pub(crate) async fn request_new_token(
    transport: &dyn Transport,
    path: &str,
    refresh_token: &str,
) -> Result<TokenPayload, ApiError> {
    let request = ApiRequest::builder(reqwest::Method::POST, path)
        .json(&serde_json::json!({}))
        .build()?;

    tracing::debug!(
        request_id = %request.id,
        path,
        refresh_token = %token_hint(refresh_token),
        "Requesting new access token"
    );

    let response = transport.send(&request, Some(refresh_token)).await?;
    if !response.is_success() {
        return Err(response.into_error());
    }

    let envelope: Envelope<TokenPayload> = response.json()?;
    if envelope.data.token.is_empty() {
        return Err(ApiError::Status {
            status: response.status,
            message: "refresh response carried an empty token".to_string(),
            body: String::new(),
        });
    }
    Ok(envelope.data)
}
