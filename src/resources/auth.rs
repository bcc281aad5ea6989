//! Login and logout

use reqwest::Method;
use serde::Serialize;

use super::Envelope;
use crate::error::ApiError;
use crate::http::auth::{token_hint, TokenPayload};
use crate::http::{ApiClient, ApiRequest};
use crate::session::{Scope, Session};

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Starts and ends sessions for either scope
#[derive(Clone, Copy)]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for tokens and store them for `scope`.
    ///
    /// The login response carries a single token unless the server issues a
    /// separate refresh token, so the access token doubles as the refresh
    /// credential in that case.
    pub async fn login(&self, scope: Scope, credentials: &Credentials) -> Result<Session, ApiError> {
        let path = self.client.settings().auth_path(scope, "login");
        let request = ApiRequest::builder(Method::POST, &path)
            .json(credentials)
            .build()?;

        let response = self.client.execute_anonymous(&request).await?;
        let envelope: Envelope<TokenPayload> = response.json()?;
        if envelope.data.token.is_empty() {
            return Err(ApiError::Status {
                status: response.status,
                message: "login response carried an empty token".to_string(),
                body: String::new(),
            });
        }

        let session = Session::from_login(envelope.data.token, envelope.data.refresh_token);
        self.client.session().begin(scope, &session)?;
        tracing::info!(
            %scope,
            email = %credentials.email,
            token = %token_hint(&session.access_token),
            "Signed in"
        );
        Ok(session)
    }

    /// Tell the server the session is over, then drop the local tokens.
    ///
    /// Local tokens are cleared whatever the server answers. An already
    /// expired session is not an error.
    pub async fn logout(&self, scope: Scope) -> Result<(), ApiError> {
        let path = self.client.settings().auth_path(scope, "logout");
        let outcome: Result<serde_json::Value, ApiError> =
            self.client.scoped(scope).post(&path, &serde_json::json!({})).await;

        self.client.session().end(scope)?;
        tracing::info!(%scope, "Signed out");

        match outcome {
            Ok(_) => Ok(()),
            Err(e) if e.requires_login() || e.status() == Some(401) => {
                tracing::debug!(%scope, error = %e, "Server session was already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
