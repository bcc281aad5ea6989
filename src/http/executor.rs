//! Authenticated request executor
//!
//! Every authenticated call goes through [`ApiClient::execute`]:
//!
//! 1. send with the stored access token of the request's scope
//! 2. 2xx: done
//! 3. 401: refresh once with the stored refresh token; if that is impossible
//!    the scope's tokens are cleared and [`ApiError::LoginRequired`] is returned
//! 4. resend once with the new token; whatever comes back is final
//! 5. any other status is returned as an error without touching the session

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::auth::request_new_token;
use super::client::{HttpTransport, Transport};
use super::request::ApiRequest;
use super::response::ApiResponse;
use crate::app::Config;
use crate::error::ApiError;
use crate::session::{Scope, SessionContext};

/// Per-scope URL layout and refresh behaviour
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Path prefix of admin endpoints
    pub admin_prefix: String,

    /// Path prefix of restaurant endpoints
    pub restaurant_prefix: String,

    /// Let concurrent 401s share one refresh call
    pub coalesce_refresh: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            admin_prefix: "admin".to_string(),
            restaurant_prefix: "restaurant".to_string(),
            coalesce_refresh: false,
        }
    }
}

impl ClientSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            admin_prefix: config.scopes.admin_prefix.clone(),
            restaurant_prefix: config.scopes.restaurant_prefix.clone(),
            coalesce_refresh: config.session.coalesce_refresh,
        }
    }

    pub fn prefix(&self, scope: Scope) -> &str {
        match scope {
            Scope::Admin => &self.admin_prefix,
            Scope::Restaurant => &self.restaurant_prefix,
        }
    }

    /// `/<prefix>/auth/<action>`
    pub fn auth_path(&self, scope: Scope, action: &str) -> String {
        format!("/{}/auth/{}", self.prefix(scope).trim_matches('/'), action)
    }
}

/// API client that owns the refresh-and-retry policy
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: SessionContext,
    settings: Arc<ClientSettings>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, session: SessionContext, settings: ClientSettings) -> Self {
        Self {
            transport,
            session,
            settings: Arc::new(settings),
        }
    }

    /// Client talking HTTP to the configured base URL
    pub fn from_config(config: &Config, session: SessionContext) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(&config.api)?;
        tracing::debug!(base_url = %transport.base_url(), "Using API");
        Ok(Self::new(
            Arc::new(transport),
            session,
            ClientSettings::from_config(config),
        ))
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn scoped(&self, scope: Scope) -> ScopedClient<'_> {
        ScopedClient { client: self, scope }
    }

    pub fn admin(&self) -> ScopedClient<'_> {
        self.scoped(Scope::Admin)
    }

    pub fn restaurant(&self) -> ScopedClient<'_> {
        self.scoped(Scope::Restaurant)
    }

    /// Send `request` with the scope's access token, recovering from a
    /// single 401 by refreshing the token and retrying once.
    pub async fn execute(&self, scope: Scope, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let sent_token = self.session.access_token(scope)?;

        let response = self.attempt(scope, request, sent_token.as_deref(), 1).await?;
        if response.is_success() {
            return Ok(response);
        }
        if !response.is_unauthorized() {
            return Err(response.into_error());
        }

        let token = self.recover(scope, sent_token.as_deref()).await?;

        let retried = self.attempt(scope, request, Some(&token), 2).await?;
        if retried.is_success() {
            Ok(retried)
        } else {
            Err(retried.into_error())
        }
    }

    /// Single attempt without a bearer token (login)
    pub async fn execute_anonymous(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.transport.send(request, None).await?;
        tracing::debug!(
            request_id = %request.id,
            method = %request.method,
            path = %request.path,
            status = response.status,
            "Anonymous request"
        );
        if response.is_success() {
            Ok(response)
        } else {
            Err(response.into_error())
        }
    }

    async fn attempt(
        &self,
        scope: Scope,
        request: &ApiRequest,
        token: Option<&str>,
        attempt: u8,
    ) -> Result<ApiResponse, ApiError> {
        let started = Instant::now();
        let result = self.transport.send(request, token).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(response) => tracing::debug!(
                request_id = %request.id,
                %scope,
                method = %request.method,
                path = %request.path,
                attempt,
                status = response.status,
                elapsed_ms,
                "API request"
            ),
            Err(e) => tracing::warn!(
                request_id = %request.id,
                %scope,
                method = %request.method,
                path = %request.path,
                attempt,
                elapsed_ms,
                error = %e,
                "API request failed"
            ),
        }

        result
    }

    /// Obtain a usable access token after a 401
    async fn recover(&self, scope: Scope, sent_token: Option<&str>) -> Result<String, ApiError> {
        if !self.settings.coalesce_refresh {
            return self.refresh(scope).await;
        }

        let _guard = self.session.refresh_gate(scope).lock().await;
        match self.session.access_token(scope)? {
            Some(current) if sent_token != Some(current.as_str()) => {
                tracing::debug!(%scope, "Token already refreshed by a concurrent request");
                return Ok(current);
            }
            None if sent_token.is_some() => {
                tracing::debug!(%scope, "Session already discarded by a concurrent request");
                return Err(ApiError::LoginRequired { scope });
            }
            _ => {}
        }
        self.refresh(scope).await
    }

    async fn refresh(&self, scope: Scope) -> Result<String, ApiError> {
        let Some(refresh_token) = self.session.refresh_token(scope)? else {
            return self.fail_auth(scope, "no refresh token stored");
        };

        let path = self.settings.auth_path(scope, "refresh");
        match request_new_token(self.transport.as_ref(), &path, &refresh_token).await {
            Ok(payload) => {
                self.session
                    .replace_tokens(scope, &payload.token, payload.refresh_token.as_deref())?;
                tracing::info!(%scope, "Access token refreshed");
                Ok(payload.token)
            }
            Err(e) => self.fail_auth(scope, &e.to_string()),
        }
    }

    fn fail_auth<T>(&self, scope: Scope, reason: &str) -> Result<T, ApiError> {
        tracing::warn!(%scope, reason, "Session cannot be refreshed, login required");
        self.session.expire(scope)?;
        Err(ApiError::LoginRequired { scope })
    }
}

/// [`ApiClient`] bound to one scope, with typed JSON helpers
#[derive(Clone, Copy)]
pub struct ScopedClient<'a> {
    client: &'a ApiClient,
    scope: Scope,
}

impl<'a> ScopedClient<'a> {
    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn client(&self) -> &'a ApiClient {
        self.client
    }

    /// Execute and return the raw response
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        self.client.execute(self.scope, request).await
    }

    /// Execute and decode the JSON body. An empty body decodes as `null`.
    pub async fn fetch<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T, ApiError> {
        let response = self.send(request).await?;
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_str("null")?);
        }
        response.json()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(&ApiRequest::get(path)).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::builder(reqwest::Method::POST, path).json(body).build()?;
        self.fetch(&request).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = ApiRequest::builder(reqwest::Method::PUT, path).json(body).build()?;
        self.fetch(&request).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.fetch(&ApiRequest::delete(path)).await
    }
}
