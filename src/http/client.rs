//! HTTP transport implementation

use std::collections::HashMap;
use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use url::Url;

use super::auth::bearer_header;
use super::request::{ApiRequest, Body, FormPart, PartValue};
use super::response::ApiResponse;
use crate::app::ApiConfig;
use crate::error::ApiError;

/// Sends a single request; never retries and never looks at the status.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request`, authorised with `bearer` when present
    async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse, ApiError>;
}

/// reqwest-backed transport bound to the API base URL
pub struct HttpTransport {
    /// Inner reqwest client
    client: reqwest::Client,

    /// Base URL every request path is resolved against
    base_url: Url,
}

impl HttpTransport {
    /// Create a new transport
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("base URL {}: {}", config.base_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn build_form(parts: &[FormPart]) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for part in parts {
            form = match &part.value {
                PartValue::Text(text) => form.text(part.name.clone(), text.clone()),
                PartValue::File {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    let mut file = Part::bytes(bytes.clone()).file_name(file_name.clone());
                    if let Some(mime) = content_type {
                        file = file.mime_str(mime)?;
                    }
                    form.part(part.name.clone(), file)
                }
            };
        }
        Ok(form)
    }

    /// Build response from reqwest response
    async fn build_response(
        response: reqwest::Response,
        started: Instant,
    ) -> Result<ApiResponse, ApiError> {
        let status = response.status().as_u16();

        // Convert headers
        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.as_str().to_string(), v.to_string());
            }
        }

        let body = response.bytes().await?;

        Ok(ApiResponse {
            status,
            headers,
            body: body.to_vec(),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse, ApiError> {
        let started = Instant::now();
        let url = request.full_url(&self.base_url)?;

        let mut builder = self.client.request(request.method.clone(), url);

        // Set headers
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("application/json"));
        for (key, value) in &request.headers {
            let name = HeaderName::from_str(key)
                .map_err(|_| ApiError::InvalidRequest(format!("header name {}", key)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidRequest(format!("header value for {}", key)))?;
            headers.insert(name, value);
        }
        if let Some(token) = bearer {
            let value = HeaderValue::from_str(&bearer_header(token))
                .map_err(|_| ApiError::InvalidRequest("token is not a valid header value".into()))?;
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        builder = builder.headers(headers);

        // Set body
        builder = match &request.body {
            Body::Empty => builder,
            Body::Json(value) => builder.json(value),
            Body::Multipart(parts) => builder.multipart(Self::build_form(parts)?),
        };

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        let response = builder.send().await?;
        Self::build_response(response, started).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn transport_for(server: &MockServer) -> HttpTransport {
        let config = ApiConfig {
            base_url: format!("{}/api/v1", server.uri()),
            ..ApiConfig::default()
        };
        HttpTransport::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_sends_bearer_and_json() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/v1/admin/countries/3"))
            .and(header("authorization", "Bearer abc"))
            .and(body_json(serde_json::json!({"name": "Turkey"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": {"id": 3}})))
            .expect(1)
            .mount(&server)
            .await;

        let request = ApiRequest::builder(reqwest::Method::PUT, "/admin/countries/3")
            .json(&serde_json::json!({"name": "Turkey"}))
            .build()
            .unwrap();
        let response = transport_for(&server).send(&request, Some("abc")).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.body_text(), r#"{"data":{"id":3}}"#);
    }

    #[tokio::test]
    async fn test_no_token_means_no_authorization_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/admin/areas"))
            .and(query_param("page", "2"))
            .respond_with(|req: &Request| {
                if req.headers.contains_key("authorization") {
                    ResponseTemplate::new(400)
                } else {
                    ResponseTemplate::new(401)
                }
            })
            .mount(&server)
            .await;

        let request = ApiRequest::builder(reqwest::Method::GET, "/admin/areas")
            .param("page", 2)
            .build()
            .unwrap();
        let response = transport_for(&server).send(&request, None).await.unwrap();
        assert_eq!(response.status, 401);
    }

    #[tokio::test]
    async fn test_multipart_upload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/admin/uploader/image"))
            .and(header_exists("authorization"))
            .respond_with(|req: &Request| {
                let body = String::from_utf8_lossy(&req.body);
                let content_type = req
                    .headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                if content_type.starts_with("multipart/form-data")
                    && body.contains("name=\"image\"")
                    && body.contains("filename=\"logo.png\"")
                    && body.contains("PNGDATA")
                {
                    ResponseTemplate::new(201)
                } else {
                    ResponseTemplate::new(400)
                }
            })
            .mount(&server)
            .await;

        let request = ApiRequest::builder(reqwest::Method::POST, "/admin/uploader/image")
            .multipart(vec![FormPart::file(
                "image",
                "logo.png",
                Some("image/png"),
                b"PNGDATA".to_vec(),
            )])
            .build()
            .unwrap();
        let response = transport_for(&server).send(&request, Some("t")).await.unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_request_timeout_overrides_client_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/admin/profile"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let transport = transport_for(&server);
        assert_eq!(transport.base_url().path(), "/api/v1");

        let request = ApiRequest::builder(reqwest::Method::GET, "/admin/profile")
            .timeout(1)
            .build()
            .unwrap();
        let err = transport.send(&request, Some("t")).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[tokio::test]
    async fn test_connection_failure_is_network_error() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9/api/v1".to_string(),
            connect_timeout: 1,
            ..ApiConfig::default()
        };
        let transport = HttpTransport::new(&config).unwrap();
        let err = transport.send(&ApiRequest::get("/admin/profile"), None).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let config = ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(HttpTransport::new(&config), Err(ApiError::InvalidRequest(_))));
    }
}
