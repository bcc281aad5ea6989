//! API request types

use std::collections::HashMap;

use reqwest::Method;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::error::ApiError;

/// A request against the dispatcher API, relative to the configured base URL.
///
/// Requests are plain values so the executor can send the same request twice
/// (original attempt and the retry after a refresh).
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Correlation id used in logs
    pub id: String,

    /// HTTP method
    pub method: Method,

    /// Path below the base URL, may carry its own query string
    pub path: String,

    /// Query parameters, in insertion order
    pub params: Vec<(String, String)>,

    /// Extra request headers
    pub headers: HashMap<String, String>,

    /// Request body
    pub body: Body,

    /// Per-request timeout override in seconds
    pub timeout: Option<u64>,
}

/// Request body
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Json(serde_json::Value),
    /// multipart/form-data, kept as parts so it can be rebuilt for a retry
    Multipart(Vec<FormPart>),
}

/// One field of a multipart form
#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub value: PartValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File {
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: PartValue::Text(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            value: PartValue::File {
                file_name: file_name.into(),
                content_type: content_type.map(str::to_string),
                bytes,
            },
        }
    }
}

impl ApiRequest {
    /// Create a new request
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            method,
            path: path.to_string(),
            params: Vec::new(),
            headers: HashMap::new(),
            body: Body::Empty,
            timeout: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Create a builder for constructing requests
    pub fn builder(method: Method, path: &str) -> RequestBuilder {
        RequestBuilder {
            request: Self::new(method, path),
            error: None,
        }
    }

    /// Resolve the request against `base`, appending query parameters
    pub fn full_url(&self, base: &Url) -> Result<Url, ApiError> {
        let joined = format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            self.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined)
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", joined, e)))?;

        if !self.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &self.params {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}

/// Builder for constructing requests
#[derive(Debug)]
pub struct RequestBuilder {
    request: ApiRequest,
    error: Option<String>,
}

impl RequestBuilder {
    /// Add a header
    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.request.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.request.params.push((key.to_string(), value.to_string()));
        self
    }

    /// Set JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.request.body = Body::Json(value),
            Err(e) => self.error = Some(format!("JSON body: {}", e)),
        }
        self
    }

    /// Set multipart body
    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.request.body = Body::Multipart(parts);
        self
    }

    /// Set request timeout
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.request.timeout = Some(seconds);
        self
    }

    /// Build the request
    pub fn build(self) -> Result<ApiRequest, ApiError> {
        match self.error {
            Some(reason) => Err(ApiError::InvalidRequest(reason)),
            None => Ok(self.request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = ApiRequest::builder(Method::PUT, "/admin/cities/5")
            .header("X-Custom", "value")
            .param("include", "country")
            .json(&serde_json::json!({"name_en": "Izmir"}))
            .build()
            .unwrap();

        assert_eq!(req.method, Method::PUT);
        assert_eq!(req.path, "/admin/cities/5");
        assert_eq!(req.headers.get("X-Custom"), Some(&"value".to_string()));
        assert_eq!(req.params, vec![("include".to_string(), "country".to_string())]);
        assert_eq!(req.body, Body::Json(serde_json::json!({"name_en": "Izmir"})));
    }

    #[test]
    fn test_full_url_keeps_base_path() {
        let base = Url::parse("https://api.example.com/api/v1/").unwrap();
        let req = ApiRequest::builder(Method::GET, "/restaurant/areas")
            .param("isPaginated", 0)
            .param("filter[city_id]", 7)
            .build()
            .unwrap();

        let url = req.full_url(&base).unwrap();
        assert_eq!(url.path(), "/api/v1/restaurant/areas");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("isPaginated".to_string(), "0".to_string()),
                ("filter[city_id]".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_full_url_merges_inline_query() {
        let base = Url::parse("https://api.example.com/api/v1").unwrap();
        let req = ApiRequest::builder(Method::GET, "admin/cities?include=country")
            .param("page", 2)
            .build()
            .unwrap();

        let url = req.full_url(&base).unwrap();
        assert_eq!(url.query(), Some("include=country&page=2"));
    }

    #[test]
    fn test_each_request_gets_an_id() {
        assert_ne!(ApiRequest::get("/a").id, ApiRequest::get("/a").id);
    }
}
