//! In-memory transport for exercising the executor without a network

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Method;

use super::client::Transport;
use super::request::{ApiRequest, Body};
use super::response::ApiResponse;
use crate::error::ApiError;

/// What the fake saw for one request
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub method: Method,
    pub path: String,
    pub params: Vec<(String, String)>,
    pub bearer: Option<String>,
    pub body: Body,
}

type Handler = dyn Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse, ApiError> + Send + Sync;

pub(crate) struct FakeTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<Call>>,
}

impl FakeTransport {
    /// Respond with `handler`, yielding once per request so concurrent
    /// callers interleave
    pub fn with<F>(handler: F) -> Self
    where
        F: Fn(&ApiRequest, Option<&str>) -> Result<ApiResponse, ApiError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replay `responses` in order; running out is a test bug
    pub fn scripted(responses: Vec<Result<ApiResponse, ApiError>>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::with(move |request, _| {
            queue
                .lock()
                .pop_front()
                .unwrap_or_else(|| panic!("unexpected request {} {}", request.method, request.path))
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.path.clone()).collect()
    }
}

pub(crate) fn json(status: u16, body: serde_json::Value) -> Result<ApiResponse, ApiError> {
    Ok(ApiResponse::new(status, body.to_string()))
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &ApiRequest, bearer: Option<&str>) -> Result<ApiResponse, ApiError> {
        self.calls.lock().push(Call {
            method: request.method.clone(),
            path: request.path.clone(),
            params: request.params.clone(),
            bearer: bearer.map(str::to_string),
            body: request.body.clone(),
        });
        tokio::task::yield_now().await;
        (self.handler)(request, bearer)
    }
}
