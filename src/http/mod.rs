//! HTTP client module
//!
//! Request/response values, the reqwest transport, and the executor that
//! adds bearer auth with one-shot token refresh on top of it.

mod client;
mod executor;
mod request;
mod response;
pub mod auth;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{HttpTransport, Transport};
pub use executor::{ApiClient, ClientSettings, ScopedClient};
pub use request::{ApiRequest, Body, FormPart, PartValue, RequestBuilder};
pub use response::ApiResponse;
