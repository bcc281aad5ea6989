//! Dispatch Console - client for the dispatcher restaurant/delivery API
//!
//! Authenticated requests go through [`http::ApiClient`], which attaches the
//! bearer token of the request's [`session::Scope`] and recovers from an
//! expired access token by refreshing it once and retrying.

pub mod app;
pub mod error;
pub mod http;
pub mod resources;
pub mod session;

pub use app::Config;
pub use error::*;
pub use http::{ApiClient, ClientSettings};
pub use session::{Scope, SessionContext, SessionEvent};
