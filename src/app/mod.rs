//! Application configuration

mod config;

pub use config::{ApiConfig, Config, ScopeConfig, SessionConfig};
