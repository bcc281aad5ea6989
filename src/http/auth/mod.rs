//! Authentication helpers
//!
//! Bearer formatting and the token refresh call used by the executor.

mod bearer;
mod refresh;

pub use bearer::{bearer_header, token_hint};
pub use refresh::TokenPayload;

pub(crate) use refresh::request_new_token;
