//! Bearer token authentication

/// `Authorization` header value for `token`
pub fn bearer_header(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Short, log-safe fingerprint of a token
pub fn token_hint(token: &str) -> String {
    let tail: String = token
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("…{} ({} chars)", tail, token.chars().count())
}
