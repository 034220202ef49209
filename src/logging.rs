//! Request/response logging with bearer-token redaction.
//!
//! The recipe service uses a single Bearer token (§6). This module ensures
//! that token never appears in a log line, whatever header or query string
//! it travels in.

use tracing::{debug, info, trace};

/// Context holding the resolved bearer token so it can be redacted from logs
/// wherever it appears (header value, and defensively, body/query text).
#[derive(Debug, Clone, Default)]
pub struct SecretContext {
    token: Option<String>,
}

impl SecretContext {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_token(token: impl Into<String>) -> Self {
        let token = token.into();
        Self { token: if token.is_empty() { None } else { Some(token) } }
    }

    #[must_use]
    pub fn is_secret(&self, value: &str) -> bool {
        self.token.as_deref() == Some(value)
    }

    #[must_use]
    pub fn redact_secrets_in_text(&self, text: &str) -> String {
        match &self.token {
            Some(token) => text.replace(token.as_str(), "[REDACTED]"),
            None => text.to_string(),
        }
    }
}

/// Checks if a header name carries credentials and should always be redacted.
#[must_use]
pub fn should_redact_header(header_name: &str) -> bool {
    matches!(
        header_name.to_lowercase().as_str(),
        "authorization" | "proxy-authorization" | "cookie" | "set-cookie"
    )
}

fn redact_header_value(header_name: &str, value: &str, secret_ctx: Option<&SecretContext>) -> String {
    if should_redact_header(header_name) {
        return "[REDACTED]".to_string();
    }
    if secret_ctx.is_some_and(|ctx| ctx.is_secret(value)) {
        return "[REDACTED]".to_string();
    }
    value.to_string()
}

/// Logs an outbound remote-client request at info (method/url) and debug/trace
/// (headers/body) levels.
pub fn log_request(
    method: &str,
    url: &str,
    headers: Option<&reqwest::header::HeaderMap>,
    body: Option<&str>,
    secret_ctx: Option<&SecretContext>,
) {
    info!(target: "garde::remote", "→ {} {}", method.to_uppercase(), url);

    let Some(header_map) = headers else {
        log_body(body, secret_ctx, "request");
        return;
    };

    debug!(target: "garde::remote", "request headers:");
    for (name, value) in header_map {
        let name = name.as_str();
        let raw = String::from_utf8_lossy(value.as_bytes()).to_string();
        debug!(target: "garde::remote", "  {}: {}", name, redact_header_value(name, &raw, secret_ctx));
    }

    log_body(body, secret_ctx, "request");
}

/// Logs a remote-client response at info (status/duration) and debug/trace
/// (headers/body) levels.
pub fn log_response(
    status: u16,
    duration_ms: u128,
    headers: Option<&reqwest::header::HeaderMap>,
    body: Option<&str>,
    max_body_len: usize,
    secret_ctx: Option<&SecretContext>,
) {
    info!(target: "garde::remote", "← {} ({}ms)", status, duration_ms);

    let Some(header_map) = headers else {
        log_body_truncated(body, max_body_len, secret_ctx);
        return;
    };

    debug!(target: "garde::remote", "response headers:");
    for (name, value) in header_map {
        let name = name.as_str();
        let raw = String::from_utf8_lossy(value.as_bytes()).to_string();
        debug!(target: "garde::remote", "  {}: {}", name, redact_header_value(name, &raw, secret_ctx));
    }

    log_body_truncated(body, max_body_len, secret_ctx);
}

fn log_body(body: Option<&str>, secret_ctx: Option<&SecretContext>, label: &str) {
    let Some(body) = body else { return };
    let redacted = secret_ctx.map_or_else(|| body.to_string(), |ctx| ctx.redact_secrets_in_text(body));
    trace!(target: "garde::remote", "{} body: {}", label, redacted);
}

fn log_body_truncated(body: Option<&str>, max_body_len: usize, secret_ctx: Option<&SecretContext>) {
    let Some(body) = body else { return };
    let redacted = secret_ctx.map_or_else(|| body.to_string(), |ctx| ctx.redact_secrets_in_text(body));
    if redacted.len() > max_body_len {
        trace!(target: "garde::remote", "response body: {} (truncated at {max_body_len} chars)", &redacted[..max_body_len]);
    } else {
        trace!(target: "garde::remote", "response body: {}", redacted);
    }
}

/// Gets the maximum body length to log from `GARDE_LOG_MAX_BODY`.
#[must_use]
pub fn get_max_body_len() -> usize {
    std::env::var(crate::constants::ENV_LOG_MAX_BODY)
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1000)
}
