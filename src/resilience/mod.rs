use crate::error::Error;
use reqwest::header::HeaderMap;
use std::time::{Duration, SystemTime};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Configuration for timeout behavior
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000, // 10 seconds
            request_timeout_ms: 30_000, // 30 seconds
        }
    }
}

/// Parses the `Retry-After` HTTP header and returns the delay duration.
///
/// The `Retry-After` header can be specified in two formats:
/// - Delay in seconds: `Retry-After: 120`
/// - HTTP-date: `Retry-After: Wed, 21 Oct 2015 07:28:00 GMT`
///
/// Returns `None` if the header is absent, malformed, or represents a time in the past.
#[must_use]
pub fn parse_retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    let retry_after = headers.get("retry-after")?;
    let value = retry_after.to_str().ok()?;
    parse_retry_after_value(value)
}

/// Parses a `Retry-After` header value string and returns the delay duration.
///
/// This is the core parsing logic that can be used with any string source.
/// Supports two formats:
/// - Delay in seconds: `"120"`
/// - HTTP-date: `"Wed, 21 Oct 2015 07:28:00 GMT"`
///
/// Returns `None` if the value is malformed or represents a time in the past.
#[must_use]
pub fn parse_retry_after_value(value: &str) -> Option<Duration> {
    // Try parsing as seconds first (most common)
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    // Try parsing as HTTP-date (RFC 7231 format)
    // Format: "Wed, 21 Oct 2015 07:28:00 GMT"
    if let Ok(date) = httpdate::parse_http_date(value) {
        let now = SystemTime::now();
        if let Ok(duration) = date.duration_since(now) {
            return Some(duration);
        }
        // Date is in the past, return None
        return None;
    }

    None
}

/// Calculates the retry delay, respecting an optional `Retry-After` header value.
///
/// If `retry_after` is provided and greater than the calculated exponential backoff delay,
/// the `retry_after` value is used instead (still capped at `max_delay_ms`).
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
pub fn calculate_retry_delay_with_header(
    config: &RetryConfig,
    attempt: usize,
    retry_after: Option<Duration>,
) -> Duration {
    let calculated_delay = calculate_retry_delay(config, attempt);

    retry_after.map_or(calculated_delay, |server_delay| {
        // Use server-specified delay if it's longer than our calculated delay
        let delay = calculated_delay.max(server_delay);
        // But cap it at max_delay_ms
        let max_delay = Duration::from_millis(config.max_delay_ms);
        delay.min(max_delay)
    })
}

/// Calculates the delay for a given retry attempt with exponential backoff
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap
)]
pub fn calculate_retry_delay(config: &RetryConfig, attempt: usize) -> Duration {
    let base_delay = config.initial_delay_ms as f64;
    let attempt_i32 = attempt.min(30) as i32; // Cap attempt to prevent overflow
    let delay_ms =
        (base_delay * config.backoff_multiplier.powi(attempt_i32)).min(config.max_delay_ms as f64);

    let final_delay_ms = if config.jitter {
        // Add up to 25% jitter to prevent thundering herd
        let jitter_factor = fastrand::f64().mul_add(0.25, 1.0);
        delay_ms * jitter_factor
    } else {
        delay_ms
    } as u64;

    Duration::from_millis(final_delay_ms)
}

/// Creates a resilient HTTP client with timeout configuration
///
/// # Errors
/// Returns an error if the HTTP client cannot be created with the specified configuration
pub fn create_resilient_client(timeout_config: &TimeoutConfig) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(timeout_config.connect_timeout_ms))
        .timeout(Duration::from_millis(timeout_config.request_timeout_ms))
        .build()
        .map_err(|e| {
            Error::network_request_failed(format!("Failed to create resilient HTTP client: {e}"))
        })
}
