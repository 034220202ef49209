//! Centralized string and numeric constants.
//!
//! Collecting these here keeps the defaults in one place and avoids
//! magic numbers scattered across `config`, `remote`, and `batch`.

// Environment variables (see `config`)
pub const ENV_SERVICE_URL: &str = "RECIPE_SERVICE_URL";
pub const ENV_SERVICE_TOKEN: &str = "RECIPE_SERVICE_TOKEN";
pub const ENV_BATCH_WIDTH: &str = "RECIPE_BATCH_WIDTH";
pub const ENV_SIMILARITY_THRESHOLD: &str = "RECIPE_SIMILARITY_THRESHOLD";
pub const ENV_SESSION_PATH: &str = "RECIPE_SESSION_PATH";
pub const ENV_REQUEST_TIMEOUT: &str = "RECIPE_REQUEST_TIMEOUT";
pub const ENV_MAX_RETRIES: &str = "RECIPE_MAX_RETRIES";

// Logging environment variables
pub const ENV_LOG: &str = "GARDE_LOG";
pub const ENV_LOG_FORMAT: &str = "GARDE_LOG_FORMAT";
pub const ENV_LOG_FILE: &str = "GARDE_LOG_FILE";
pub const ENV_LOG_MAX_BODY: &str = "GARDE_LOG_MAX_BODY";

// Defaults (§6, §10.3)
pub const DEFAULT_BATCH_WIDTH: usize = 10;
pub const DEFAULT_CONNECTION_POOL_SIZE: usize = 10;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_RETRIES: usize = 3;

// Retry/backoff defaults (§4.1)
pub const RETRY_BASE_DELAY_MS: u64 = 250;
pub const RETRY_CAP_MS: u64 = 5_000;

// Similarity (§4.3)
pub const SIMILARITY_MAX_CANDIDATES: usize = 5;

// Session store (§4.4)
pub const SESSION_SCHEMA_VERSION: &str = "1.0";
pub const SESSION_GZIP_THRESHOLD_BYTES: usize = 100 * 1024;
pub const SESSION_RECENT_OPERATIONS_CAP: usize = 50;
pub const SESSION_FILE_NAME: &str = "session.json";

// App/config directory name (mirrors the teacher's `get_config_dir` convention)
pub const APP_DIR_NAME: &str = "garde";

// Error hint messages
pub const ERR_CONNECTION: &str = "Check that the recipe service is running and reachable.";
pub const ERR_TIMEOUT: &str = "The recipe service may be slow or unresponsive. Try again later.";
pub const ERR_AUTH: &str = "Check RECIPE_SERVICE_TOKEN and retry.";
pub const ERR_RATE_LIMITED: &str = "The recipe service is rate limiting requests. Wait before retrying.";

// CLI messages
pub const MSG_USE_HELP: &str = "Use --help to see available commands.";

/// Check whether an HTTP status code is retryable under §4.1's transient classification.
#[must_use]
pub const fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 425 | 429 | 500 | 502 | 503 | 504)
}
