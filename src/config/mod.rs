//! Runtime configuration, resolved from environment variables (§6).

use crate::constants;
use crate::duration::parse_duration;
use crate::error::Error;
use std::path::PathBuf;
use std::time::Duration;

/// Fully resolved runtime configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub service_url: String,
    pub service_token: String,
    pub batch_width: usize,
    pub similarity_threshold: f64,
    pub session_path: PathBuf,
    pub request_timeout: Duration,
    pub max_retries: usize,
}

impl Config {
    /// Builds a `Config` from environment variables, applying defaults from
    /// `constants` where a variable is unset.
    ///
    /// # Errors
    /// Returns an error if a required variable is missing, a numeric
    /// variable fails to parse, or `batch_width` would exceed the
    /// connection pool size (risking the deadlock the pool size is meant
    /// to prevent).
    pub fn from_env() -> Result<Self, Error> {
        let service_url = read_required(constants::ENV_SERVICE_URL)?;
        let service_token = read_required(constants::ENV_SERVICE_TOKEN)?;

        let batch_width = read_optional_usize(
            constants::ENV_BATCH_WIDTH,
            constants::DEFAULT_BATCH_WIDTH,
        )?;
        if batch_width > constants::DEFAULT_CONNECTION_POOL_SIZE {
            return Err(Error::invalid_config(format!(
                "{} ({batch_width}) must not exceed the connection pool size ({})",
                constants::ENV_BATCH_WIDTH,
                constants::DEFAULT_CONNECTION_POOL_SIZE
            )));
        }

        let similarity_threshold = read_optional_f64(
            constants::ENV_SIMILARITY_THRESHOLD,
            constants::DEFAULT_SIMILARITY_THRESHOLD,
        )?;
        if !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(Error::invalid_config(format!(
                "{} must be between 0.0 and 1.0, got {similarity_threshold}",
                constants::ENV_SIMILARITY_THRESHOLD
            )));
        }

        let session_path = match std::env::var(constants::ENV_SESSION_PATH) {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_session_path()?,
        };

        let request_timeout = match std::env::var(constants::ENV_REQUEST_TIMEOUT) {
            Ok(raw) => parse_duration(&raw)?,
            Err(_) => Duration::from_secs(constants::DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let max_retries = read_optional_usize(
            constants::ENV_MAX_RETRIES,
            constants::DEFAULT_MAX_RETRIES,
        )?;

        Ok(Self {
            service_url,
            service_token,
            batch_width,
            similarity_threshold,
            session_path,
            request_timeout,
            max_retries,
        })
    }
}

fn read_required(var: &str) -> Result<String, Error> {
    std::env::var(var)
        .map_err(|_| Error::invalid_config(format!("missing required environment variable {var}")))
}

fn read_optional_usize(var: &str, default: usize) -> Result<usize, Error> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::invalid_config(format!("{var} must be a non-negative integer, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}

fn read_optional_f64(var: &str, default: f64) -> Result<f64, Error> {
    match std::env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::invalid_config(format!("{var} must be a number, got '{raw}'"))),
        Err(_) => Ok(default),
    }
}

/// Resolves the default session file path: `~/.config/<app>/session.json`.
fn default_session_path() -> Result<PathBuf, Error> {
    let home_dir = dirs::home_dir().ok_or_else(Error::home_directory_not_found)?;
    Ok(home_dir
        .join(".config")
        .join(constants::APP_DIR_NAME)
        .join(constants::SESSION_FILE_NAME))
}
