//! Shared test utilities.

use once_cell::sync::Lazy;
use std::path::PathBuf;

/// Cached binary path for the CLI to avoid repeated compilation.
pub static GARDE_BIN: Lazy<PathBuf> = Lazy::new(|| assert_cmd::cargo::cargo_bin("garde"));

/// Test helper to create a command with the cached binary.
pub fn garde_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(&*GARDE_BIN)
}

use garde::config::Config;
use std::time::Duration;

/// A `Config` pointed at `base_url`, with defaults suitable for fast tests
/// (short timeout, no retries unless overridden by the caller).
#[must_use]
pub fn test_config(base_url: &str, session_path: PathBuf) -> Config {
    Config {
        service_url: base_url.to_string(),
        service_token: "test-token".to_string(),
        batch_width: 4,
        similarity_threshold: 0.85,
        session_path,
        request_timeout: Duration::from_secs(5),
        max_retries: 3,
    }
}
