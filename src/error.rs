//! Error handling for the ingredient resolver.
//!
//! All application errors are consolidated into one of a handful of
//! `ErrorKind` categories (see §7 of the design: transient, validation,
//! conflict, not-found, auth, session, interactive, runtime). Each error
//! carries an optional [`ErrorContext`] with structured JSON details and a
//! human-readable suggestion, and can be rendered either as plain text or
//! as JSON for scripted callers (`--json-errors`).

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{kind}: {message}")]
    Internal {
        kind: ErrorKind,
        message: Cow<'static, str>,
        context: Option<ErrorContext>,
    },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Error categories used throughout the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input/configuration validation failures, including pre-flight checks.
    Validation,
    /// Transient remote failures that survived retry.
    Transient,
    /// Unreconcilable conflict on the remote catalog (duplicate name, alias, etc.).
    Conflict,
    /// A referenced remote entity no longer exists.
    NotFound,
    /// Authentication/authorization failure. Fatal — halts the session.
    Auth,
    /// Session store corruption or schema incompatibility.
    Session,
    /// Interactive input handling failure.
    Interactive,
    /// Anything else internal/unexpected.
    Runtime,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "Validation",
            Self::Transient => "Transient",
            Self::Conflict => "Conflict",
            Self::NotFound => "NotFound",
            Self::Auth => "Auth",
            Self::Session => "Session",
            Self::Interactive => "Interactive",
            Self::Runtime => "Runtime",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Additional context for consolidated errors.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub details: Option<serde_json::Value>,
    pub suggestion: Option<Cow<'static, str>>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(
        details: Option<serde_json::Value>,
        suggestion: Option<Cow<'static, str>>,
    ) -> Self {
        Self { details, suggestion }
    }

    #[must_use]
    pub const fn with_suggestion(suggestion: Cow<'static, str>) -> Self {
        Self { details: None, suggestion: Some(suggestion) }
    }

    #[must_use]
    pub fn with_detail(key: &str, value: impl serde::Serialize) -> Self {
        Self { details: Some(json!({ key: value })), suggestion: None }
    }

    #[must_use]
    pub fn and_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(Cow::Owned(suggestion.into()));
        self
    }
}

/// JSON representation of an error for `--json-errors` output.
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
    pub error_type: Cow<'static, str>,
    pub message: String,
    pub context: Option<Cow<'static, str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Error {
    #[must_use]
    pub fn with_context(self, context: &str) -> Self {
        match self {
            Self::Internal { kind, message, context: ctx } => Self::Internal {
                kind,
                message: Cow::Owned(format!("{context}: {message}")),
                context: ctx,
            },
            Self::Network(e) => Self::network_request_failed(format!("{context}: {e}")),
            Self::Io(e) => Self::io_error(format!("{context}: {e}")),
            other => other,
        }
    }

    #[must_use]
    pub fn to_json(&self) -> JsonError {
        let (error_type, message, context, details) = match self {
            Self::Io(e) => ("Io", e.to_string(), None, None),
            Self::Network(e) => ("Network", e.to_string(), None, None),
            Self::Json(e) => ("Json", e.to_string(), None, None),
            Self::Internal { kind, message, context: ctx } => {
                let suggestion = ctx.as_ref().and_then(|c| c.suggestion.clone());
                let details = ctx.as_ref().and_then(|c| c.details.clone());
                (kind.as_str(), message.to_string(), suggestion, details)
            }
            Self::Anyhow(e) => ("Unknown", e.to_string(), None, None),
        };

        JsonError {
            error_type: Cow::Borrowed(error_type),
            message,
            context,
            details,
        }
    }

    /// Returns true if this error represents a fatal, session-halting condition.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Internal { kind: ErrorKind::Auth, .. })
    }

    /// Returns the `ErrorKind` for consolidated errors, or `None` for the
    /// passthrough `Io`/`Network`/`Json`/`Anyhow` variants.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Internal { kind, .. } => Some(*kind),
            Self::Io(_) | Self::Network(_) | Self::Json(_) | Self::Anyhow(_) => None,
        }
    }
}

impl Error {
    // ---- Validation ----

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::Internal {
            kind: ErrorKind::Validation,
            message: Cow::Owned(message.into()),
            context: None,
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::Internal {
            kind: ErrorKind::Validation,
            message: Cow::Owned(format!("invalid configuration: {reason}")),
            context: Some(
                ErrorContext::with_detail("reason", &reason)
                    .and_suggestion("check the environment variables and retry."),
            ),
        }
    }

    // ---- Remote / transient ----

    pub fn network_request_failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::Internal {
            kind: ErrorKind::Transient,
            message: Cow::Owned(format!("network request failed: {reason}")),
            context: Some(
                ErrorContext::with_detail("reason", &reason)
                    .and_suggestion("check connectivity to the recipe service."),
            ),
        }
    }

    pub fn retry_limit_exceeded(max_attempts: u32, last_error: impl Into<String>) -> Self {
        let last_error = last_error.into();
        Self::Internal {
            kind: ErrorKind::Transient,
            message: Cow::Owned(format!(
                "retry limit exceeded after {max_attempts} attempts: {last_error}"
            )),
            context: Some(ErrorContext::new(
                Some(json!({ "max_attempts": max_attempts, "last_error": last_error })),
                Some(Cow::Borrowed("the recipe service may be unavailable.")),
            )),
        }
    }

    pub fn request_timeout(timeout_seconds: u64) -> Self {
        Self::Internal {
            kind: ErrorKind::Transient,
            message: Cow::Owned(format!("request timed out after {timeout_seconds}s")),
            context: Some(ErrorContext::with_suggestion(Cow::Borrowed(
                "consider raising RECIPE_REQUEST_TIMEOUT.",
            ))),
        }
    }

    // ---- Conflict / not-found / auth ----

    pub fn conflict(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::Internal {
            kind: ErrorKind::Conflict,
            message: Cow::Owned(format!("conflict: {reason}")),
            context: Some(ErrorContext::with_detail("reason", &reason)),
        }
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::Internal {
            kind: ErrorKind::NotFound,
            message: Cow::Owned(format!("not found: {reason}")),
            context: Some(
                ErrorContext::with_detail("reason", &reason)
                    .and_suggestion("refresh the catalog and retry."),
            ),
        }
    }

    pub fn auth_failed(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::Internal {
            kind: ErrorKind::Auth,
            message: Cow::Owned(format!("authentication failed: {reason}")),
            context: Some(
                ErrorContext::with_detail("reason", &reason)
                    .and_suggestion("check RECIPE_SERVICE_TOKEN."),
            ),
        }
    }

    pub fn remote_other(status: u16, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::Internal {
            kind: ErrorKind::Runtime,
            message: Cow::Owned(format!("remote error ({status}): {reason}")),
            context: Some(ErrorContext::with_detail("status", status)),
        }
    }

    // ---- Session ----

    pub fn session_corrupted(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::Internal {
            kind: ErrorKind::Session,
            message: Cow::Owned(format!("session file is corrupted: {reason}")),
            context: Some(
                ErrorContext::with_detail("reason", &reason)
                    .and_suggestion("discard the session and start fresh."),
            ),
        }
    }

    pub fn session_incompatible_schema(found: impl Into<String>, expected: impl Into<String>) -> Self {
        let found = found.into();
        let expected = expected.into();
        Self::Internal {
            kind: ErrorKind::Session,
            message: Cow::Owned(format!(
                "session schema version '{found}' is incompatible with '{expected}'"
            )),
            context: Some(ErrorContext::new(
                Some(json!({ "found": found, "expected": expected })),
                Some(Cow::Borrowed("discard the session and start fresh.")),
            )),
        }
    }

    // ---- Interactive ----

    #[must_use]
    pub fn interactive_input_too_long(max_length: usize) -> Self {
        Self::Internal {
            kind: ErrorKind::Interactive,
            message: Cow::Owned(format!("input too long (maximum {max_length} characters)")),
            context: Some(
                ErrorContext::with_detail("max_length", max_length)
                    .and_suggestion("provide a shorter input."),
            ),
        }
    }

    pub fn interactive_invalid_characters(invalid: impl Into<String>) -> Self {
        let invalid = invalid.into();
        Self::Internal {
            kind: ErrorKind::Interactive,
            message: Cow::Owned(format!("input contains invalid characters: {invalid}")),
            context: Some(ErrorContext::with_detail("invalid_characters", &invalid)),
        }
    }

    pub fn interactive_retries_exhausted(max_retries: usize) -> Self {
        Self::Internal {
            kind: ErrorKind::Interactive,
            message: Cow::Owned(format!("maximum retry attempts ({max_retries}) exceeded")),
            context: None,
        }
    }

    #[must_use]
    pub const fn interactive_cancelled() -> Self {
        Self::Internal {
            kind: ErrorKind::Interactive,
            message: Cow::Borrowed("operation cancelled by operator"),
            context: None,
        }
    }

    // ---- Runtime ----

    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Internal { kind: ErrorKind::Runtime, message: Cow::Owned(message.into()), context: None }
    }

    #[must_use]
    pub fn home_directory_not_found() -> Self {
        Self::Internal {
            kind: ErrorKind::Runtime,
            message: Cow::Borrowed("home directory not found"),
            context: Some(ErrorContext::with_suggestion(Cow::Borrowed(
                "set RECIPE_SESSION_PATH explicitly or ensure HOME is set.",
            ))),
        }
    }
}
