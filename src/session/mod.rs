//! Session Store (§4.4): durable record of operator progress in a single
//! JSON file, gzip-compressed past a size threshold.

use crate::atomic::atomic_write;
use crate::constants::{SESSION_GZIP_THRESHOLD_BYTES, SESSION_SCHEMA_VERSION};
use crate::error::Error;
use crate::model::SessionState;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Distinguishes the three "no usable session" outcomes the Orchestrator
/// must treat identically at the UX level but log distinctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailure {
    Missing,
    Corrupted,
    IncompatibleSchema,
}

pub enum LoadOutcome {
    Present(SessionState),
    Absent(LoadFailure),
}

/// Persistence contract for `SessionState`. Abstracted behind a trait so the
/// Orchestrator can be tested against an in-memory double.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> LoadOutcome;
    async fn save(&self, state: &SessionState) -> Result<(), Error>;
    async fn discard(&self) -> Result<(), Error>;
}

/// `SessionStore` backed by a single JSON file, written atomically and
/// gzip-compressed above `SESSION_GZIP_THRESHOLD_BYTES`.
pub struct JsonSessionStore {
    path: PathBuf,
}

impl JsonSessionStore {
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn parent_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

#[async_trait::async_trait]
impl SessionStore for JsonSessionStore {
    async fn load(&self) -> LoadOutcome {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return LoadOutcome::Absent(LoadFailure::Missing);
            }
            Err(e) => {
                tracing::warn!(target: "garde::session", "failed to read session file: {e}");
                return LoadOutcome::Absent(LoadFailure::Corrupted);
            }
        };

        let json_bytes = if raw.starts_with(&GZIP_MAGIC) {
            match decompress(&raw) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(target: "garde::session", "failed to decompress session file: {e}");
                    return LoadOutcome::Absent(LoadFailure::Corrupted);
                }
            }
        } else {
            raw
        };

        let state: SessionState = match serde_json::from_slice(&json_bytes) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(target: "garde::session", "failed to parse session file: {e}");
                return LoadOutcome::Absent(LoadFailure::Corrupted);
            }
        };

        if state.schema_version != SESSION_SCHEMA_VERSION {
            tracing::warn!(
                target: "garde::session",
                "session schema version {} is incompatible with {}",
                state.schema_version,
                SESSION_SCHEMA_VERSION
            );
            return LoadOutcome::Absent(LoadFailure::IncompatibleSchema);
        }

        if !validate_sets_distinct(&state) || !state.is_disjoint() {
            tracing::warn!(target: "garde::session", "session file fails set-distinctness or disjointness invariant");
            return LoadOutcome::Absent(LoadFailure::Corrupted);
        }

        LoadOutcome::Present(state)
    }

    async fn save(&self, state: &SessionState) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(state)?;
        let payload = if json.len() > SESSION_GZIP_THRESHOLD_BYTES {
            compress(&json)?
        } else {
            json
        };

        tokio::fs::create_dir_all(self.parent_dir())
            .await
            .map_err(Error::Io)?;
        atomic_write(&self.path, &payload).await.map_err(Error::Io)
    }

    async fn discard(&self) -> Result<(), Error> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

fn validate_sets_distinct(state: &SessionState) -> bool {
    let has_duplicates = |items: &[String]| {
        let set: HashSet<&str> = items.iter().map(String::as_str).collect();
        set.len() != items.len()
    };
    !has_duplicates(&state.completed_pattern_ids) && !has_duplicates(&state.skipped_pattern_ids)
}

fn compress(data: &[u8]) -> Result<Vec<u8>, Error> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(Error::Io)?;
    encoder.finish().map_err(Error::Io)
}

fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
