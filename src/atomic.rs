//! Atomic file I/O utilities for concurrency-safe cache operations.
//!
//! This module provides:
//! - **Atomic writes** via temp-file + rename to prevent partial/corrupt files.
//! - **Advisory file locking** for coordinating concurrent access to cache directories.
//!
//! # Concurrency Guarantees
//!
//! - A reader will never see a partially written file.
//! - Concurrent writers to the same path will not interleave bytes; the last
//!   rename wins, producing one complete file.
//! - Advisory locks coordinate cache-directory operations across processes.
//!
//! # Cross-Platform Notes
//!
//! - On POSIX systems, `rename(2)` is atomic within the same filesystem.
//! - On Windows, `std::fs::rename` uses `MoveFileEx` with `MOVEFILE_REPLACE_EXISTING`,
//!   which is atomic for same-volume renames.

use std::path::Path;

/// Write `data` to `path` atomically by writing to a temporary sibling file
/// and then renaming it into place.
///
/// The temp file is created in the same directory as `path` to guarantee
/// same-filesystem rename semantics.
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory of `path` does not exist.
/// - The temp file cannot be created or written.
/// - The rename operation fails.
pub async fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let temp_path = temp_sibling(path);

    // Write data to temp file
    tokio::fs::write(&temp_path, data).await?;

    // Atomically move temp file to target
    if let Err(e) = tokio::fs::rename(&temp_path, path).await {
        // Clean up the temp file on rename failure
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    Ok(())
}

/// Synchronous version of [`atomic_write`] for use in contexts that cannot
/// use async (e.g., the [`FileSystem`](crate::fs::FileSystem) trait).
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write_sync(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let temp_path = temp_sibling(path);

    // Write data to temp file
    std::fs::write(&temp_path, data)?;

    // Atomically move temp file to target
    if let Err(e) = std::fs::rename(&temp_path, path) {
        // Clean up the temp file on rename failure
        let _ = std::fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(())
}

/// Generate a unique temporary file path as a sibling of `path`.
///
/// Uses `fastrand` for a random suffix to avoid collisions between
/// concurrent writers targeting the same destination.
fn temp_sibling(path: &Path) -> std::path::PathBuf {
    let random_suffix = fastrand::u64(..);
    let file_name = path
        .file_name()
        .map_or_else(|| "file".to_string(), |n| n.to_string_lossy().to_string());

    let temp_name = format!(".{file_name}.{random_suffix:016x}.tmp");

    path.with_file_name(temp_name)
}

/// Check whether an I/O error represents a lock-contention condition
/// on the current platform.
fn is_lock_contention_error(e: &std::io::Error) -> bool {
    #[cfg(unix)]
    {
        // EAGAIN and EWOULDBLOCK are the same value on Linux but may
        // differ on other POSIX systems, so we check both.
        let code = e.raw_os_error();
        code == Some(libc::EAGAIN) || code == Some(libc::EWOULDBLOCK)
    }
    #[cfg(windows)]
    {
        // ERROR_LOCK_VIOLATION = 33
        e.raw_os_error() == Some(33)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = e;
        false
    }
}

/// Name of the advisory lock file placed next to the session file.
const LOCK_FILE_NAME: &str = ".garde.lock";

/// An advisory file lock scoped to a directory.
///
/// The lock is acquired on creation and released when the guard is dropped.
/// This uses `fs2` advisory locking which coordinates between cooperating
/// processes — it does **not** prevent non-cooperating processes from
/// accessing the directory.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use garde::atomic::DirLock;
///
/// let lock = DirLock::acquire(Path::new("/tmp/cache")).unwrap();
/// // … perform cache operations …
/// drop(lock); // lock is released
/// ```
pub struct DirLock {
    _file: std::fs::File,
}

impl DirLock {
    /// Acquire an exclusive advisory lock on `dir`.
    ///
    /// Creates the lock file (`<dir>/.aperture.lock`) if it does not exist.
    /// Blocks until the lock is available.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be created or locked.
    pub fn acquire(dir: &Path) -> std::io::Result<Self> {
        use fs2::FileExt;

        let lock_path = dir.join(LOCK_FILE_NAME);

        // Ensure the directory exists
        std::fs::create_dir_all(dir)?;

        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;

        file.lock_exclusive()?;

        Ok(Self { _file: file })
    }

    /// Try to acquire an exclusive advisory lock without blocking.
    ///
    /// Returns `Ok(None)` if the lock is held by another process.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be created.
    pub fn try_acquire(dir: &Path) -> std::io::Result<Option<Self>> {
        use fs2::FileExt;

        let lock_path = dir.join(LOCK_FILE_NAME);

        // Ensure the directory exists
        std::fs::create_dir_all(dir)?;

        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { _file: file })),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => {
                // On some platforms, `try_lock_exclusive` may return a
                // platform-specific error code instead of `WouldBlock`.
                // Only treat known lock-contention codes as "already held".
                if is_lock_contention_error(&e) {
                    return Ok(None);
                }
                Err(e)
            }
        }
    }
}

// The lock is released when `_file` is dropped — `fs2` advisory locks
// are automatically released when the file descriptor is closed.
