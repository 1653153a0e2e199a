#![forbid(unsafe_code)]

//! Durable storage for the freeze flag.
//!
//! The persisted flag is the detector's only cross-session state: whether the
//! main thread was frozen when the process last went away. The store must be
//! writable from the watcher thread while the main thread is stuck, so
//! implementations must not take any lock the main context could hold.
//!
//! # Backends
//!
//! - [`MemoryFlagStore`]: in-process only; testing and hosts that do their
//!   own persistence.
//! - [`FileFlagStore`] (feature `file-store`): JSON file with a
//!   write-then-rename so a crash mid-save never corrupts the record.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `StoreError::Io` | File I/O failure | Returned; detector degrades |
//! | `StoreError::Serialization` | JSON encode failure | Returned; detector degrades |
//! | `StoreError::Corruption` | Invalid file contents | Returned; caller treats as unset |
//! | Missing file | First run | `PersistedFlag::default()` |

use std::fmt;
use std::sync::RwLock;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from flag store operations.
#[derive(Debug)]
pub enum StoreError {
    /// I/O error during file operations.
    Io(std::io::Error),
    /// Serialization or deserialization error.
    #[cfg(feature = "file-store")]
    Serialization(String),
    /// Stored record is corrupted or has an invalid format.
    Corruption(String),
    /// Backend is not usable (e.g. unwritable location).
    Unavailable(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "file-store")]
            StoreError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StoreError::Corruption(msg) => write!(f, "store corruption: {msg}"),
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

/// Result type for flag store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Persisted Record
// ─────────────────────────────────────────────────────────────────────────────

/// The durable freeze record.
///
/// `frozen` means "the main thread was unresponsive at the last write";
/// `raised_at_unix_ms` is the wall-clock time of the raise, when known.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PersistedFlag {
    /// Whether the main thread was frozen at the time of the last write.
    pub frozen: bool,
    /// Unix timestamp (ms) at which the flag was raised, if it is raised.
    pub raised_at_unix_ms: Option<u64>,
}

impl PersistedFlag {
    /// A raised flag stamped with `raised_at_unix_ms`.
    #[must_use]
    pub fn raised(raised_at_unix_ms: u64) -> Self {
        Self {
            frozen: true,
            raised_at_unix_ms: Some(raised_at_unix_ms),
        }
    }

    /// A cleared flag.
    #[must_use]
    pub fn cleared() -> Self {
        Self::default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Durable storage seam for the freeze flag.
///
/// Implementations must be `Send + Sync` and must not acquire any lock shared
/// with the monitored main context: saves happen from the watcher thread
/// precisely when that context is stuck.
pub trait FlagStore: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Load the stored record; `PersistedFlag::default()` when nothing was
    /// ever stored.
    fn load(&self) -> StoreResult<PersistedFlag>;

    /// Replace the stored record.
    fn save(&self, flag: PersistedFlag) -> StoreResult<()>;

    /// Whether the backend is usable.
    fn is_available(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Memory Store (always available)
// ─────────────────────────────────────────────────────────────────────────────

/// In-process flag store.
///
/// State dies with the process, so `last_session_ended_frozen` is always
/// `false` across real restarts; useful for tests (pre-seed with
/// [`MemoryFlagStore::with_flag`]) and for hosts that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flag: RwLock<PersistedFlag>,
}

impl MemoryFlagStore {
    /// Create a store holding a cleared flag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with `flag`, as if a prior session wrote it.
    #[must_use]
    pub fn with_flag(flag: PersistedFlag) -> Self {
        Self {
            flag: RwLock::new(flag),
        }
    }
}

impl FlagStore for MemoryFlagStore {
    fn name(&self) -> &str {
        "MemoryFlagStore"
    }

    fn load(&self) -> StoreResult<PersistedFlag> {
        let guard = self
            .flag
            .read()
            .map_err(|_| StoreError::Corruption("lock poisoned".into()))?;
        Ok(*guard)
    }

    fn save(&self, flag: PersistedFlag) -> StoreResult<()> {
        let mut guard = self
            .flag
            .write()
            .map_err(|_| StoreError::Corruption("lock poisoned".into()))?;
        *guard = flag;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Store (requires file-store feature)
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "file-store")]
mod file_store {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::fs::{self, File};
    use std::io::{BufReader, BufWriter, Write};
    use std::path::{Path, PathBuf};

    /// On-disk format (JSON).
    #[derive(Serialize, Deserialize)]
    struct FlagFile {
        /// Format version for future migrations.
        format_version: u32,
        frozen: bool,
        raised_at_unix_ms: Option<u64>,
    }

    impl FlagFile {
        const FORMAT_VERSION: u32 = 1;
    }

    /// JSON file flag store with atomic replacement.
    ///
    /// Saves write to a sibling temp file and rename it into place, so a
    /// crash mid-save leaves either the old record or the new one, never a
    /// torn file.
    #[derive(Debug)]
    pub struct FileFlagStore {
        path: PathBuf,
    }

    impl FileFlagStore {
        /// Create a store backed by the file at `path`.
        ///
        /// The file need not exist yet; parent directories are created on
        /// first save.
        #[must_use]
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        /// The backing file path.
        #[must_use]
        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl FlagStore for FileFlagStore {
        fn name(&self) -> &str {
            "FileFlagStore"
        }

        fn load(&self) -> StoreResult<PersistedFlag> {
            if !self.path.exists() {
                return Ok(PersistedFlag::default());
            }
            let file = File::open(&self.path)?;
            let parsed: FlagFile = serde_json::from_reader(BufReader::new(file))
                .map_err(|e| StoreError::Corruption(format!("invalid flag file: {e}")))?;
            if parsed.format_version != FlagFile::FORMAT_VERSION {
                tracing::warn!(
                    found = parsed.format_version,
                    expected = FlagFile::FORMAT_VERSION,
                    "flag file format version mismatch; treating as unset"
                );
                return Ok(PersistedFlag::default());
            }
            Ok(PersistedFlag {
                frozen: parsed.frozen,
                raised_at_unix_ms: parsed.raised_at_unix_ms,
            })
        }

        fn save(&self, flag: PersistedFlag) -> StoreResult<()> {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let record = FlagFile {
                format_version: FlagFile::FORMAT_VERSION,
                frozen: flag.frozen,
                raised_at_unix_ms: flag.raised_at_unix_ms,
            };
            let bytes = serde_json::to_vec(&record)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;

            let tmp_path = self.path.with_extension("tmp");
            {
                let mut writer = BufWriter::new(File::create(&tmp_path)?);
                writer.write_all(&bytes)?;
                writer.flush()?;
            }
            fs::rename(&tmp_path, &self.path)?;
            Ok(())
        }

        fn is_available(&self) -> bool {
            self.path
                .parent()
                .map(|parent| parent.as_os_str().is_empty() || parent.exists())
                .unwrap_or(false)
        }
    }
}

#[cfg(feature = "file-store")]
pub use file_store::FileFlagStore;
