//! Local key/value storage for table snapshots.
//!
//! # Responsibility
//! - Hold one binary snapshot per key between process runs.
//! - Replace values whole; there are no partial writes.
//!
//! # Invariants
//! - `set` either leaves the previous value intact or fully replaces it.
//! - Keys are restricted to `[A-Za-z0-9._-]` and never contain `..`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod file;
mod memory;

pub use bytes::Bytes;
pub use file::FileSnapshotCache;
pub use memory::MemorySnapshotCache;

static CACHE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,64}$").expect("valid cache key regex"));

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug)]
pub enum CacheError {
    Io(std::io::Error),
    InvalidKey(String),
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "snapshot cache io: {err}"),
            Self::InvalidKey(key) => write!(f, "invalid snapshot cache key `{key}`"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::InvalidKey(_) => None,
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Key/value store for snapshot buffers.
pub trait SnapshotCache: Send + Sync {
    fn get(&self, key: &str) -> CacheResult<Option<Bytes>>;
    /// Overwrites any prior value under `key`.
    fn set(&self, key: &str, value: Bytes) -> CacheResult<()>;
    /// Returns whether a value was present.
    fn remove(&self, key: &str) -> CacheResult<bool>;
}

pub(crate) fn validate_key(key: &str) -> CacheResult<()> {
    if !CACHE_KEY_RE.is_match(key) || key.contains("..") {
        return Err(CacheError::InvalidKey(key.to_string()));
    }
    Ok(())
}
