//! Persistence bridge between task intents, the engine and the snapshot cache.
//!
//! # Responsibility
//! - Translate add/edit/delete/toggle/clear intents into bound statements.
//! - Re-export the `todos` table to Parquet and store it in the snapshot cache
//!   after every mutation.
//! - Expose engine readiness through an explicit lifecycle handle.
//!
//! # Invariants
//! - Task data is always bound as statement parameters, never interpolated.
//! - A mutation is committed in the engine only after its snapshot was cached.
//! - At most one mutation is in flight per bridge.

use crate::cache::CacheError;
use crate::engine::{EngineBundle, EngineError};
use crate::model::id::IdStrategy;
use crate::model::task::{Task, TaskId, TaskValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

mod lifecycle;
mod persistence;

pub use lifecycle::{LifecycleState, StoreHandle};
pub use persistence::{PersistenceBridge, SaveReport};

/// Cache key holding the snapshot of the `todos` table.
pub const DEFAULT_SNAPSHOT_KEY: &str = "todos";
/// Engine table holding tasks.
pub const TODOS_TABLE: &str = "todos";
/// Virtual file used for Parquet import/export.
pub const SNAPSHOT_FILE: &str = "todos.parquet";

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug)]
pub enum BridgeError {
    Engine(EngineError),
    Cache(CacheError),
    Validation(TaskValidationError),
    NotFound(TaskId),
    /// Generated id already exists in the table; nothing was written.
    DuplicateId(TaskId),
    /// A persisted row does not match the task schema.
    InvalidData(String),
    /// Initialization ended in the failed state.
    InitFailed(String),
    NotStarted,
    AlreadyStarted,
    /// Initialization did not finish within the requested wait.
    NotReady,
}

impl BridgeError {
    /// Stable short code used in log events and host envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Engine(_) => "engine",
            Self::Cache(_) => "cache",
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::DuplicateId(_) => "duplicate_id",
            Self::InvalidData(_) => "invalid_data",
            Self::InitFailed(_) => "init_failed",
            Self::NotStarted => "not_started",
            Self::AlreadyStarted => "already_started",
            Self::NotReady => "not_ready",
        }
    }
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(err) => write!(f, "{err}"),
            Self::Cache(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
            Self::DuplicateId(id) => write!(f, "task id already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::InitFailed(reason) => write!(f, "task store failed to initialize: {reason}"),
            Self::NotStarted => write!(f, "task store initialization was never started"),
            Self::AlreadyStarted => write!(f, "task store initialization already started"),
            Self::NotReady => write!(f, "task store is still initializing"),
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::Cache(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<EngineError> for BridgeError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<CacheError> for BridgeError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

impl From<TaskValidationError> for BridgeError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Bridge construction options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub snapshot_key: String,
    /// `None` selects a bundle from the detected host capabilities.
    pub bundle: Option<EngineBundle>,
    pub id_strategy: IdStrategy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            snapshot_key: DEFAULT_SNAPSHOT_KEY.to_string(),
            bundle: None,
            id_strategy: IdStrategy::default(),
        }
    }
}

/// Task operations consumed by views.
pub trait TaskStore {
    fn load_tasks(&self) -> BridgeResult<Vec<Task>>;
    fn add(&self, title: &str) -> BridgeResult<Task>;
    fn edit(&self, id: TaskId, title: &str) -> BridgeResult<Task>;
    fn delete(&self, id: TaskId) -> BridgeResult<()>;
    fn toggle_completed(&self, id: TaskId) -> BridgeResult<Task>;
    fn clear(&self) -> BridgeResult<usize>;
}
