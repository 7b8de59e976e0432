//! Core of the parqtodo task list.
//!
//! Tasks live in an embedded SQLite engine and are snapshotted to Parquet in a
//! local cache after every mutation. This crate owns every invariant; the CLI
//! and FFI crates only translate input and output.

pub mod bridge;
pub mod cache;
pub mod config;
pub mod engine;
pub mod logging;
pub mod model;
pub mod view;

pub use bridge::{
    BridgeConfig, BridgeError, BridgeResult, LifecycleState, PersistenceBridge, SaveReport,
    StoreHandle, TaskStore,
};
pub use cache::{CacheError, FileSnapshotCache, MemorySnapshotCache, SnapshotCache};
pub use config::{AppConfig, ConfigError};
pub use engine::{Database, EngineBundle, EngineConnection, EngineError, QueryResult, SqlValue};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::id::{IdGenerator, IdStrategy};
pub use model::task::{Task, TaskId, TaskValidationError};
pub use view::{TaskListView, Theme, ViewStatus};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
