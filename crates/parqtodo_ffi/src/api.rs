//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the task list operations to Dart via FRB.
//! - Own the process-wide store handle and its lazy initialization.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Failures are reported through `ok=false` envelopes with a stable `code`.
//! - Task calls wait at most `READY_WAIT` for initialization.

use parqtodo_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    BridgeConfig, BridgeError, BridgeResult, FileSnapshotCache, LifecycleState,
    PersistenceBridge, StoreHandle, Task, TaskId,
};
use log::{info, warn};
use std::path::Path;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

const READY_WAIT: Duration = Duration::from_secs(10);
static STORE: OnceLock<StoreHandle> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), Path::new(log_dir.trim())) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Task projection handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    pub id: i64,
    pub title: String,
    pub completed: bool,
}

impl From<Task> for TodoItem {
    fn from(task: Task) -> Self {
        Self {
            id: task.id.get(),
            title: task.title,
            completed: task.completed,
        }
    }
}

/// List response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoListResponse {
    pub ok: bool,
    pub items: Vec<TodoItem>,
    /// Count of tasks not yet completed.
    pub remaining: u32,
    /// Empty on success, otherwise a short error code such as `not_found`.
    pub code: String,
    pub message: String,
}

/// Single-task action envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoActionResponse {
    pub ok: bool,
    /// Task after the change, when the action produces one.
    pub item: Option<TodoItem>,
    /// Rows removed by `todo_clear`.
    pub affected: u32,
    pub code: String,
    pub message: String,
}

impl TodoActionResponse {
    fn success(message: impl Into<String>, item: Option<TodoItem>, affected: u32) -> Self {
        Self {
            ok: true,
            item,
            affected,
            code: String::new(),
            message: message.into(),
        }
    }

    fn failure(err: &BridgeError) -> Self {
        Self {
            ok: false,
            item: None,
            affected: 0,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Starts background initialization against a snapshot cache directory.
///
/// # FFI contract
/// - Returns immediately; poll `todo_state` or call any task API, which waits.
/// - A second call after a successful start reports `already_started`.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_init(cache_dir: String) -> TodoActionResponse {
    init_with(store(), cache_dir.trim())
}

/// Lifecycle label: `uninitialized|initializing|ready|failed: <reason>`.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_state() -> String {
    state_label(store())
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_list() -> TodoListResponse {
    list_with(store())
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_add(title: String) -> TodoActionResponse {
    act(store(), |bridge| {
        bridge
            .add(&title)
            .map(|task| TodoActionResponse::success("Task added.", Some(task.into()), 1))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_edit(id: i64, title: String) -> TodoActionResponse {
    act(store(), |bridge| {
        bridge
            .edit(TaskId(id), &title)
            .map(|task| TodoActionResponse::success("Task updated.", Some(task.into()), 1))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_delete(id: i64) -> TodoActionResponse {
    act(store(), |bridge| {
        bridge
            .delete(TaskId(id))
            .map(|()| TodoActionResponse::success("Task deleted.", None, 1))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_toggle(id: i64) -> TodoActionResponse {
    act(store(), |bridge| {
        bridge
            .toggle_completed(TaskId(id))
            .map(|task| TodoActionResponse::success("Task toggled.", Some(task.into()), 1))
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn todo_clear() -> TodoActionResponse {
    act(store(), |bridge| {
        bridge
            .clear()
            .map(|removed| TodoActionResponse::success("Tasks cleared.", None, saturate(removed)))
    })
}

fn store() -> &'static StoreHandle {
    STORE.get_or_init(StoreHandle::new)
}

fn init_with(handle: &StoreHandle, cache_dir: &str) -> TodoActionResponse {
    if cache_dir.is_empty() {
        return TodoActionResponse::failure(&BridgeError::InitFailed(
            "cache directory must not be empty".to_string(),
        ));
    }
    let cache = match FileSnapshotCache::open(cache_dir) {
        Ok(cache) => cache,
        Err(err) => return TodoActionResponse::failure(&BridgeError::Cache(err)),
    };
    match handle.start(BridgeConfig::default(), Arc::new(cache)) {
        Ok(()) => {
            info!("event=ffi_init module=ffi status=started cache_dir={cache_dir}");
            TodoActionResponse::success("Initialization started.", None, 0)
        }
        Err(err) => {
            warn!(
                "event=ffi_init module=ffi status=error error_code={}",
                err.code()
            );
            TodoActionResponse::failure(&err)
        }
    }
}

fn state_label(handle: &StoreHandle) -> String {
    match handle.state() {
        LifecycleState::Uninitialized => "uninitialized".to_string(),
        LifecycleState::Initializing => "initializing".to_string(),
        LifecycleState::Ready => "ready".to_string(),
        LifecycleState::Failed(reason) => format!("failed: {reason}"),
    }
}

fn list_with(handle: &StoreHandle) -> TodoListResponse {
    let loaded = handle
        .wait_ready_timeout(READY_WAIT)
        .and_then(|bridge| bridge.load_tasks());
    match loaded {
        Ok(tasks) => {
            let remaining = saturate(tasks.iter().filter(|task| task.is_remaining()).count());
            let items = tasks.into_iter().map(TodoItem::from).collect::<Vec<_>>();
            TodoListResponse {
                ok: true,
                message: format!("{} task(s).", items.len()),
                items,
                remaining,
                code: String::new(),
            }
        }
        Err(err) => TodoListResponse {
            ok: false,
            items: Vec::new(),
            remaining: 0,
            code: err.code().to_string(),
            message: err.to_string(),
        },
    }
}

fn act(
    handle: &StoreHandle,
    f: impl FnOnce(&PersistenceBridge) -> BridgeResult<TodoActionResponse>,
) -> TodoActionResponse {
    match handle
        .wait_ready_timeout(READY_WAIT)
        .and_then(|bridge| f(&bridge))
    {
        Ok(response) => response,
        Err(err) => TodoActionResponse::failure(&err),
    }
}

fn saturate(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        act, core_version, init_logging, init_with, list_with, ping, state_label,
        TodoActionResponse,
    };
    use parqtodo_core::{StoreHandle, TaskId};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn calls_before_init_report_not_started() {
        let handle = StoreHandle::new();
        assert_eq!(state_label(&handle), "uninitialized");
        let response = list_with(&handle);
        assert!(!response.ok);
        assert_eq!(response.code, "not_started");
    }

    #[test]
    fn empty_cache_dir_is_rejected() {
        let handle = StoreHandle::new();
        let response = init_with(&handle, "");
        assert!(!response.ok);
        assert_eq!(response.code, "init_failed");
        assert_eq!(state_label(&handle), "uninitialized");
    }

    #[test]
    fn task_flow_persists_through_the_cache_dir() {
        let dir = unique_dir("ffi-flow");
        let handle = StoreHandle::new();
        assert!(init_with(&handle, dir.to_str().unwrap()).ok);
        assert_eq!(init_with(&handle, dir.to_str().unwrap()).code, "already_started");

        let added = act(&handle, |bridge| {
            bridge
                .add("Buy milk")
                .map(|task| TodoActionResponse::success("", Some(task.into()), 1))
        });
        assert!(added.ok, "{}", added.message);
        let id = added.item.unwrap().id;
        assert_eq!(state_label(&handle), "ready");

        let toggled = act(&handle, |bridge| {
            bridge
                .toggle_completed(TaskId(id))
                .map(|task| TodoActionResponse::success("", Some(task.into()), 1))
        });
        assert!(toggled.item.unwrap().completed);

        let reopened = StoreHandle::new();
        assert!(init_with(&reopened, dir.to_str().unwrap()).ok);
        let listed = list_with(&reopened);
        assert!(listed.ok, "{}", listed.message);
        assert_eq!(listed.items.len(), 1);
        assert_eq!(listed.items[0].title, "Buy milk");
        assert_eq!(listed.remaining, 0);

        let missing = act(&reopened, |bridge| {
            bridge
                .delete(TaskId(id + 1))
                .map(|()| TodoActionResponse::success("", None, 1))
        });
        assert_eq!(missing.code, "not_found");

        let _ = std::fs::remove_dir_all(dir);
    }

    fn unique_dir(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        std::env::temp_dir().join(format!("parqtodo-{prefix}-{nanos}"))
    }
}
