//! Task persistence over the embedded engine.
//!
//! # Responsibility
//! - Initialize the engine and restore the cached snapshot into `todos`.
//! - Run each mutation and its full-table save as one engine transaction.
//!
//! # Invariants
//! - The cached snapshot always reflects the last committed table state.
//! - Failed mutations leave both the table and the snapshot unchanged.
//!
//! # Side effects
//! - Every successful mutation re-exports the whole table (O(table size)).

use crate::bridge::{
    BridgeConfig, BridgeError, BridgeResult, TaskStore, SNAPSHOT_FILE, TODOS_TABLE,
};
use crate::cache::SnapshotCache;
use crate::engine::{
    select_bundle, Database, EngineBundle, EngineConnection, HostCapabilities, QueryResult,
    SqlValue,
};
use crate::model::id::IdGenerator;
use crate::model::task::{normalize_title, Task, TaskId};
use log::{error, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

const CREATE_TABLE_SQL: &str =
    "CREATE TABLE IF NOT EXISTS todos(id BIGINT PRIMARY KEY, title VARCHAR, completed BOOL);";
const INSERT_TASK_SQL: &str = "INSERT INTO todos(id, title, completed) VALUES (?1, ?2, ?3);";
const UPDATE_TITLE_SQL: &str = "UPDATE todos SET title = ?1 WHERE id = ?2;";
const TOGGLE_COMPLETED_SQL: &str =
    "UPDATE todos SET completed = NOT COALESCE(completed, 0) WHERE id = ?1;";
const DELETE_TASK_SQL: &str = "DELETE FROM todos WHERE id = ?1;";
const CLEAR_TASKS_SQL: &str = "DELETE FROM todos;";
const SELECT_TASKS_SQL: &str = "SELECT id, title, completed FROM todos ORDER BY id;";
const SELECT_TASK_SQL: &str = "SELECT id, title, completed FROM todos WHERE id = ?1;";
const SELECT_MAX_ID_SQL: &str = "SELECT MAX(id) FROM todos;";

/// Outcome of one export-and-cache cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub rows: usize,
    pub bytes: usize,
}

/// Owns the engine, its single connection and the snapshot cache.
pub struct PersistenceBridge {
    db: Database,
    conn: EngineConnection,
    cache: Arc<dyn SnapshotCache>,
    snapshot_key: String,
    // Also serializes engine access: holding it means no other call is in flight.
    ids: Mutex<Box<dyn IdGenerator>>,
}

impl PersistenceBridge {
    /// Instantiates the engine and restores the cached snapshot, if any.
    ///
    /// # Errors
    /// - Engine instantiation, snapshot read, or snapshot import failures.
    pub fn initialize(config: &BridgeConfig, cache: Arc<dyn SnapshotCache>) -> BridgeResult<Self> {
        Self::initialize_with_ids(config, cache, config.id_strategy.build())
    }

    /// Same as `initialize`, with a caller-provided id generator.
    pub fn initialize_with_ids(
        config: &BridgeConfig,
        cache: Arc<dyn SnapshotCache>,
        ids: Box<dyn IdGenerator>,
    ) -> BridgeResult<Self> {
        let started_at = Instant::now();
        info!("event=bridge_init module=bridge status=start");

        let bundle = config
            .bundle
            .unwrap_or_else(|| select_bundle(HostCapabilities::detect()));
        match Self::bootstrap(bundle, config, cache, ids) {
            Ok((bridge, restored_rows)) => {
                info!(
                    "event=bridge_init module=bridge status=ok bundle={} restored_rows={} duration_ms={}",
                    bundle.as_str(),
                    restored_rows,
                    started_at.elapsed().as_millis()
                );
                Ok(bridge)
            }
            Err(err) => {
                error!(
                    "event=bridge_init module=bridge status=error bundle={} duration_ms={} error_code={} error={}",
                    bundle.as_str(),
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    fn bootstrap(
        bundle: EngineBundle,
        config: &BridgeConfig,
        cache: Arc<dyn SnapshotCache>,
        mut ids: Box<dyn IdGenerator>,
    ) -> BridgeResult<(Self, usize)> {
        let db = Database::instantiate(bundle)?;
        let conn = db.connect();
        conn.send(CREATE_TABLE_SQL)?;

        let mut restored_rows = 0;
        if let Some(buffer) = cache.get(&config.snapshot_key)? {
            db.register_file_buffer(SNAPSHOT_FILE, buffer)?;
            restored_rows = conn.import_table(TODOS_TABLE, SNAPSHOT_FILE)?;
        }

        let max_id = conn.query(SELECT_MAX_ID_SQL)?;
        if let Some(SqlValue::Integer(id)) = max_id.rows.first().and_then(|row| row.first()) {
            ids.observe(TaskId(*id));
        }

        Ok((
            Self {
                db,
                conn,
                cache,
                snapshot_key: config.snapshot_key.clone(),
                ids: Mutex::new(ids),
            },
            restored_rows,
        ))
    }

    pub fn snapshot_key(&self) -> &str {
        &self.snapshot_key
    }

    pub fn bundle(&self) -> EngineBundle {
        self.db.bundle()
    }

    /// Reads every task ordered by id.
    pub fn load_tasks(&self) -> BridgeResult<Vec<Task>> {
        let _gate = self.lock_ids();
        let result = self.conn.query(SELECT_TASKS_SQL)?;
        parse_tasks(&result)
    }

    /// Inserts a new incomplete task under a freshly generated id.
    ///
    /// # Errors
    /// - `Validation` for blank titles.
    /// - `DuplicateId` when the generated id already exists.
    pub fn add(&self, title: &str) -> BridgeResult<Task> {
        let title = normalize_title(title)?;
        self.mutate("add", move |conn, ids| {
            let task = Task {
                id: ids.next_id(),
                title,
                completed: false,
            };
            let params = vec![
                SqlValue::Integer(task.id.get()),
                SqlValue::Text(task.title.clone()),
                SqlValue::Integer(0),
            ];
            match conn.send_params(INSERT_TASK_SQL, params) {
                Ok(_) => Ok(task),
                Err(err) if err.is_constraint_violation() => Err(BridgeError::DuplicateId(task.id)),
                Err(err) => Err(err.into()),
            }
        })
    }

    pub fn edit(&self, id: TaskId, title: &str) -> BridgeResult<Task> {
        let title = normalize_title(title)?;
        self.mutate("edit", move |conn, _| {
            let changed = conn.send_params(
                UPDATE_TITLE_SQL,
                vec![SqlValue::Text(title), SqlValue::Integer(id.get())],
            )?;
            if changed == 0 {
                return Err(BridgeError::NotFound(id));
            }
            fetch_task(conn, id)
        })
    }

    pub fn delete(&self, id: TaskId) -> BridgeResult<()> {
        self.mutate("delete", move |conn, _| {
            let changed = conn.send_params(DELETE_TASK_SQL, vec![SqlValue::Integer(id.get())])?;
            if changed == 0 {
                return Err(BridgeError::NotFound(id));
            }
            Ok(())
        })
    }

    /// Flips `completed` in the table and returns the updated task.
    pub fn toggle_completed(&self, id: TaskId) -> BridgeResult<Task> {
        self.mutate("toggle_completed", move |conn, _| {
            let changed =
                conn.send_params(TOGGLE_COMPLETED_SQL, vec![SqlValue::Integer(id.get())])?;
            if changed == 0 {
                return Err(BridgeError::NotFound(id));
            }
            fetch_task(conn, id)
        })
    }

    /// Deletes every task. Returns how many were removed.
    pub fn clear(&self) -> BridgeResult<usize> {
        self.mutate("clear", |conn, _| {
            Ok(conn.send_params(CLEAR_TASKS_SQL, Vec::new())?)
        })
    }

    /// Exports the table and overwrites the cached snapshot.
    pub fn save(&self) -> BridgeResult<SaveReport> {
        let _gate = self.lock_ids();
        self.save_locked()
    }

    /// Runs one read-only statement for inspection.
    pub fn query(&self, sql: &str) -> BridgeResult<QueryResult> {
        let _gate = self.lock_ids();
        Ok(self.conn.query_read_only(sql)?)
    }

    fn lock_ids(&self) -> std::sync::MutexGuard<'_, Box<dyn IdGenerator>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn save_locked(&self) -> BridgeResult<SaveReport> {
        let stats = self.conn.export_table(TODOS_TABLE, SNAPSHOT_FILE)?;
        let buffer = self.conn.copy_file_to_buffer(SNAPSHOT_FILE)?;
        self.cache.set(&self.snapshot_key, buffer)?;
        Ok(SaveReport {
            rows: stats.rows,
            bytes: stats.bytes,
        })
    }

    fn mutate<T>(
        &self,
        op: &'static str,
        statement: impl FnOnce(&EngineConnection, &mut dyn IdGenerator) -> BridgeResult<T>,
    ) -> BridgeResult<T> {
        let started_at = Instant::now();
        let mut ids = self.lock_ids();

        self.conn.send("BEGIN;")?;
        let outcome = statement(&self.conn, &mut **ids)
            .and_then(|value| self.save_locked().map(|report| (value, report)));

        let (value, report) = match outcome {
            Ok(done) => done,
            Err(err) => {
                self.rollback(op);
                warn!(
                    "event=task_mutation module=bridge op={} status=error duration_ms={} error_code={} error={}",
                    op,
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                return Err(err);
            }
        };

        if let Err(err) = self.conn.send("COMMIT;") {
            self.rollback(op);
            // The snapshot was already replaced; bring it back to the engine state.
            if let Err(resync) = self.save_locked() {
                error!(
                    "event=snapshot_resync module=bridge op={} status=error error={}",
                    op, resync
                );
            }
            return Err(err.into());
        }

        info!(
            "event=task_mutation module=bridge op={} status=ok rows={} bytes={} duration_ms={}",
            op,
            report.rows,
            report.bytes,
            started_at.elapsed().as_millis()
        );
        Ok(value)
    }

    fn rollback(&self, op: &'static str) {
        if let Err(err) = self.conn.send("ROLLBACK;") {
            error!(
                "event=task_rollback module=bridge op={} status=error error={}",
                op, err
            );
        }
    }
}

impl TaskStore for PersistenceBridge {
    fn load_tasks(&self) -> BridgeResult<Vec<Task>> {
        PersistenceBridge::load_tasks(self)
    }

    fn add(&self, title: &str) -> BridgeResult<Task> {
        PersistenceBridge::add(self, title)
    }

    fn edit(&self, id: TaskId, title: &str) -> BridgeResult<Task> {
        PersistenceBridge::edit(self, id, title)
    }

    fn delete(&self, id: TaskId) -> BridgeResult<()> {
        PersistenceBridge::delete(self, id)
    }

    fn toggle_completed(&self, id: TaskId) -> BridgeResult<Task> {
        PersistenceBridge::toggle_completed(self, id)
    }

    fn clear(&self) -> BridgeResult<usize> {
        PersistenceBridge::clear(self)
    }
}

fn fetch_task(conn: &EngineConnection, id: TaskId) -> BridgeResult<Task> {
    let result = conn.query_params(SELECT_TASK_SQL, vec![SqlValue::Integer(id.get())])?;
    parse_tasks(&result)?
        .into_iter()
        .next()
        .ok_or(BridgeError::NotFound(id))
}

fn parse_tasks(result: &QueryResult) -> BridgeResult<Vec<Task>> {
    result
        .rows
        .iter()
        .map(|row| parse_task_row(row.as_slice()))
        .collect()
}

fn parse_task_row(row: &[SqlValue]) -> BridgeResult<Task> {
    let id = match row.first() {
        Some(SqlValue::Integer(value)) => TaskId(*value),
        other => {
            return Err(BridgeError::InvalidData(format!(
                "invalid id value {other:?} in todos.id"
            )))
        }
    };
    let title = match row.get(1) {
        Some(SqlValue::Text(value)) => value.clone(),
        other => {
            return Err(BridgeError::InvalidData(format!(
                "invalid title value {other:?} for task {id}"
            )))
        }
    };
    let completed = match row.get(2) {
        Some(SqlValue::Integer(0)) | Some(SqlValue::Null) => false,
        Some(SqlValue::Integer(1)) => true,
        other => {
            return Err(BridgeError::InvalidData(format!(
                "invalid completed value {other:?} for task {id}"
            )))
        }
    };
    Ok(Task {
        id,
        title,
        completed,
    })
}
