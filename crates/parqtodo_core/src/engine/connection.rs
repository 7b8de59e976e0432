//! Public engine handles: the instantiated `Database` and its connections.

use crate::engine::runtime::Runtime;
use crate::engine::{EngineBundle, EngineResult, QueryResult, SqlValue};
use bytes::Bytes;
use log::{error, info};
use std::sync::Arc;
use std::time::Instant;

/// Size of one table export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportStats {
    pub rows: usize,
    pub bytes: usize,
}

/// One instantiated engine. Cheap to share through `connect()`.
pub struct Database {
    runtime: Arc<Runtime>,
    bundle: EngineBundle,
}

impl Database {
    /// Starts the engine using `bundle`.
    ///
    /// # Errors
    /// - `Instantiate` when the worker cannot start.
    /// - `Sql` when the in-memory database cannot be opened.
    pub fn instantiate(bundle: EngineBundle) -> EngineResult<Self> {
        let started_at = Instant::now();
        match Runtime::start(bundle) {
            Ok(runtime) => {
                info!(
                    "event=engine_instantiate module=engine status=ok bundle={} duration_ms={}",
                    bundle.as_str(),
                    started_at.elapsed().as_millis()
                );
                Ok(Self {
                    runtime: Arc::new(runtime),
                    bundle,
                })
            }
            Err(err) => {
                error!(
                    "event=engine_instantiate module=engine status=error bundle={} duration_ms={} error={}",
                    bundle.as_str(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    pub fn bundle(&self) -> EngineBundle {
        self.bundle
    }

    pub fn connect(&self) -> EngineConnection {
        EngineConnection {
            runtime: Arc::clone(&self.runtime),
        }
    }

    /// Registers `buffer` as virtual file `name`, replacing any previous one.
    pub fn register_file_buffer(&self, name: &str, buffer: impl Into<Bytes>) -> EngineResult<()> {
        let name = name.to_string();
        let buffer = buffer.into();
        self.runtime.call(move |core| {
            core.put_file(&name, buffer);
            Ok(())
        })
    }

    pub fn copy_file_to_buffer(&self, name: &str) -> EngineResult<Bytes> {
        self.connect().copy_file_to_buffer(name)
    }

    /// Removes a virtual file. Returns whether it existed.
    pub fn drop_file(&self, name: &str) -> EngineResult<bool> {
        let name = name.to_string();
        self.runtime.call(move |core| Ok(core.remove_file(&name)))
    }

    pub fn file_names(&self) -> EngineResult<Vec<String>> {
        self.runtime.call(|core| Ok(core.file_names()))
    }
}

/// Statement channel into a `Database`.
#[derive(Clone)]
pub struct EngineConnection {
    runtime: Arc<Runtime>,
}

impl EngineConnection {
    /// Executes one or more statements without bound values.
    pub fn send(&self, sql: &str) -> EngineResult<()> {
        let sql = sql.to_string();
        self.runtime.call(move |core| core.execute_batch(&sql))
    }

    /// Executes one statement with bound values. Returns the changed row count.
    pub fn send_params(&self, sql: &str, params: Vec<SqlValue>) -> EngineResult<usize> {
        let sql = sql.to_string();
        self.runtime.call(move |core| core.execute(&sql, &params))
    }

    pub fn query(&self, sql: &str) -> EngineResult<QueryResult> {
        self.query_params(sql, Vec::new())
    }

    pub fn query_params(&self, sql: &str, params: Vec<SqlValue>) -> EngineResult<QueryResult> {
        let sql = sql.to_string();
        self.runtime.call(move |core| core.query(&sql, &params, false))
    }

    /// Like `query`, but rejects statements that would write.
    pub fn query_read_only(&self, sql: &str) -> EngineResult<QueryResult> {
        let sql = sql.to_string();
        self.runtime.call(move |core| core.query(&sql, &[], true))
    }

    /// `COPY (SELECT * FROM table) TO 'file'` into the virtual filesystem.
    pub fn export_table(&self, table: &str, file: &str) -> EngineResult<ExportStats> {
        let table = table.to_string();
        let file = file.to_string();
        self.runtime.call(move |core| core.export_table(&table, &file))
    }

    /// `CREATE TABLE table AS SELECT * FROM 'file'`, appending when the table exists.
    pub fn import_table(&self, table: &str, file: &str) -> EngineResult<usize> {
        let table = table.to_string();
        let file = file.to_string();
        self.runtime.call(move |core| core.import_table(&table, &file))
    }

    pub fn copy_file_to_buffer(&self, name: &str) -> EngineResult<Bytes> {
        let name = name.to_string();
        self.runtime.call(move |core| core.file(&name))
    }
}
