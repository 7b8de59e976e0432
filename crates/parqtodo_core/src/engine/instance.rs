//! Engine state owned by the runtime: one SQLite connection plus virtual files.

use crate::engine::columnar::{self, ColumnKind, ColumnSpec};
use crate::engine::connection::ExportStats;
use crate::engine::vfs::VirtualFs;
use crate::engine::{quote_ident, EngineError, EngineResult, QueryResult, SqlValue};
use bytes::Bytes;
use rusqlite::{params_from_iter, Connection};

pub(crate) struct EngineCore {
    conn: Connection,
    files: VirtualFs,
}

impl EngineCore {
    pub(crate) fn open() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            files: VirtualFs::default(),
        })
    }

    pub(crate) fn execute_batch(&self, sql: &str) -> EngineResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    pub(crate) fn execute(&self, sql: &str, params: &[SqlValue]) -> EngineResult<usize> {
        let changed = self.conn.execute(sql, params_from_iter(params.iter()))?;
        Ok(changed)
    }

    pub(crate) fn query(
        &self,
        sql: &str,
        params: &[SqlValue],
        read_only: bool,
    ) -> EngineResult<QueryResult> {
        let mut stmt = self.conn.prepare(sql)?;
        // SQLite reports transaction control and ATTACH as read-only.
        if read_only && (!stmt.readonly() || is_session_control(sql)) {
            return Err(EngineError::ReadOnlyViolation);
        }

        let columns = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let width = columns.len();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for index in 0..width {
                cells.push(row.get::<_, SqlValue>(index)?);
            }
            values.push(cells);
        }

        Ok(QueryResult {
            columns,
            rows: values,
        })
    }

    pub(crate) fn put_file(&mut self, name: &str, buffer: Bytes) {
        self.files.put(name, buffer);
    }

    pub(crate) fn file(&self, name: &str) -> EngineResult<Bytes> {
        self.files
            .get(name)
            .ok_or_else(|| EngineError::FileNotFound(name.to_string()))
    }

    pub(crate) fn remove_file(&mut self, name: &str) -> bool {
        self.files.remove(name)
    }

    pub(crate) fn file_names(&self) -> Vec<String> {
        self.files.names()
    }

    /// Writes every row of `table` into virtual file `file` as Parquet.
    pub(crate) fn export_table(&mut self, table: &str, file: &str) -> EngineResult<ExportStats> {
        let columns = self.table_columns(table)?;
        let select = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            join_idents(&columns),
            quote_ident(table)
        );
        let result = self.query(&select, &[], false)?;
        let buffer = columnar::encode(&columns, &result.rows)?;
        let stats = ExportStats {
            rows: result.rows.len(),
            bytes: buffer.len(),
        };
        self.files.put(file, Bytes::from(buffer));
        Ok(stats)
    }

    /// Appends the rows of Parquet file `file` to `table`, creating the table
    /// from the file schema when it does not exist yet.
    pub(crate) fn import_table(&mut self, table: &str, file: &str) -> EngineResult<usize> {
        let buffer = self.file(file)?;
        let decoded = columnar::decode(buffer)?;
        if decoded.columns.is_empty() {
            return Err(EngineError::Columnar(format!(
                "file `{file}` declares no columns"
            )));
        }

        let definitions = decoded
            .columns
            .iter()
            .map(|column| format!("{} {}", quote_ident(&column.name), column.kind.sql_type()))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=decoded.columns.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            join_idents(&decoded.columns),
            placeholders
        );

        let savepoint = self.conn.savepoint()?;
        savepoint.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({definitions});",
            quote_ident(table)
        ))?;
        {
            let mut stmt = savepoint.prepare(&insert)?;
            for row in &decoded.rows {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        savepoint.commit()?;

        Ok(decoded.rows.len())
    }

    fn table_columns(&self, table: &str) -> EngineResult<Vec<ColumnSpec>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({});", quote_ident(table)))?;
        let mut rows = stmt.query([])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get("name")?;
            let declared: String = row.get("type")?;
            let kind = ColumnKind::from_declared(&declared).ok_or_else(|| {
                EngineError::UnsupportedColumnType {
                    column: name.clone(),
                    declared: declared.clone(),
                }
            })?;
            columns.push(ColumnSpec { name, kind });
        }

        if columns.is_empty() {
            return Err(EngineError::TableNotFound(table.to_string()));
        }
        Ok(columns)
    }
}

fn is_session_control(sql: &str) -> bool {
    const KEYWORDS: [&str; 8] = [
        "BEGIN", "COMMIT", "END", "ROLLBACK", "SAVEPOINT", "RELEASE", "ATTACH", "DETACH",
    ];
    let first = sql
        .trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    KEYWORDS.contains(&first.as_str())
}

fn join_idents(columns: &[ColumnSpec]) -> String {
    columns
        .iter()
        .map(|column| quote_ident(&column.name))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::{is_session_control, EngineCore};
    use crate::engine::EngineError;

    #[test]
    fn session_control_is_detected_case_insensitively() {
        assert!(is_session_control("  begin transaction"));
        assert!(is_session_control("ROLLBACK;"));
        assert!(is_session_control("attach ':memory:' as other"));
        assert!(!is_session_control("SELECT 1"));
        assert!(!is_session_control("with t as (select 1) select * from t"));
    }

    #[test]
    fn read_only_query_refuses_transaction_control() {
        let core = EngineCore::open().unwrap();
        let err = core.query("BEGIN", &[], true).unwrap_err();
        assert!(matches!(err, EngineError::ReadOnlyViolation));
        assert!(core.conn.is_autocommit());
    }
}
