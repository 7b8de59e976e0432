//! Parquet codec for engine tables.
//!
//! # Responsibility
//! - Encode a table's rows into one Parquet file buffer.
//! - Decode a Parquet file buffer into column specs and rows.
//!
//! # Invariants
//! - Every column is written nullable; SQL NULL round-trips as Parquet null.
//! - Booleans are carried as SQLite integers `0`/`1` on the SQL side.

use crate::engine::{EngineError, EngineResult, SqlValue};
use arrow_array::{
    Array, ArrayRef, BooleanArray, Float64Array, Int32Array, Int64Array, LargeStringArray,
    RecordBatch, StringArray,
};
use arrow_schema::{DataType, Field, Schema};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::sync::Arc;

/// Logical column type shared by SQL declarations and Arrow fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int64,
    Float64,
    Utf8,
    Boolean,
}

impl ColumnKind {
    /// Maps a declared SQL column type (`BIGINT`, `VARCHAR(20)`, `BOOL`, ...).
    pub fn from_declared(declared: &str) -> Option<Self> {
        let upper = declared.trim().to_ascii_uppercase();
        if upper.contains("BOOL") {
            Some(Self::Boolean)
        } else if upper.contains("INT") {
            Some(Self::Int64)
        } else if ["CHAR", "CLOB", "TEXT", "STRING"]
            .iter()
            .any(|needle| upper.contains(needle))
        {
            Some(Self::Utf8)
        } else if ["REAL", "FLOA", "DOUB", "DECIMAL", "NUMERIC"]
            .iter()
            .any(|needle| upper.contains(needle))
        {
            Some(Self::Float64)
        } else {
            None
        }
    }

    pub fn from_arrow(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Int64 | DataType::Int32 => Some(Self::Int64),
            DataType::Float64 => Some(Self::Float64),
            DataType::Utf8 | DataType::LargeUtf8 => Some(Self::Utf8),
            DataType::Boolean => Some(Self::Boolean),
            _ => None,
        }
    }

    pub fn arrow_type(self) -> DataType {
        match self {
            Self::Int64 => DataType::Int64,
            Self::Float64 => DataType::Float64,
            Self::Utf8 => DataType::Utf8,
            Self::Boolean => DataType::Boolean,
        }
    }

    /// SQL type used when a table is materialized from a file.
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Int64 => "BIGINT",
            Self::Float64 => "DOUBLE",
            Self::Utf8 => "VARCHAR",
            Self::Boolean => "BOOL",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int64 => "bigint",
            Self::Float64 => "double",
            Self::Utf8 => "varchar",
            Self::Boolean => "bool",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Rows recovered from a Parquet buffer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedTable {
    pub columns: Vec<ColumnSpec>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// Encodes `rows` (each as wide as `columns`) as a Snappy-compressed Parquet file.
pub fn encode(columns: &[ColumnSpec], rows: &[Vec<SqlValue>]) -> EngineResult<Vec<u8>> {
    if columns.is_empty() {
        return Err(EngineError::Columnar(
            "cannot encode a table without columns".to_string(),
        ));
    }

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|column| Field::new(column.name.as_str(), column.kind.arrow_type(), true))
            .collect::<Vec<_>>(),
    ));
    let arrays = columns
        .iter()
        .enumerate()
        .map(|(index, column)| build_array(column, index, rows))
        .collect::<EngineResult<Vec<ArrayRef>>>()?;
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(buffer)
}

/// Decodes a Parquet file buffer.
///
/// # Errors
/// - `Columnar` when the buffer is not a readable Parquet file.
/// - `UnsupportedColumnType` for fields outside `ColumnKind`.
pub fn decode(buffer: Bytes) -> EngineResult<DecodedTable> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(buffer)?;
    let columns = builder
        .schema()
        .fields()
        .iter()
        .map(|field| {
            ColumnKind::from_arrow(field.data_type())
                .map(|kind| ColumnSpec::new(field.name().clone(), kind))
                .ok_or_else(|| EngineError::UnsupportedColumnType {
                    column: field.name().clone(),
                    declared: field.data_type().to_string(),
                })
        })
        .collect::<EngineResult<Vec<_>>>()?;

    let reader = builder.build()?;
    let mut rows: Vec<Vec<SqlValue>> = Vec::new();
    for batch in reader {
        let batch = batch?;
        let offset = rows.len();
        rows.extend((0..batch.num_rows()).map(|_| Vec::with_capacity(columns.len())));
        for (index, column) in columns.iter().enumerate() {
            let array = batch.column(index);
            for row in 0..batch.num_rows() {
                rows[offset + row].push(read_cell(column, array.as_ref(), row)?);
            }
        }
    }

    Ok(DecodedTable { columns, rows })
}

fn build_array(
    column: &ColumnSpec,
    index: usize,
    rows: &[Vec<SqlValue>],
) -> EngineResult<ArrayRef> {
    let cells = rows.iter().map(|row| row.get(index));
    let array: ArrayRef = match column.kind {
        ColumnKind::Int64 => Arc::new(Int64Array::from(
            cells
                .map(|cell| to_i64(column, cell))
                .collect::<EngineResult<Vec<_>>>()?,
        )),
        ColumnKind::Float64 => Arc::new(Float64Array::from(
            cells
                .map(|cell| to_f64(column, cell))
                .collect::<EngineResult<Vec<_>>>()?,
        )),
        ColumnKind::Utf8 => Arc::new(StringArray::from(
            cells
                .map(|cell| to_text(column, cell))
                .collect::<EngineResult<Vec<_>>>()?,
        )),
        ColumnKind::Boolean => Arc::new(BooleanArray::from(
            cells
                .map(|cell| to_bool(column, cell))
                .collect::<EngineResult<Vec<_>>>()?,
        )),
    };
    Ok(array)
}

fn to_i64(column: &ColumnSpec, cell: Option<&SqlValue>) -> EngineResult<Option<i64>> {
    match cell {
        None | Some(SqlValue::Null) => Ok(None),
        Some(SqlValue::Integer(value)) => Ok(Some(*value)),
        Some(_) => Err(mismatch(column)),
    }
}

fn to_f64(column: &ColumnSpec, cell: Option<&SqlValue>) -> EngineResult<Option<f64>> {
    match cell {
        None | Some(SqlValue::Null) => Ok(None),
        Some(SqlValue::Real(value)) => Ok(Some(*value)),
        Some(SqlValue::Integer(value)) => Ok(Some(*value as f64)),
        Some(_) => Err(mismatch(column)),
    }
}

fn to_text(column: &ColumnSpec, cell: Option<&SqlValue>) -> EngineResult<Option<String>> {
    match cell {
        None | Some(SqlValue::Null) => Ok(None),
        Some(SqlValue::Text(value)) => Ok(Some(value.clone())),
        Some(SqlValue::Integer(value)) => Ok(Some(value.to_string())),
        Some(SqlValue::Real(value)) => Ok(Some(value.to_string())),
        Some(SqlValue::Blob(_)) => Err(mismatch(column)),
    }
}

fn to_bool(column: &ColumnSpec, cell: Option<&SqlValue>) -> EngineResult<Option<bool>> {
    match cell {
        None | Some(SqlValue::Null) => Ok(None),
        Some(SqlValue::Integer(0)) => Ok(Some(false)),
        Some(SqlValue::Integer(1)) => Ok(Some(true)),
        Some(_) => Err(mismatch(column)),
    }
}

fn read_cell(column: &ColumnSpec, array: &dyn Array, row: usize) -> EngineResult<SqlValue> {
    if array.is_null(row) {
        return Ok(SqlValue::Null);
    }
    let value = match array.data_type() {
        DataType::Int64 => SqlValue::Integer(downcast::<Int64Array>(column, array)?.value(row)),
        DataType::Int32 => {
            SqlValue::Integer(i64::from(downcast::<Int32Array>(column, array)?.value(row)))
        }
        DataType::Float64 => SqlValue::Real(downcast::<Float64Array>(column, array)?.value(row)),
        DataType::Utf8 => {
            SqlValue::Text(downcast::<StringArray>(column, array)?.value(row).to_string())
        }
        DataType::LargeUtf8 => SqlValue::Text(
            downcast::<LargeStringArray>(column, array)?
                .value(row)
                .to_string(),
        ),
        DataType::Boolean => SqlValue::Integer(i64::from(
            downcast::<BooleanArray>(column, array)?.value(row),
        )),
        other => {
            return Err(EngineError::UnsupportedColumnType {
                column: column.name.clone(),
                declared: other.to_string(),
            })
        }
    };
    Ok(value)
}

fn downcast<'a, T: 'static>(column: &ColumnSpec, array: &'a dyn Array) -> EngineResult<&'a T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| mismatch(column))
}

fn mismatch(column: &ColumnSpec) -> EngineError {
    EngineError::TypeMismatch {
        column: column.name.clone(),
        expected: column.kind,
    }
}

#[cfg(test)]
mod tests {
    use super::{decode, encode, ColumnKind, ColumnSpec};
    use crate::engine::{EngineError, SqlValue};
    use bytes::Bytes;

    fn todo_columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("id", ColumnKind::Int64),
            ColumnSpec::new("title", ColumnKind::Utf8),
            ColumnSpec::new("completed", ColumnKind::Boolean),
        ]
    }

    #[test]
    fn declared_types_map_to_column_kinds() {
        assert_eq!(ColumnKind::from_declared("bigint"), Some(ColumnKind::Int64));
        assert_eq!(ColumnKind::from_declared("VARCHAR(64)"), Some(ColumnKind::Utf8));
        assert_eq!(ColumnKind::from_declared("bool"), Some(ColumnKind::Boolean));
        assert_eq!(ColumnKind::from_declared("BOOLEAN"), Some(ColumnKind::Boolean));
        assert_eq!(ColumnKind::from_declared("double precision"), Some(ColumnKind::Float64));
        assert_eq!(ColumnKind::from_declared(""), None);
        assert_eq!(ColumnKind::from_declared("blob"), None);
    }

    #[test]
    fn encoded_rows_decode_with_nulls_and_booleans() {
        let rows = vec![
            vec![
                SqlValue::Integer(1),
                SqlValue::Text("it's here".to_string()),
                SqlValue::Integer(0),
            ],
            vec![SqlValue::Integer(2), SqlValue::Null, SqlValue::Integer(1)],
        ];

        let buffer = encode(&todo_columns(), &rows).unwrap();
        assert_eq!(&buffer[..4], b"PAR1");

        let decoded = decode(Bytes::from(buffer)).unwrap();
        assert_eq!(decoded.columns, todo_columns());
        assert_eq!(decoded.rows, rows);
    }

    #[test]
    fn empty_table_keeps_its_schema() {
        let buffer = encode(&todo_columns(), &[]).unwrap();
        let decoded = decode(Bytes::from(buffer)).unwrap();
        assert_eq!(decoded.columns, todo_columns());
        assert!(decoded.rows.is_empty());
    }

    #[test]
    fn boolean_column_rejects_out_of_range_integers() {
        let rows = vec![vec![
            SqlValue::Integer(1),
            SqlValue::Text("x".to_string()),
            SqlValue::Integer(7),
        ]];
        let err = encode(&todo_columns(), &rows).unwrap_err();
        assert!(matches!(
            err,
            EngineError::TypeMismatch {
                ref column,
                expected: ColumnKind::Boolean,
            } if column == "completed"
        ));
    }

    #[test]
    fn decode_rejects_non_parquet_bytes() {
        let err = decode(Bytes::from_static(b"not a parquet file")).unwrap_err();
        assert!(matches!(err, EngineError::Columnar(_)));
    }
}
