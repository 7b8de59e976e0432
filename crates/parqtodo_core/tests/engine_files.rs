use parqtodo_core::engine::columnar::{decode, ColumnKind, ColumnSpec};
use parqtodo_core::{Database, EngineBundle, EngineError, SqlValue};

fn open(bundle: EngineBundle) -> Database {
    Database::instantiate(bundle).unwrap()
}

#[test]
fn send_and_query_work_on_both_bundles() {
    for bundle in [EngineBundle::Worker, EngineBundle::Inline] {
        let db = open(bundle);
        assert_eq!(db.bundle(), bundle);
        let conn = db.connect();

        conn.send("CREATE TABLE notes(id BIGINT, body VARCHAR);").unwrap();
        let changed = conn
            .send_params(
                "INSERT INTO notes(id, body) VALUES (?1, ?2), (?3, ?4);",
                vec![
                    SqlValue::Integer(1),
                    SqlValue::Text("one".to_string()),
                    SqlValue::Integer(2),
                    SqlValue::Text("two".to_string()),
                ],
            )
            .unwrap();
        assert_eq!(changed, 2);

        let result = conn.query("SELECT id, body FROM notes ORDER BY id;").unwrap();
        assert_eq!(result.columns, vec!["id", "body"]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.rows[1][1], SqlValue::Text("two".to_string()));
        assert_eq!(result.column_index("body"), Some(1));
    }
}

#[test]
fn export_writes_parquet_into_virtual_file() {
    let db = open(EngineBundle::Inline);
    let conn = db.connect();
    conn.send(
        "CREATE TABLE todos(id BIGINT PRIMARY KEY, title VARCHAR, completed BOOL);
         INSERT INTO todos VALUES (10, 'a', 0), (20, 'b', 1);",
    )
    .unwrap();

    let stats = conn.export_table("todos", "todos.parquet").unwrap();
    assert_eq!(stats.rows, 2);

    let buffer = db.copy_file_to_buffer("todos.parquet").unwrap();
    assert_eq!(buffer.len(), stats.bytes);
    assert_eq!(db.file_names().unwrap(), vec!["todos.parquet".to_string()]);

    let decoded = decode(buffer).unwrap();
    assert_eq!(
        decoded.columns,
        vec![
            ColumnSpec::new("id", ColumnKind::Int64),
            ColumnSpec::new("title", ColumnKind::Utf8),
            ColumnSpec::new("completed", ColumnKind::Boolean),
        ]
    );
    assert_eq!(decoded.rows[1][2], SqlValue::Integer(1));
}

#[test]
fn import_materializes_table_in_another_engine() {
    let source = open(EngineBundle::Worker);
    let conn = source.connect();
    conn.send(
        "CREATE TABLE todos(id BIGINT PRIMARY KEY, title VARCHAR, completed BOOL);
         INSERT INTO todos VALUES (1, 'it''s quoted', 1);",
    )
    .unwrap();
    conn.export_table("todos", "todos.parquet").unwrap();
    let buffer = source.copy_file_to_buffer("todos.parquet").unwrap();

    let target = open(EngineBundle::Worker);
    target.register_file_buffer("todos.parquet", buffer).unwrap();
    let imported = target.connect().import_table("todos", "todos.parquet").unwrap();
    assert_eq!(imported, 1);

    let result = target
        .connect()
        .query("SELECT title, completed FROM todos;")
        .unwrap();
    assert_eq!(result.rows[0][0], SqlValue::Text("it's quoted".to_string()));
    assert_eq!(result.rows[0][1], SqlValue::Integer(1));
}

#[test]
fn import_of_unknown_file_fails() {
    let db = open(EngineBundle::Inline);
    let err = db.connect().import_table("todos", "missing.parquet").unwrap_err();
    assert!(matches!(err, EngineError::FileNotFound(name) if name == "missing.parquet"));
}

#[test]
fn export_of_unknown_table_fails() {
    let db = open(EngineBundle::Inline);
    let err = db.connect().export_table("nope", "nope.parquet").unwrap_err();
    assert!(matches!(err, EngineError::TableNotFound(name) if name == "nope"));
}

#[test]
fn read_only_query_rejects_writes() {
    let db = open(EngineBundle::Inline);
    let conn = db.connect();
    conn.send("CREATE TABLE t(x BIGINT);").unwrap();

    let err = conn.query_read_only("DELETE FROM t;").unwrap_err();
    assert!(matches!(err, EngineError::ReadOnlyViolation));
    assert!(conn.query_read_only("SELECT count(*) FROM t;").is_ok());
}

#[test]
fn duplicate_primary_key_is_a_constraint_violation() {
    let db = open(EngineBundle::Inline);
    let conn = db.connect();
    conn.send("CREATE TABLE t(id BIGINT PRIMARY KEY);").unwrap();
    conn.send_params("INSERT INTO t(id) VALUES (?1);", vec![SqlValue::Integer(5)])
        .unwrap();

    let err = conn
        .send_params("INSERT INTO t(id) VALUES (?1);", vec![SqlValue::Integer(5)])
        .unwrap_err();
    assert!(err.is_constraint_violation());
}

#[test]
fn dropped_file_is_gone() {
    let db = open(EngineBundle::Inline);
    db.register_file_buffer("a.parquet", vec![1_u8, 2, 3]).unwrap();
    assert!(db.drop_file("a.parquet").unwrap());
    assert!(!db.drop_file("a.parquet").unwrap());
    assert!(matches!(
        db.copy_file_to_buffer("a.parquet").unwrap_err(),
        EngineError::FileNotFound(_)
    ));
}
