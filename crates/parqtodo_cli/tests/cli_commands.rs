use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn parqtodo(cache_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_parqtodo"))
        .arg("--cache-dir")
        .arg(cache_dir)
        .args(["--bundle", "inline", "--log-level", "info"])
        .args(args)
        .env_remove("PARQTODO_LOG_DIR")
        .env_remove("PARQTODO_ID_STRATEGY")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn tasks_persist_across_invocations() {
    let dir = TempDir::new().unwrap();

    let added = parqtodo(dir.path(), &["add", "Buy", "milk"]);
    assert!(added.status.success(), "{}", String::from_utf8_lossy(&added.stderr));
    assert!(stdout(&added).contains("1 tasks left"));
    assert!(dir.path().join("todos.snapshot").exists());

    let listed = parqtodo(dir.path(), &["list", "--json"]);
    assert!(listed.status.success());
    let tasks: serde_json::Value = serde_json::from_str(&stdout(&listed)).unwrap();
    assert_eq!(tasks[0]["title"], "Buy milk");
    assert_eq!(tasks[0]["completed"], false);

    let id = tasks[0]["id"].as_i64().unwrap().to_string();
    let toggled = parqtodo(dir.path(), &["toggle", &id]);
    assert!(toggled.status.success());
    assert!(stdout(&toggled).contains("0 tasks left"));

    let relisted = parqtodo(dir.path(), &["list", "--json"]);
    let tasks: serde_json::Value = serde_json::from_str(&stdout(&relisted)).unwrap();
    assert_eq!(tasks[0]["completed"], true);
}

#[test]
fn unknown_task_fails_with_message() {
    let dir = TempDir::new().unwrap();
    let output = parqtodo(dir.path(), &["delete", "42"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("task not found: 42"));
}

#[test]
fn sql_runs_read_only_queries() {
    let dir = TempDir::new().unwrap();
    parqtodo(dir.path(), &["add", "one"]);

    let counted = parqtodo(dir.path(), &["sql", "SELECT COUNT(*) AS n FROM todos"]);
    assert!(counted.status.success());
    assert_eq!(stdout(&counted), "n\n1\n(1 rows)\n");

    let rejected = parqtodo(dir.path(), &["sql", "DROP TABLE todos"]);
    assert!(!rejected.status.success());
}
