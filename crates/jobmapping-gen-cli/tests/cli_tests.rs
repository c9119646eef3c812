//! CLI integration tests for jobmapping-gen.
//!
//! These tests verify command-line argument parsing, help output,
//! exit codes, and end-to-end generation in a scratch directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

/// Get a command for the jobmapping-gen binary.
fn cmd() -> Command {
    Command::cargo_bin("jobmapping-gen").unwrap()
}

/// Write `<root>/<folder>/create.sql`.
fn write_ddl(root: &Path, folder: &str, sql: &str) {
    let dir = root.join(folder);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("create.sql"), sql).unwrap();
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_arguments_and_flags() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("<CONFIG>"))
        .stdout(predicate::str::contains("<PACKAGE>"))
        .stdout(predicate::str::contains("--workers"))
        .stdout(predicate::str::contains("--strict-drivers"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("jobmapping-gen"));
}

#[test]
fn test_logging_defaults() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[default: text]"))
        .stdout(predicate::str::contains("[default: info]"));
}

#[test]
fn test_missing_arguments_is_usage_error() {
    cmd()
        .arg("requests.json")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("<PACKAGE>"));
}

// =============================================================================
// Configuration Errors
// =============================================================================

#[test]
fn test_missing_config_file() {
    cmd()
        .args(["/nonexistent/requests.json", "workflow_testdata"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_invalid_json_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("requests.json"), "{ not json").unwrap();

    cmd()
        .current_dir(dir.path())
        .args(["requests.json", "workflow_testdata"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("JSON error"));
}

#[test]
fn test_empty_request_list() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("requests.json"), "[]").unwrap();

    cmd()
        .current_dir(dir.path())
        .args(["requests.json", "workflow_testdata"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("request list is empty"));
}

#[test]
fn test_zero_workers_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_ddl(dir.path(), "mysql", "USE s;\n");
    fs::write(
        dir.path().join("requests.json"),
        r#"[{"folder": "mysql", "sql_file": "create.sql", "driver": "mysql"}]"#,
    )
    .unwrap();

    cmd()
        .current_dir(dir.path())
        .args(["requests.json", "workflow_testdata", "--workers", "0"])
        .assert()
        .failure()
        .code(1);
}

// =============================================================================
// End-to-End Generation
// =============================================================================

#[test]
fn test_generates_job_mappings_for_every_driver() {
    let dir = tempfile::tempdir().unwrap();
    write_ddl(
        dir.path(),
        "postgres/alltypes",
        "CREATE SCHEMA public;\nCREATE TABLE public.users (id int, email text);\n",
    );
    write_ddl(
        dir.path(),
        "mysql",
        "USE shop;\nCREATE TABLE IF NOT EXISTS shop.orders (\n  id INT,\n  PRIMARY KEY (id)\n);\n",
    );
    write_ddl(
        dir.path(),
        "mssql/simple",
        "CREATE TABLE orders (id INT, total DECIMAL(10,2));\nGO\n",
    );
    fs::write(
        dir.path().join("requests.json"),
        r#"[
            {"folder": "postgres/alltypes", "sql_file": "create.sql", "driver": "postgres"},
            {"folder": "mysql", "sql_file": "create.sql", "driver": "mysql"},
            {"folder": "mssql/simple", "sql_file": "create.sql", "driver": "sqlserver"}
        ]"#,
    )
    .unwrap();

    cmd()
        .current_dir(dir.path())
        .args(["requests.json", "workflow_testdata", "--workers", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generation completed!"))
        .stdout(predicate::str::contains("Mappings: 5"));

    let pg = fs::read_to_string(dir.path().join("postgres/alltypes/job_mappings.go")).unwrap();
    assert!(pg.contains("package postgres_alltypes"));
    assert!(pg.contains("// source: create.sql"));
    assert!(pg.contains("Column: \"email\""));
    assert!(!pg.contains("GetTableColumnTypeMap"));

    let my = fs::read_to_string(dir.path().join("mysql/job_mappings.go")).unwrap();
    assert!(my.contains("package testdata_mysql"));
    assert!(my.contains("Schema: \"shop\""));

    let ms = fs::read_to_string(dir.path().join("mssql/simple/job_mappings.go")).unwrap();
    assert!(ms.contains("package mssql_simple"));
    assert!(ms.contains("func GetTableColumnTypeMap() map[string]map[string]string {"));
    assert!(ms.contains("\"total\": \"DECIMAL(10,2)\""));
}

#[test]
fn test_scripted_sql_server_table_is_generated() {
    let dir = tempfile::tempdir().unwrap();
    write_ddl(
        dir.path(),
        "mssql",
        "SET ANSI_NULLS ON\nGO\nCREATE TABLE [dbo].[Files](\n\t[Id] [int] NOT NULL,\n\t[Data] [varbinary](max) NULL,\n CONSTRAINT [PK_Files] PRIMARY KEY CLUSTERED \n(\n\t[Id] ASC\n)WITH (PAD_INDEX = OFF) ON [PRIMARY]\n) ON [PRIMARY] TEXTIMAGE_ON [PRIMARY]\nGO\n",
    );
    fs::write(
        dir.path().join("requests.json"),
        r#"[{"folder": "mssql", "sql_file": "create.sql", "driver": "sqlserver"}]"#,
    )
    .unwrap();

    cmd()
        .current_dir(dir.path())
        .args(["requests.json", "workflow_testdata"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mappings: 2"));

    let ms = fs::read_to_string(dir.path().join("mssql/job_mappings.go")).unwrap();
    assert!(ms.contains("\"dbo.Files\": {"));
    assert!(ms.contains("\"Data\": \"varbinary(max)\""));
}

#[test]
fn test_yaml_config_and_dry_run() {
    let dir = tempfile::tempdir().unwrap();
    write_ddl(dir.path(), "mssql", "CREATE TABLE t (a INT);\n");
    fs::write(
        dir.path().join("requests.yaml"),
        "- folder: mssql\n  sql_file: create.sql\n  driver: sqlserver\n",
    )
    .unwrap();

    cmd()
        .current_dir(dir.path())
        .args(["requests.yaml", "workflow_testdata", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run completed!"));

    assert!(!dir.path().join("mssql/job_mappings.go").exists());
}

#[test]
fn test_unknown_driver_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_ddl(dir.path(), "oracle", "CREATE TABLE t (a NUMBER);\n");
    fs::write(
        dir.path().join("requests.json"),
        r#"[{"folder": "oracle", "sql_file": "create.sql", "driver": "oracle"}]"#,
    )
    .unwrap();

    cmd()
        .current_dir(dir.path())
        .args(["requests.json", "workflow_testdata"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped: oracle"));

    assert!(!dir.path().join("oracle/job_mappings.go").exists());

    cmd()
        .current_dir(dir.path())
        .args(["requests.json", "workflow_testdata", "--strict-drivers"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("1 of 1 requests failed"));
}

#[test]
fn test_failed_request_sets_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    write_ddl(dir.path(), "noschema", "CREATE TABLE t (a int);\n");
    write_ddl(dir.path(), "mssql", "CREATE TABLE t (a INT);\n");
    fs::write(
        dir.path().join("requests.json"),
        r#"[
            {"folder": "noschema", "sql_file": "create.sql", "driver": "postgres"},
            {"folder": "mssql", "sql_file": "create.sql", "driver": "sqlserver"}
        ]"#,
    )
    .unwrap();

    cmd()
        .current_dir(dir.path())
        .args(["requests.json", "workflow_testdata"])
        .assert()
        .failure()
        .code(2)
        .stdout(predicate::str::contains("Failed: noschema"));

    assert!(!dir.path().join("noschema/job_mappings.go").exists());
    assert!(dir.path().join("mssql/job_mappings.go").exists());
}

#[test]
fn test_output_json() {
    let dir = tempfile::tempdir().unwrap();
    write_ddl(dir.path(), "mssql", "CREATE TABLE t (a INT, b BIT);\n");
    fs::write(
        dir.path().join("requests.json"),
        r#"[{"folder": "mssql", "sql_file": "create.sql", "driver": "sqlserver"}]"#,
    )
    .unwrap();

    let output = cmd()
        .current_dir(dir.path())
        .args(["requests.json", "workflow_testdata", "--output-json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["mappings_written"], 2);
    assert_eq!(json["outcomes"][0]["status"], "written");
}
