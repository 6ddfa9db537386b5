mod common;

use common::{PEOPLE_CSV, TestWorkspace, csv_sqlgen};
use predicates::prelude::*;
use predicates::str::contains;

const PEOPLE_SQL: &str = "CREATE TABLE people (\n\tid INTEGER,\n\tname VARCHAR(5),\n\tcreated_at VARCHAR(19)\n);\n\
INSERT INTO people VALUES(1, 'Alice', '2024-01-01 12:00:00 +0530');\n\
INSERT INTO people VALUES(2, 'Bob', NULL);\n";

#[test]
fn convert_writes_table_named_output_next_to_cwd() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("people.csv", PEOPLE_CSV);

    csv_sqlgen()
        .current_dir(workspace.path())
        .args(["convert", "-i", input.to_str().unwrap(), "--utc-offset", "+05:30"])
        .assert()
        .success();

    assert_eq!(workspace.read("people.sql"), PEOPLE_SQL);
}

#[test]
fn convert_to_stdout_with_sqlserver_dialect() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("people.csv", PEOPLE_CSV);

    csv_sqlgen()
        .args([
            "convert",
            "-i",
            input.to_str().unwrap(),
            "-o",
            "-",
            "--dialect",
            "sqlserver",
            "--utc-offset",
            "-08:00",
            "--text-as-text",
        ])
        .assert()
        .success()
        .stdout(contains("\tname NVARCHAR(MAX),\n"))
        .stdout(contains("\tcreated_at NVARCHAR(MAX)\n"))
        .stdout(contains(
            "INSERT INTO people VALUES(1, 'Alice', '2024-01-01 12:00:00 -08:00');\n",
        ));
}

#[test]
fn table_prefix_and_options_shape_the_script() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("scores.tsv", "player.id\tscore\n7\t1.5\n8\t-2\n");
    let output = workspace.join("out.sql");

    csv_sqlgen()
        .args([
            "convert",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--table-prefix",
            "ga_",
            "--if-not-exists",
            "--truncate",
            "--utc-offset",
            "Z",
        ])
        .assert()
        .success();

    let sql = workspace.read("out.sql");
    assert_eq!(
        sql,
        "CREATE TABLE IF NOT EXISTS ga_scores (\n\tplayer_id INTEGER,\n\tscore VARCHAR(3)\n);\n\
TRUNCATE TABLE ga_scores;\n\
INSERT INTO ga_scores VALUES(7, 1.5);\n\
INSERT INTO ga_scores VALUES(8, -2);\n"
    );
}

#[test]
fn alter_mode_replaces_create_table() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("t.csv", "id,uid\n1,a1b2c3d4-e5f6-4789-a123-b1c2d3e4f5a6\n");

    csv_sqlgen()
        .args([
            "convert",
            "-i",
            input.to_str().unwrap(),
            "-o",
            "-",
            "--alter",
            "--dialect",
            "pg",
            "--utc-offset",
            "Z",
        ])
        .assert()
        .success()
        .stdout(contains("ALTER TABLE t ALTER COLUMN id TYPE INTEGER;\n"))
        .stdout(contains("ALTER TABLE t ALTER COLUMN uid TYPE UUID;\n"))
        .stdout(contains("CREATE TABLE").not());
}

#[test]
fn stdin_input_is_converted() {
    csv_sqlgen()
        .args(["convert", "-i", "-", "-o", "-", "--table", "people", "--utc-offset", "+0530"])
        .write_stdin(PEOPLE_CSV)
        .assert()
        .success()
        .stdout(PEOPLE_SQL);
}

#[test]
fn unknown_dialect_fails_without_creating_output() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("people.csv", PEOPLE_CSV);
    let output = workspace.join("people.sql");

    csv_sqlgen()
        .args([
            "convert",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--dialect",
            "oracle",
        ])
        .assert()
        .failure()
        .stderr(contains("Unknown SQL dialect 'oracle'"));

    assert!(!output.exists());
}

#[test]
fn missing_source_fails_without_creating_output() {
    let workspace = TestWorkspace::new();
    let output = workspace.join("ghost.sql");

    csv_sqlgen()
        .args([
            "convert",
            "-i",
            workspace.join("ghost.csv").to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("does not exist"));

    assert!(!output.exists());
}

#[test]
fn invalid_offset_is_rejected() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("people.csv", PEOPLE_CSV);

    csv_sqlgen()
        .args([
            "convert",
            "-i",
            input.to_str().unwrap(),
            "-o",
            "-",
            "--utc-offset",
            "+25:00",
        ])
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn legacy_encoding_is_decoded() {
    let workspace = TestWorkspace::new();
    let path = workspace.join("cafe.csv");
    let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode("name\nCaf\u{e9}\n");
    std::fs::write(&path, &bytes).expect("write input");

    csv_sqlgen()
        .args([
            "convert",
            "-i",
            path.to_str().unwrap(),
            "-o",
            "-",
            "--input-encoding",
            "windows-1252",
        ])
        .assert()
        .success()
        .stdout(contains("\tname VARCHAR(4)\n"))
        .stdout(contains("INSERT INTO cafe VALUES('Caf\u{e9}');\n"));
}

#[test]
fn empty_source_reports_cause_and_leaves_no_output() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("empty.csv", "");
    let output = workspace.join("empty.sql");

    csv_sqlgen()
        .args([
            "convert",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("Input has no header row"));

    assert!(!output.exists());
}

#[test]
fn undecodable_source_reports_cause_and_leaves_no_output() {
    let workspace = TestWorkspace::new();
    let input = workspace.join("latin.csv");
    std::fs::write(&input, b"name\nCaf\xe9\n").expect("write input");
    let output = workspace.join("latin.sql");

    csv_sqlgen()
        .args([
            "convert",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--input-encoding",
            "utf-8",
        ])
        .assert()
        .failure()
        .stderr(contains("Failed to decode row 2"))
        .stderr(contains("UTF-8"));

    assert!(!output.exists());
}
