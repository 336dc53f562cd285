use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn prober() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("package-prober").unwrap()
}

#[test]
fn test_list_shows_catalog() {
    prober()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("sample"))
        .stdout(predicate::str::contains("hostile"))
        .stdout(predicate::str::contains("async-sample"));
}

#[test]
fn test_list_json() {
    let output = prober().args(["--json", "list"]).output().unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["sample", "hostile", "async-sample", "opaque"]);
}

#[test]
fn test_members_is_a_dry_run() {
    prober()
        .args(["members", "sample"])
        .assert()
        .success()
        .stdout(predicate::str::contains("greet(name=\"world\")"))
        .stdout(predicate::str::contains("increment()"))
        .stdout(predicate::str::contains("[return value]").not());
}

#[test]
fn test_members_of_opaque_module_fails() {
    prober()
        .args(["members", "opaque"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("cannot enumerate members"));
}

#[test]
fn test_explore_streams_text_log_to_stdout() {
    prober()
        .args(["explore", "sample", "--timeout", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[module] sample"))
        .stdout(predicate::str::contains("[function] greet"))
        .stdout(predicate::str::contains("[return value] \"hello world\""))
        .stdout(predicate::str::contains("[investigate type] sample::Session"))
        .stdout(predicate::str::contains("[skipped members] VERSION util"));
}

#[test]
fn test_explore_hostile_succeeds_and_logs_timeouts() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("hostile.log");

    prober()
        .args(["explore", "hostile", "--timeout-ms", "300", "--log"])
        .arg(&log)
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed to import hostile.native"))
        .stderr(predicate::str::contains("panicked").not());

    let content = std::fs::read_to_string(&log).unwrap();
    assert!(content.contains("ValueError: refusing to run"));
    assert!(content.contains("Timeout: E301"));
    assert!(content.contains("Timeout: E302"));
    assert!(content.contains("SystemExit: 3"));
    // Control sequences printed by the target never reach the file.
    assert!(!content.contains('\x1b'));
    assert!(content.contains("sent 512 bytes"));
}

#[test]
fn test_explore_jsonl_log_and_json_summary() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("run.jsonl");

    let output = prober()
        .args([
            "--json",
            "explore",
            "async-sample",
            "--traversal",
            "bfs",
            "--format",
            "jsonl",
            "--log",
        ])
        .arg(&log)
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["package"], "async-sample");
    assert_eq!(summary["sessions"][0]["traversal"], "breadth_first");
    assert!(summary.get("log").is_none());

    let content = std::fs::read_to_string(&log).unwrap();
    let entries: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(entries[0]["entry"], "trace");
    assert_eq!(entries[0]["line"], "[module] async_sample");
    assert!(entries
        .iter()
        .any(|e| e["entry"] == "invocation" && e["outcome"]["type"] == "Success"));
}

#[test]
fn test_explore_import_phase_invokes_nothing() {
    prober()
        .args(["explore", "sample", "--phase", "import"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported: sample"))
        .stdout(predicate::str::contains("[function]").not());
}

#[test]
fn test_explore_unknown_version_fails() {
    prober()
        .args(["explore", "sample", "--version", "9.9.9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sample==9.9.9"));
}

#[test]
fn test_explore_missing_local_path_fails() {
    prober()
        .args(["explore", "sample", "--local", "/definitely/not/a/package"])
        .assert()
        .failure();
}

#[test]
fn test_explore_unenumerable_module_exits_non_zero() {
    prober()
        .args(["explore", "opaque"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed to enumerate members of opaque"));
}

#[test]
fn test_timeout_flags_conflict() {
    prober()
        .args(["explore", "sample", "--timeout", "1", "--timeout-ms", "10"])
        .assert()
        .failure();
}

#[test]
fn test_json_summary_rejects_inherited_output() {
    prober()
        .args(["--json", "explore", "sample", "--output", "inherit"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output inherit"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_import_single_module_file() {
    let dir = TempDir::new().unwrap();
    let module = dir.path().join("sample.src");
    std::fs::write(&module, "").unwrap();

    prober()
        .args(["explore", "--phase", "import", "--local"])
        .arg(&module)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported: sample"))
        .stdout(predicate::str::contains("[function]").not());

    let missing = dir.path().join("left_pad.src");
    std::fs::write(&missing, "").unwrap();
    prober()
        .args(["explore", "--phase", "import", "--local"])
        .arg(&missing)
        .assert()
        .success()
        .stdout(predicate::str::contains("No module named 'left_pad'"));
}

#[test]
fn test_package_name_required_outside_single_module_import() {
    let dir = TempDir::new().unwrap();
    let module = dir.path().join("sample.src");
    std::fs::write(&module, "").unwrap();

    prober()
        .args(["explore", "--local"])
        .arg(&module)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--phase import --local FILE"));
    prober()
        .args(["explore", "--phase", "import"])
        .assert()
        .failure();
}
