// `run --dump=PATH` writes the machine state as JSON, even after a failed run.

fn read_json(path: &std::path::Path) -> String {
    std::fs::read_to_string(path).expect("dump file")
}

#[test]
fn dump_after_successful_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    assert_cmd::Command::cargo_bin("sbfi").expect("sbfi binary")
        .args(["run", "--tape-length", "3", "--input", "x"])
        .arg(format!("--dump={}", path.display()))
        .arg(",.>+")
        .assert()
        .success();

    let json = read_json(&path);
    assert!(json.contains("\"memory-size\": 3"));
    assert!(json.contains("\"memory-cursor\": 1"));
    assert!(json.contains("\"last-input-buffer\": \"x\""));
    assert!(json.contains("\"last-output-buffer\": \"x\""));
    assert!(json.contains("\"debug-mode?\": \"false\""));
    assert!(json.contains("\"address\": 2"));
}

#[test]
fn dump_after_runtime_error_keeps_partial_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    assert_cmd::Command::cargo_bin("sbfi").expect("sbfi binary")
        .args(["run", "--tape-length", "2"])
        .arg(format!("--dump={}", path.display()))
        .arg("++>+>")
        .assert()
        .failure();

    let json = read_json(&path);
    assert!(json.contains("\"instruction-ptr\": 4"));
    assert!(json.contains("\"memory-cursor\": 1"));
}

#[test]
fn dump_without_path_uses_default_name() {
    let dir = tempfile::tempdir().unwrap();

    assert_cmd::Command::cargo_bin("sbfi").expect("sbfi binary")
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .args(["run", "--tape-length", "1", "--dump", "+"])
        .assert()
        .success();

    assert!(read_json(&dir.path().join("sbfi-dump.json")).contains("\"value\": 1"));
}
