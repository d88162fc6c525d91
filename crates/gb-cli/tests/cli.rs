use std::fs;
use std::process::Command;

fn gb_cli() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gb-cli"))
}

#[test]
fn test_init_config_writes_template() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.json");

    let output = gb_cli()
        .args(["init-config", "--output"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let config: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(config["sheets_dir"], "original_sheets");
    assert_eq!(config["bibliographies"].as_array().unwrap().len(), 3);
}

#[test]
fn test_missing_config_exits_with_error() {
    let dir = tempfile::tempdir().unwrap();

    let output = gb_cli()
        .args(["create", "--config"])
        .arg(dir.path().join("missing.json"))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: failed to read file"));
}

#[test]
fn test_sync_doc_without_tracking_doc() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("sheets")).unwrap();
    fs::write(dir.path().join("languoids.json"), "[]").unwrap();
    fs::write(
        dir.path().join("run.json"),
        r#"{"sheets_dir": "sheets", "bibliographies": [], "languoids": "languoids.json",
            "features": "features.json", "output_dir": "cldf"}"#,
    )
    .unwrap();

    let output = gb_cli()
        .args(["sync-doc", "--config"])
        .arg(dir.path().join("run.json"))
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No tracking document configured."));
}
