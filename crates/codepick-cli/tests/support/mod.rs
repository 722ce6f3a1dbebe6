#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

pub fn new_command_with_temp_home() -> (Command, tempfile::TempDir) {
    let temp_home = tempfile::tempdir().expect("temp home");
    let binary = assert_cmd::cargo::cargo_bin!("codepick");
    let mut command = Command::new(binary);
    command.env("HOME", temp_home.path());
    command.env("XDG_CONFIG_HOME", temp_home.path().join(".config"));
    command.env_remove("RUST_LOG");
    (command, temp_home)
}

pub fn write_catalog(home: &Path) -> PathBuf {
    let path = home.join("catalog.jsonl");
    fs::write(
        &path,
        concat!(
            "{\"code\": \"A1\", \"name\": \"Visit\", \"description\": \"Short office visit\"}\n",
            "{\"code\": \"A10\", \"name\": \"Long visit\"}\n",
            "{\"code\": 9543, \"name\": \"Signal exam\", \"description\": \"ECG reading\"}\n",
        ),
    )
    .expect("write catalog");
    path
}

/// Writes a config with a file catalog and an engine URL nothing listens on.
/// `submit` is appended verbatim as the `[submit]` table body.
pub fn write_config(home: &Path, submit: &str) {
    let catalog = write_catalog(home);
    let config_dir = home.join(".config").join("codepick");
    fs::create_dir_all(&config_dir).expect("create config dir");
    fs::write(
        config_dir.join("config.toml"),
        format!(
            r#"
version = 1

[engine]
url = "http://127.0.0.1:9/generate"
timeout_secs = 5

[catalog]
source = "file"
path = "{}"

[submit]
{submit}
"#,
            catalog.display()
        ),
    )
    .expect("write config");
}

pub fn write_valid_config(home: &Path) {
    write_config(home, "sink = \"log\"");
}

pub fn write_report(home: &Path, text: &str) -> PathBuf {
    let path = home.join("report.txt");
    fs::write(&path, text).expect("write report");
    path
}

pub fn assert_timestamp_log_names(entries: &[std::fs::DirEntry]) {
    assert!(!entries.is_empty(), "expected at least one diagnostics log");

    for entry in entries {
        let name = entry
            .file_name()
            .into_string()
            .expect("diagnostics filename utf8");
        let stem = name
            .strip_suffix(".log")
            .unwrap_or_else(|| panic!("diagnostics file should end with .log: {name}"));
        assert!(
            !stem.is_empty() && stem.chars().all(|character| character.is_ascii_digit()),
            "diagnostics filename must be <timestamp>.log, got: {name}"
        );
    }
}
