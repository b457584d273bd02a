//! End-to-end tests of the `folio` binary.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const OWNER: &str = "owner@example.org";

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/folio.sqlite"

[owner]
email = "{}"
"#,
        root.display(),
        OWNER
    );

    let config_path = config_dir.join("folio.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_folio(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = env!("CARGO_BIN_EXE_folio");
    let output = Command::new(binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("FOLIO_IDENTITY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run folio binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn run_as_owner(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let mut full = vec!["--as", OWNER];
    full.extend_from_slice(args);
    run_folio(config_path, &full)
}

const ARTICLE: &str = r#"{"title":"On Buckets","authors":"Doe, J.","journal":"JACM","citations":7}"#;

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_folio(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));

    let (_, _, success) = run_folio(&config_path, &["init"]);
    assert!(success, "Second init failed (not idempotent)");
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_folio(&tmp.path().join("nope.toml"), &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_add_requires_owner() {
    let (_tmp, config_path) = setup_test_env();
    run_folio(&config_path, &["init"]);

    let (_, stderr, success) = run_folio(
        &config_path,
        &["pubs", "add", "journal-articles", "2024", "--json", ARTICLE],
    );
    assert!(!success);
    assert!(stderr.contains("forbidden"), "stderr={}", stderr);

    let (_, stderr, success) = run_folio(
        &config_path,
        &[
            "--as",
            "guest@example.org",
            "pubs",
            "add",
            "journal-articles",
            "2024",
            "--json",
            ARTICLE,
        ],
    );
    assert!(!success);
    assert!(stderr.contains("not allowed"), "stderr={}", stderr);
}

#[test]
fn test_publication_lifecycle() {
    let (_tmp, config_path) = setup_test_env();
    run_folio(&config_path, &["init"]);

    let (stdout, stderr, success) = run_as_owner(
        &config_path,
        &["pubs", "add", "journal-articles", "2023", "--json", ARTICLE],
    );
    assert!(success, "add failed: {}", stderr);
    assert!(stdout.contains("2023 at index 0"), "stdout={}", stdout);

    let moved = ARTICLE.replace("\"citations\":7", "\"citations\":7,\"year\":\"2024\"");
    let (stdout, stderr, success) = run_as_owner(
        &config_path,
        &["pubs", "update", "journal-articles", "2023", "0", "--json", &moved],
    );
    assert!(success, "update failed: {}", stderr);
    assert!(stdout.contains("Moved"), "stdout={}", stdout);

    let (stdout, _, success) =
        run_folio(&config_path, &["pubs", "list", "journal-articles", "--json"]);
    assert!(success);
    let groups: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(groups.as_array().unwrap().len(), 1);
    assert_eq!(groups[0]["year"], "2024");
    assert_eq!(groups[0]["entries"][0]["record"]["title"], "On Buckets");

    let (stdout, _, success) = run_folio(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("Citations:             7"), "stdout={}", stdout);

    let (stdout, _, success) = run_folio(&config_path, &["check"]);
    assert!(success, "check reported issues: {}", stdout);

    let (_, stderr, success) = run_as_owner(
        &config_path,
        &["pubs", "remove", "journal-articles", "2024", "0"],
    );
    assert!(success, "remove failed: {}", stderr);

    let (stdout, _, _) = run_folio(&config_path, &["pubs", "list", "journal-articles"]);
    assert!(stdout.contains("No journal articles yet."));
}

#[test]
fn test_sections_and_export() {
    let (tmp, config_path) = setup_test_env();
    run_folio(&config_path, &["init"]);

    let (_, stderr, success) = run_as_owner(
        &config_path,
        &["section", "add", "skills", "--json", r#"{"name":"Rust"}"#],
    );
    assert!(success, "section add failed: {}", stderr);

    let record = tmp.path().join("about.json");
    fs::write(&record, r#"{"paragraphs":["Hello."],"research_interests":["Storage"]}"#).unwrap();
    let (_, stderr, success) = run_as_owner(
        &config_path,
        &["profile", "set", "about", "--file", record.to_str().unwrap()],
    );
    assert!(success, "profile set failed: {}", stderr);

    let out = tmp.path().join("out/portfolio.json");
    let (_, stderr, success) =
        run_folio(&config_path, &["export", "--output", out.to_str().unwrap()]);
    assert!(success, "export failed: {}", stderr);

    let data: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(data["sections"]["skills"][0]["name"], "Rust");
    assert_eq!(data["about"]["paragraphs"][0], "Hello.");
    assert!(data["hero"].is_null());
    assert_eq!(data["stats"]["total"], 0);

    run_as_owner(
        &config_path,
        &["section", "add", "skills", "--json", r#"{"name":"Go"}"#],
    );
    let (_, stderr, success) =
        run_as_owner(&config_path, &["section", "remove", "skills", "0"]);
    assert!(success, "section remove failed: {}", stderr);

    let (stdout, _, _) = run_folio(&config_path, &["section", "list", "skills", "--json"]);
    let items: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(items.as_array().unwrap().len(), 1);
    let go = items[0].to_string();
    let (_, stderr, success) =
        run_as_owner(&config_path, &["section", "remove", "skills", "--json", &go]);
    assert!(success, "section remove by value failed: {}", stderr);
    let (stdout, _, _) = run_folio(&config_path, &["section", "list", "skills"]);
    assert!(stdout.contains("No skills yet."));
}
