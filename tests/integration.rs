use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn dq_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("dq");
    path
}

/// Temp workspace with a docs tree and a config whose embedding provider
/// is never reachable, so only paths that stop before embedding succeed.
fn setup_test_env(extra_config: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let docs = root.join("checkout/docs");
    fs::create_dir_all(docs.join("user-guide")).unwrap();
    fs::write(
        docs.join("index.md"),
        "# MkDocs\n\nProject documentation with **Markdown**.\n\nRun `mkdocs serve` to preview.",
    )
    .unwrap();
    fs::write(
        docs.join("user-guide/configuration.md"),
        "# Configuration\n\nThe `mkdocs.yml` file holds `site_name` and `nav`.\n\n```yaml\nsite_name: Demo\n```",
    )
    .unwrap();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_content = format!(
        r#"[source]
local_path = "{root}/checkout"

[store]
persist_dir = "{root}/store"
reingest = "replace"

[embedding]
provider = "ollama"
model = "nomic-embed-text"
dims = 8
url = "http://127.0.0.1:9"
max_retries = 0

[completion]
api_key_env = "DQ_TEST_UNSET_API_KEY"
{extra}"#,
        root = root.display(),
        extra = extra_config
    );

    let config_path = config_dir.join("dq.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_dq(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = dq_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("DQ_TEST_UNSET_API_KEY")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run dq binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_init_creates_store() {
    let (tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run_dq(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Store initialized"));
    assert!(tmp.path().join("store/collections.sqlite").exists());
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env("");
    assert!(run_dq(&config_path, &["init"]).2, "first init failed");
    assert!(run_dq(&config_path, &["init"]).2, "second init failed");
}

#[test]
fn test_ingest_dry_run_counts_without_embedding() {
    let (tmp, config_path) = setup_test_env("");

    let (stdout, stderr, success) = run_dq(&config_path, &["ingest", "--dry-run"]);
    assert!(success, "dry-run failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("(dry-run)"));
    assert!(stdout.contains("files found: 2"));
    assert!(stdout.contains("chunks: 2"));
    assert!(!tmp.path().join("store/collections.sqlite").exists());
}

#[test]
fn test_ingest_local_path_flag_overrides_config() {
    let (tmp, config_path) = setup_test_env("");
    let other = tmp.path().join("other/docs");
    fs::create_dir_all(&other).unwrap();
    fs::write(other.join("only.md"), "just one file").unwrap();

    let local = tmp.path().join("other");
    let (stdout, _, success) = run_dq(
        &config_path,
        &["ingest", "--dry-run", "--local-path", local.to_str().unwrap()],
    );
    assert!(success);
    assert!(stdout.contains("files found: 1"));
}

#[test]
fn test_overlap_equal_to_chunk_size_is_config_error() {
    let (_tmp, config_path) = setup_test_env("\n[chunking]\nchunk_size = 50\noverlap = 50\n");

    let (_, stderr, success) = run_dq(&config_path, &["ingest", "--dry-run"]);
    assert!(!success);
    assert!(stderr.contains("overlap (50) must be smaller than chunk_size (50)"), "stderr={}", stderr);
}

#[test]
fn test_missing_reingest_policy_is_config_error() {
    let (tmp, config_path) = setup_test_env("");
    let content = fs::read_to_string(&config_path)
        .unwrap()
        .replace("reingest = \"replace\"\n", "");
    fs::write(&config_path, content).unwrap();

    let (_, stderr, success) = run_dq(&config_path, &["ingest", "--dry-run"]);
    assert!(!success);
    assert!(stderr.contains("reingest"), "stderr={}", stderr);
    assert!(!tmp.path().join("store").exists());
}

#[test]
fn test_missing_docs_dir_fails_before_processing() {
    let (_tmp, config_path) = setup_test_env("");
    let content = fs::read_to_string(&config_path).unwrap().replace(
        "[store]",
        "docs_path = \"documentation\"\n\n[store]",
    );
    fs::write(&config_path, content).unwrap();

    let (_, stderr, success) = run_dq(&config_path, &["ingest", "--dry-run"]);
    assert!(!success);
    assert!(stderr.contains("documentation directory not found"), "stderr={}", stderr);
}

#[test]
fn test_retrieve_before_ingest_reports_missing_collection() {
    let (_tmp, config_path) = setup_test_env("");

    let (_, stderr, success) = run_dq(&config_path, &["retrieve", "how to deploy"]);
    assert!(!success);
    assert!(stderr.contains("collection 'mkdocs' does not exist"), "stderr={}", stderr);
}

#[test]
fn test_retrieve_empty_query() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, _, success) = run_dq(&config_path, &["retrieve", "   "]);
    assert!(success);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_ask_without_api_key_fails() {
    let (_tmp, config_path) = setup_test_env("");

    let (_, stderr, success) = run_dq(&config_path, &["ask", "What is nav?"]);
    assert!(!success);
    assert!(stderr.contains("DQ_TEST_UNSET_API_KEY"), "stderr={}", stderr);
}

#[test]
fn test_stats_on_empty_store() {
    let (_tmp, config_path) = setup_test_env("");

    let (stdout, _, success) = run_dq(&config_path, &["stats"]);
    assert!(success);
    assert!(stdout.contains("No collections yet"));
}
