//! CLI integration tests
use std::io::{Read, Write};
use std::net::TcpListener;

use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("noteify");
    cmd.env_remove("GEMINI_API_KEY").env_remove("RUST_LOG");
    cmd
}

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

/// Answer a single HTTP request with `status` and an empty JSON body.
fn serve_once(status: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 65536];
            let mut seen = Vec::new();
            while let Ok(n) = stream.read(&mut buf) {
                if n == 0 {
                    break;
                }
                seen.extend_from_slice(&buf[..n]);
                if let Some(end) = seen.windows(4).position(|w| w == b"\r\n\r\n") {
                    let headers = String::from_utf8_lossy(&seen[..end]).to_ascii_lowercase();
                    let length = headers
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if seen.len() >= end + 4 + length {
                        break;
                    }
                }
            }
            let response =
                format!("HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{{}}");
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{addr}")
}

#[test]
fn test_cli_file_input() {
    cmd()
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "<h1>Understanding Sourdough Fermentation | The Bread Journal</h1>",
        ))
        .stdout(predicate::str::contains("cookies").not())
        .stderr(predicate::str::contains("No API key configured"));
}

#[test]
fn test_cli_stdin_input() {
    let html = std::fs::read_to_string(get_fixture_path("density.html")).unwrap();
    cmd()
        .arg("-")
        .write_stdin(html)
        .assert()
        .success()
        .stdout(predicate::str::contains("<h1>Field Notes</h1>"))
        .stdout(predicate::str::contains("otter"));
}

#[test]
fn test_cli_markdown_format() {
    cmd()
        .args(["-f", "markdown", &get_fixture_path("article.html")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("+++"))
        .stdout(predicate::str::contains("## What happens inside a starter"));
}

#[test]
fn test_cli_text_format() {
    cmd()
        .args(["-f", "text", &get_fixture_path("article.html")])
        .assert()
        .success()
        .stdout(predicate::str::contains("Feeding schedule"))
        .stdout(predicate::str::contains("<p>").not());
}

#[test]
fn test_cli_json_format() {
    let output = cmd().args(["-f", "json", &get_fixture_path("article.html")]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["origin"], "unconfigured");
    assert_eq!(json["title"], "Understanding Sourdough Fermentation | The Bread Journal");
    assert!(json["source_url"].as_str().unwrap().ends_with("article.html"));
}

#[test]
fn test_cli_narration_format() {
    cmd()
        .args(["-f", "narration", &get_fixture_path("tiny.html")])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Here's a summary of the notes: Tiny Page"));
}

#[test]
fn test_cli_invalid_format() {
    cmd()
        .args(["-f", "pdf", &get_fixture_path("tiny.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid format"));
}

#[test]
fn test_cli_output_file() {
    let tmp = TempDir::new().unwrap();
    let output = tmp.path().join("notes.html");

    cmd()
        .args(["-o", output.to_str().unwrap()])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Output written to"));

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("<h2>Feeding schedule</h2>"));
}

#[test]
fn test_cli_missing_file() {
    cmd()
        .arg("../../tests/fixtures/does-not-exist.html")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read file"));
}

#[test]
fn test_cli_requires_input() {
    cmd().assert().failure();
}

#[test]
fn test_cli_quota_exhausted() {
    let tmp = TempDir::new().unwrap();
    let data_dir = tmp.path().to_str().unwrap();
    let run = || cmd().args(["--identity", "ana", "--data-dir", data_dir, &get_fixture_path("tiny.html")]).assert();

    run().success();
    run().success();
    run().failure().stderr(predicate::str::contains("Extraction limit reached for ana"));

    assert!(tmp.path().join("quota.json").exists());
}

#[test]
fn test_cli_premium_identity_is_unlimited() {
    let tmp = TempDir::new().unwrap();
    let data_dir = tmp.path().to_str().unwrap();

    for _ in 0..3 {
        cmd()
            .args(["--identity", "ben", "--premium", "--data-dir", data_dir, &get_fixture_path("tiny.html")])
            .assert()
            .success();
    }
}

#[test]
fn test_cli_premium_requires_identity() {
    cmd().args(["--premium", &get_fixture_path("tiny.html")]).assert().failure();
}

#[test]
fn test_cli_save() {
    let tmp = TempDir::new().unwrap();

    cmd()
        .args(["--save", "--data-dir", tmp.path().to_str().unwrap(), &get_fixture_path("density.html")])
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved note to"));

    let saved: Vec<_> = std::fs::read_dir(tmp.path().join("notes").join("default")).unwrap().collect();
    assert_eq!(saved.len(), 1);
}

#[test]
fn test_cli_customize_requires_key() {
    cmd()
        .args(["--customize", "make it shorter", &get_fixture_path("tiny.html")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("needs an API key"));
}

#[test]
fn test_cli_provider_failure_falls_back() {
    let provider = serve_once("500 Internal Server Error");

    cmd()
        .args(["--api-key", "test-key", "--provider-url", &provider, "--timeout", "5"])
        .arg(get_fixture_path("article.html"))
        .assert()
        .success()
        .stdout(predicate::str::contains("AI-generated notes are unavailable right now"))
        .stdout(predicate::str::contains("Yeast consumes sugars"))
        .stderr(predicate::str::contains("Rewrite provider failed"));
}

#[test]
fn test_cli_completions() {
    cmd()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("noteify"));
}
