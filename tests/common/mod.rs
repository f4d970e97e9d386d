// tests/common/mod.rs
// Shared test utilities for integration tests
#![allow(dead_code)]

use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::NamedTempFile;

/// One record in the default layout: 19-byte header, entity, comma,
/// 10-byte date, 16-byte trailer including the newline.
pub fn record(entity: &str, date: &str) -> String {
    format!("https://example.org{},{}T09:15:00+00:00\n", entity, date)
}

/// A deterministic mix of entities and dates, with a malformed line every
/// `malformed_every` records (0 disables them).
pub fn generate_records(count: usize, malformed_every: usize) -> String {
    let mut content = String::new();
    for i in 0..count {
        let entity = format!("/blog/post-{}", (i * 7) % 23);
        let date = format!("2024-{:02}-{:02}", 1 + (i % 12), 1 + (i * 3) % 28);
        content.push_str(&record(&entity, &date));
        if malformed_every > 0 && i % malformed_every == 0 {
            writeln!(content, "https://example.org/malformed-{}", i).unwrap();
        }
    }
    content
}

/// Records whose entities first appear in descending byte order, each new
/// entity every five records.
pub fn descending_records(count: usize) -> String {
    (0..count)
        .map(|i| {
            let entity = format!("/item-{:04}", 9999 - i / 5);
            record(&entity, &format!("2024-06-{:02}", 1 + i % 28))
        })
        .collect()
}

pub fn write_input(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// Run the built binary with the given arguments
pub fn run_visit_tally(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_visit-tally"))
        .args(args)
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", "/nonexistent")
        .env("HOME", "/nonexistent")
        .output()
        .expect("Failed to execute visit-tally");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

/// Run the binary on `input` writing to `output`, with extra arguments
pub fn run_on_files(input: &Path, output: &Path, extra: &[&str]) -> (String, String, i32) {
    let mut args = vec![input.to_str().unwrap(), output.to_str().unwrap()];
    args.extend_from_slice(extra);
    run_visit_tally(&args)
}

pub fn read_report(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path).expect("Failed to read report");
    serde_json::from_str(&text).expect("Report is not valid JSON")
}
