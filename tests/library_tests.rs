mod common;
use common::*;
use std::fs;
use std::io::{self, Cursor};
use std::path::Path;

use proptest::prelude::*;
use tempfile::TempDir;
use visit_tally::parallel::{plan_chunks, ParallelConfig, ScanJob, WorkerHandle, WorkerLauncher};
use visit_tally::{
    Coordinator, ExecutionMode, LineScanner, OutputStyle, RecordLayout, Report, TallyConfig,
};

/// Refuses to start any worker, as if thread creation were exhausted
struct RefusingLauncher;

impl WorkerLauncher for RefusingLauncher {
    fn launch(&self, _job: ScanJob) -> io::Result<WorkerHandle> {
        Err(io::Error::new(io::ErrorKind::Other, "no threads left"))
    }

    fn supports_parallelism(&self) -> bool {
        true
    }
}

fn forced(workers: usize) -> ParallelConfig {
    ParallelConfig {
        num_workers: workers,
        mode: ExecutionMode::Parallel,
        ..ParallelConfig::default()
    }
}

fn sequential() -> ParallelConfig {
    ParallelConfig {
        mode: ExecutionMode::Sequential,
        ..ParallelConfig::default()
    }
}

fn report_for(path: &Path, config: ParallelConfig) -> Report {
    let outcome = Coordinator::new(config, LineScanner::default())
        .run(path)
        .unwrap();
    Report::from_table(&outcome.table, &RecordLayout::default())
}

/// Serialized report, so entity order is compared too
fn json_for(report: &Report) -> Vec<u8> {
    report.to_json(OutputStyle::Pretty).unwrap()
}

#[test]
fn test_parse_writes_nested_report() {
    let input = write_input(
        &[
            record("/user42", "2024-01-01"),
            record("/user42", "2024-01-02"),
            record("/user42", "2024-01-01"),
        ]
        .concat(),
    );
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("report.json");

    let stats = visit_tally::parse(input.path(), &output).unwrap();

    assert_eq!(stats.lines_read, 3);
    assert_eq!(stats.records_counted, 3);
    assert_eq!(stats.malformed_lines, 0);
    assert_eq!(
        read_report(&output),
        serde_json::json!({ "/user42": { "2024-01-01": 2, "2024-01-02": 1 } })
    );
}

#[test]
fn test_parse_is_idempotent() {
    let input = write_input(&generate_records(500, 41));
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("report.json");

    visit_tally::parse(input.path(), &output).unwrap();
    let first = fs::read(&output).unwrap();
    visit_tally::parse(input.path(), &output).unwrap();

    assert_eq!(fs::read(&output).unwrap(), first);
}

#[test]
fn test_small_input_matches_forced_parallel() {
    let input = write_input(&generate_records(400, 0));

    let auto = report_for(input.path(), ParallelConfig::default());
    let parallel = report_for(input.path(), forced(2));

    assert_eq!(json_for(&auto), json_for(&parallel));
    assert_eq!(auto.total(), 400);
}

#[test]
fn test_split_on_line_start_keeps_both_records() {
    // Two 48-byte records; the ideal split for two workers is exactly byte 48
    let content = [record("/abc", "2024-05-01"), record("/abc", "2024-05-02")].concat();
    assert_eq!(content.len(), 96);
    let input = write_input(&content);

    let mut cursor = Cursor::new(content.as_bytes());
    let points = plan_chunks(&mut cursor, 96, 2, RecordLayout::default().min_record_len()).unwrap();
    assert_eq!(points, vec![0, 48, 96]);

    let report = report_for(input.path(), forced(2));
    let dates = report.entity("/abc").unwrap();
    assert_eq!(dates.get("2024-05-01"), Some(&1));
    assert_eq!(dates.get("2024-05-02"), Some(&1));
    assert_eq!(report.total(), 2);
}

#[test]
fn test_refused_workers_fall_back_to_local_scan() {
    let input = write_input(&[generate_records(300, 53), descending_records(300)].concat());
    let expected = report_for(input.path(), sequential());

    let outcome = Coordinator::new(forced(4), LineScanner::default())
        .with_launcher(RefusingLauncher)
        .run(input.path())
        .unwrap();

    assert_eq!(outcome.stats.deferred_chunks, 3);
    assert_eq!(outcome.stats.chunks, 4);
    let report = Report::from_table(&outcome.table, &RecordLayout::default());
    assert_eq!(json_for(&report), json_for(&expected));
}

#[test]
fn test_worker_counts_write_identical_json() {
    let input = write_input(&[descending_records(250), generate_records(250, 31)].concat());
    let expected = json_for(&report_for(input.path(), sequential()));
    assert!(String::from_utf8_lossy(&expected).starts_with("{\n    \"/item-9999\""));

    for workers in [1, 2, 3, 5] {
        let report = report_for(input.path(), forced(workers));
        assert_eq!(json_for(&report), expected, "workers = {}", workers);
    }
}

#[test]
fn test_malformed_lines_are_reported_in_stats() {
    let content = [
        record("/a", "2024-01-01"),
        "https://example.org/broken\n".to_string(),
        "short\n".to_string(),
        record("/b", "2024-01-01"),
    ]
    .concat();
    let input = write_input(&content);
    let dir = TempDir::new().unwrap();
    let config = TallyConfig::new(input.path(), &dir.path().join("out.json"));

    let (report, stats) = visit_tally::tally(&config).unwrap();

    assert_eq!(stats.lines_read, 4);
    assert_eq!(stats.records_counted, 2);
    assert_eq!(stats.malformed_lines, 2);
    assert_eq!(report.len(), 2);
}

#[test]
fn test_run_rejects_invalid_config_before_writing() {
    let input = write_input(&record("/a", "2024-01-01"));
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");
    let mut config = TallyConfig::new(input.path(), &output);
    config.performance.workers = 0;

    assert!(visit_tally::run(&config).is_err());
    assert!(!output.exists());
}

#[test]
fn test_run_with_custom_layout_and_compact_output() {
    // 4-byte header, 8-byte date, 2-byte trailer
    let input = write_input("abcd/x,20240101zz\nabcd/x,20240101zz\nabcd/y,20240102zz\n");
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");
    let mut config = TallyConfig::new(input.path(), &output);
    config.layout = RecordLayout {
        header_len: 4,
        date_len: 8,
        trailer_len: 3,
    };
    config.output.style = OutputStyle::Compact;

    visit_tally::run(&config).unwrap();

    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        r#"{"/x":{"20240101":2},"/y":{"20240102":1}}"#
    );
}

#[test]
fn test_parse_with_config_uses_given_paths() {
    let input = write_input(&generate_records(300, 0));
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.json");
    let mut config = TallyConfig::new(Path::new("ignored.csv"), Path::new("ignored.json"));
    config.performance.mode = ExecutionMode::Parallel;
    config.performance.workers = 3;
    config.output.style = OutputStyle::Compact;

    let stats = visit_tally::parse_with_config(input.path(), &output, &config).unwrap();

    assert_eq!(stats.records_counted, 300);
    assert_eq!(stats.chunks, 3);
    assert!(!fs::read_to_string(&output).unwrap().contains('\n'));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_worker_count_does_not_change_report(
        entries in prop::collection::vec((0usize..6, 1u32..29, any::<bool>()), 1..120),
        workers in prop::sample::select(vec![1usize, 2, 3, 5]),
    ) {
        let mut content = String::new();
        for (entity, day, malformed) in &entries {
            if *malformed {
                content.push_str(&format!("https://example.org/bad{}\n", entity));
            } else {
                content.push_str(&record(&format!("/e{}", entity), &format!("2024-02-{:02}", day)));
            }
        }
        let input = write_input(&content);

        let expected = report_for(input.path(), sequential());
        let parallel = report_for(input.path(), forced(workers));

        prop_assert_eq!(json_for(&expected), json_for(&parallel));
    }
}
