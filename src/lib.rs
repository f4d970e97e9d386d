//! Core library for visit-tally
//!
//! Counts how often each `(entity, date)` pair occurs in a file of
//! fixed-layout records and writes a JSON report of
//! `entity -> { date -> count }`.
//!
//! ```no_run
//! let stats = visit_tally::parse("visits.csv", "report.json")?;
//! println!("{}", stats.format_stats());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod config;
pub mod config_file;
pub mod parallel;
pub mod platform;
pub mod record;
pub mod report;
pub mod scanner;
pub mod stats;
pub mod table;

pub use config::{ExecutionMode, OutputStyle, TallyConfig};
pub use parallel::Coordinator;
pub use record::RecordLayout;
pub use report::Report;
pub use scanner::{LineScanner, ScanOutcome};
pub use stats::ScanStats;
pub use table::CountTable;

use anyhow::Result;
use std::path::Path;

/// Count `input` and write the report to `output` using default settings
/// (parallel above 10 MB with 2 workers).
pub fn parse(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<ScanStats> {
    run(&TallyConfig::new(input.as_ref(), output.as_ref()))
}

/// Like [`parse`], with performance, layout and output style taken from
/// `config`. The paths in `config` are ignored.
pub fn parse_with_config(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &TallyConfig,
) -> Result<ScanStats> {
    let mut config = config.clone();
    config.input.path = input.as_ref().to_path_buf();
    config.output.path = output.as_ref().to_path_buf();
    run(&config)
}

/// Count the configured input and write the report.
///
/// The report is built completely before the output file is touched; on
/// any error the output file is left as it was.
pub fn run(config: &TallyConfig) -> Result<ScanStats> {
    config.validate()?;
    let (report, stats) = tally(config)?;

    report.write_to(&config.output.path, config.output.style)?;
    tracing::info!(
        entities = report.len(),
        output = %config.output.path.display(),
        "report written"
    );

    Ok(stats)
}

/// Count the configured input and build the report without writing it.
pub fn tally(config: &TallyConfig) -> Result<(Report, ScanStats)> {
    let scanner = LineScanner::new(config.layout).with_block_size(config.performance.block_size);
    let coordinator = Coordinator::new(config.performance.parallel_config(), scanner);
    let outcome = coordinator.run(&config.input.path)?;

    if outcome.stats.malformed_lines > 0 {
        tracing::warn!(
            malformed = outcome.stats.malformed_lines,
            "skipped records without a delimiter after the header"
        );
    }

    let report = Report::from_table(&outcome.table, &config.layout);
    Ok((report, outcome.stats))
}
