//! Command-line arguments
//!
//! Every flag has a built-in default, so config file `defaults` and later
//! flags on the command line can override one another.

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::{
    ExecutionMode, OutputStyle, DEFAULT_PARALLEL_THRESHOLD, DEFAULT_WORKERS,
};
use crate::record::{DEFAULT_DATE_LEN, DEFAULT_HEADER_LEN, DEFAULT_TRAILER_LEN};
use crate::scanner::DEFAULT_BLOCK_SIZE;

#[derive(Parser, Debug)]
#[command(name = "visit-tally")]
#[command(about = "Count per-entity, per-date occurrences in a fixed-layout record file")]
#[command(
    long_about = "Count per-entity, per-date occurrences in a fixed-layout record file\n\nEach input line is a fixed-width header, an entity id, a comma, a date token and a\nfixed-width trailer. The report maps every entity to its dates (ascending) and counts.\n\nMODES:\n  auto        Parallel for inputs above --threshold bytes on multi-core hosts (default)\n  sequential  Always a single scan\n  parallel    Always split across --workers workers\n\nEXAMPLE:\n  visit-tally visits.csv report.json --workers 4 --stats"
)]
#[command(version)]
#[command(args_override_self = true)]
pub struct Cli {
    /// Input file of fixed-layout records
    pub input: PathBuf,

    /// Output file for the JSON report (overwritten)
    pub output: PathBuf,

    /// JSON layout of the report
    #[arg(
        long = "output-style",
        value_enum,
        default_value = "pretty",
        help_heading = "Output Options"
    )]
    pub output_style: OutputStyle,

    /// Scheduling mode
    #[arg(
        long = "mode",
        value_enum,
        default_value = "auto",
        help_heading = "Performance Options"
    )]
    pub mode: ExecutionMode,

    /// Number of chunks scanned concurrently in parallel mode
    #[arg(
        short = 'w',
        long = "workers",
        default_value_t = DEFAULT_WORKERS,
        help_heading = "Performance Options"
    )]
    pub workers: usize,

    /// Input size in bytes above which auto mode goes parallel
    #[arg(
        long = "threshold",
        default_value_t = DEFAULT_PARALLEL_THRESHOLD,
        help_heading = "Performance Options"
    )]
    pub threshold: u64,

    /// Read block size in bytes per scan
    #[arg(
        long = "block-size",
        default_value_t = DEFAULT_BLOCK_SIZE,
        help_heading = "Performance Options"
    )]
    pub block_size: usize,

    /// Bytes before the entity id on every line
    #[arg(
        long = "header-len",
        default_value_t = DEFAULT_HEADER_LEN,
        help_heading = "Record Layout"
    )]
    pub header_len: usize,

    /// Bytes of the date token after the delimiter
    #[arg(
        long = "date-len",
        default_value_t = DEFAULT_DATE_LEN,
        help_heading = "Record Layout"
    )]
    pub date_len: usize,

    /// Bytes after the date token, including the newline
    #[arg(
        long = "trailer-len",
        default_value_t = DEFAULT_TRAILER_LEN,
        help_heading = "Record Layout"
    )]
    pub trailer_len: usize,

    /// Print scan statistics to stderr when done
    #[arg(short = 's', long = "stats", help_heading = "Display Options")]
    pub stats: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, help_heading = "Display Options")]
    pub verbose: u8,

    /// Use this configuration file instead of the default locations
    #[arg(long = "config-file", help_heading = "Configuration Options")]
    pub config_file: Option<String>,

    /// Do not load any configuration file
    #[arg(long = "ignore-config", help_heading = "Configuration Options")]
    pub ignore_config: bool,

    /// Show configuration file locations and active defaults, then exit
    #[arg(long = "show-config", help_heading = "Configuration Options")]
    pub show_config: bool,
}

impl Cli {
    /// Log filter directive for the requested verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
