use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

use crate::parallel::ParallelConfig;
use crate::record::RecordLayout;
use crate::scanner::DEFAULT_BLOCK_SIZE;

pub const DEFAULT_PARALLEL_THRESHOLD: u64 = 10_000_000;
pub const DEFAULT_WORKERS: usize = 2;
pub const MAX_WORKERS: usize = 64;

/// Main configuration struct for a tally run
#[derive(Debug, Clone)]
pub struct TallyConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub performance: PerformanceConfig,
    pub layout: RecordLayout,
}

/// Input configuration
#[derive(Debug, Clone)]
pub struct InputConfig {
    pub path: PathBuf,
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub style: OutputStyle,
}

/// Performance configuration
#[derive(Debug, Clone)]
pub struct PerformanceConfig {
    pub mode: ExecutionMode,
    pub workers: usize,
    pub threshold: u64,
    pub block_size: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Auto,
            workers: DEFAULT_WORKERS,
            threshold: DEFAULT_PARALLEL_THRESHOLD,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl PerformanceConfig {
    pub fn parallel_config(&self) -> ParallelConfig {
        ParallelConfig {
            num_workers: self.workers,
            threshold: self.threshold,
            mode: self.mode.clone(),
        }
    }
}

/// How the scan is scheduled
#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Parallel for inputs above the threshold on multi-core hosts
    #[default]
    Auto,
    Sequential,
    Parallel,
}

/// JSON layout of the report
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputStyle {
    /// Indented, one field per line
    #[default]
    Pretty,
    /// Single line
    Compact,
}

impl TallyConfig {
    /// Defaults for everything except the paths
    pub fn new(input: &Path, output: &Path) -> Self {
        Self {
            input: InputConfig {
                path: input.to_path_buf(),
            },
            output: OutputConfig {
                path: output.to_path_buf(),
                style: OutputStyle::default(),
            },
            performance: PerformanceConfig::default(),
            layout: RecordLayout::default(),
        }
    }

    /// Create configuration from CLI arguments
    pub fn from_cli(cli: &crate::cli::Cli) -> Self {
        Self {
            input: InputConfig {
                path: cli.input.clone(),
            },
            output: OutputConfig {
                path: cli.output.clone(),
                style: cli.output_style,
            },
            performance: PerformanceConfig {
                mode: cli.mode.clone(),
                workers: cli.workers,
                threshold: cli.threshold,
                block_size: cli.block_size,
            },
            layout: RecordLayout {
                header_len: cli.header_len,
                date_len: cli.date_len,
                trailer_len: cli.trailer_len,
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.performance.workers == 0 {
            bail!("--workers must be at least 1");
        }
        if self.performance.workers > MAX_WORKERS {
            bail!(
                "--workers must be at most {} (got {})",
                MAX_WORKERS,
                self.performance.workers
            );
        }
        if self.performance.block_size == 0 {
            bail!("--block-size must be at least 1 byte");
        }
        self.layout.validate()?;
        if self.input.path == self.output.path {
            bail!(
                "input and output must be different files: {}",
                self.input.path.display()
            );
        }
        Ok(())
    }
}
