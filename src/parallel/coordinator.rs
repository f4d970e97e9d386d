//! Scan coordinator
//!
//! Chooses between a single sequential scan and a fixed fan-out over
//! line-aligned chunks, and merges the partial tables.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::Path;
use std::time::Instant;

use crate::config::ExecutionMode;
use crate::scanner::{LineScanner, ScanOutcome};

use super::plan::{chunks_from_boundaries, plan_chunks};
use super::types::{Chunk, ParallelConfig, WorkerExit};
use super::worker::{ScanJob, ThreadLauncher, WorkerHandle, WorkerLauncher};

/// Runs scans over an input file and merges their counts
pub struct Coordinator<L = ThreadLauncher> {
    config: ParallelConfig,
    scanner: LineScanner,
    launcher: L,
}

impl Coordinator {
    pub fn new(config: ParallelConfig, scanner: LineScanner) -> Self {
        Self {
            config,
            scanner,
            launcher: ThreadLauncher,
        }
    }
}

impl<L: WorkerLauncher> Coordinator<L> {
    pub fn with_launcher<M: WorkerLauncher>(self, launcher: M) -> Coordinator<M> {
        Coordinator {
            config: self.config,
            scanner: self.scanner,
            launcher,
        }
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    /// Parallel only pays off for large inputs on hosts that can run
    /// workers concurrently, unless a mode is forced.
    pub fn should_run_parallel(&self, size: u64) -> bool {
        match self.config.mode {
            ExecutionMode::Sequential => false,
            ExecutionMode::Parallel => self.config.num_workers > 1,
            ExecutionMode::Auto => {
                size > self.config.threshold
                    && self.config.num_workers > 1
                    && self.launcher.supports_parallelism()
            }
        }
    }

    /// Scan the whole file at `path` and return the merged outcome.
    pub fn run(&self, path: &Path) -> Result<ScanOutcome> {
        let started = Instant::now();
        let size = fs::metadata(path)
            .with_context(|| format!("Failed to read metadata of input file: {}", path.display()))?
            .len();

        let mut outcome = if self.should_run_parallel(size) {
            tracing::info!(
                size,
                workers = self.config.num_workers,
                "scanning input in parallel"
            );
            self.run_parallel(path, size)?
        } else {
            tracing::info!(size, "scanning input sequentially");
            self.scanner.scan_range(path, 0, size)?
        };

        outcome.stats.processing_time = started.elapsed();
        Ok(outcome)
    }

    fn run_parallel(&self, path: &Path, size: u64) -> Result<ScanOutcome> {
        let points = {
            let mut file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            plan_chunks(
                &mut file,
                size,
                self.config.num_workers,
                self.scanner.layout().min_record_len(),
            )
            .with_context(|| format!("Failed to plan chunks for {}", path.display()))?
        };
        let chunks = chunks_from_boundaries(&points);
        tracing::debug!(?points, "planned chunk boundaries");

        let (local, remote) = match chunks.split_first() {
            Some(split) => split,
            None => return Ok(ScanOutcome::default()),
        };

        let mut handles: Vec<WorkerHandle> = Vec::with_capacity(remote.len());
        let mut deferred: Vec<Chunk> = Vec::new();

        for chunk in remote {
            let job = ScanJob::new(self.scanner.clone(), path.to_path_buf(), *chunk);
            match self.launcher.launch(job) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    tracing::warn!(
                        chunk = chunk.index,
                        error = %e,
                        "failed to start worker, chunk will be scanned after the others"
                    );
                    deferred.push(*chunk);
                }
            }
        }

        // Chunk 0 runs here while the workers scan theirs
        let local_result = self.scanner.scan_range(path, local.start, local.end);

        // Partials are folded in chunk order so keys keep first-seen order
        let mut partials: Vec<Option<ScanOutcome>> = Vec::with_capacity(chunks.len());
        partials.resize_with(chunks.len(), || None);
        let mut first_error = None;
        match local_result {
            Ok(outcome) => partials[local.index] = Some(outcome),
            Err(e) => first_error = Some(e),
        }

        // Barrier: every started worker is joined before anything else happens
        for handle in handles {
            let chunk = handle.chunk();
            match handle.join() {
                WorkerExit::Finished(Ok(outcome)) => {
                    tracing::debug!(
                        chunk = chunk.index,
                        keys = outcome.table.len(),
                        lines = outcome.stats.lines_read,
                        "worker finished"
                    );
                    partials[chunk.index] = Some(outcome);
                }
                WorkerExit::Finished(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                WorkerExit::Lost => deferred.push(chunk),
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        for chunk in deferred {
            tracing::debug!(chunk = chunk.index, "scanning deferred chunk");
            let mut outcome = self.scanner.scan_range(path, chunk.start, chunk.end)?;
            outcome.stats.deferred_chunks = 1;
            partials[chunk.index] = Some(outcome);
        }

        let mut merged = ScanOutcome::default();
        for outcome in partials.into_iter().flatten() {
            merged.merge(outcome);
        }
        Ok(merged)
    }
}
