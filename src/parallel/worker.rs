//! Scan workers
//!
//! A worker scans one chunk on its own thread and hands its outcome back
//! through a one-shot channel. Starting a worker goes through the
//! [`WorkerLauncher`] seam so that the coordinator can react to workers that
//! cannot be started.

use anyhow::Result;
use crossbeam_channel::{bounded, Receiver};
use std::io;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crate::scanner::{LineScanner, ScanOutcome};

use super::types::{Chunk, WorkerExit, WorkerReport};

/// Everything a worker needs to scan its chunk, owned
#[derive(Debug, Clone)]
pub struct ScanJob {
    pub scanner: LineScanner,
    pub path: PathBuf,
    pub chunk: Chunk,
}

impl ScanJob {
    pub fn new(scanner: LineScanner, path: PathBuf, chunk: Chunk) -> Self {
        Self {
            scanner,
            path,
            chunk,
        }
    }

    pub fn run(self) -> Result<ScanOutcome> {
        self.scanner
            .scan_range(&self.path, self.chunk.start, self.chunk.end)
    }
}

/// Starts workers for chunks
pub trait WorkerLauncher {
    /// Start a worker for `job`. An error means the chunk was not started
    /// and is still owned by the caller.
    fn launch(&self, job: ScanJob) -> io::Result<WorkerHandle>;

    /// Whether running workers concurrently is worthwhile here.
    fn supports_parallelism(&self) -> bool {
        num_cpus::get() > 1
    }
}

/// Launches each worker on a named OS thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadLauncher;

impl WorkerLauncher for ThreadLauncher {
    fn launch(&self, job: ScanJob) -> io::Result<WorkerHandle> {
        let chunk = job.chunk;
        let (report_sender, report_receiver) = bounded::<WorkerReport>(1);

        let thread = thread::Builder::new()
            .name(format!("scan-worker-{}", chunk.index))
            .spawn(move || {
                // Receiver is gone only if the coordinator itself bailed out
                let _ = report_sender.send(job.run());
            })?;

        Ok(WorkerHandle::new(chunk, report_receiver, Some(thread)))
    }
}

/// A started worker
#[derive(Debug)]
pub struct WorkerHandle {
    chunk: Chunk,
    report_receiver: Receiver<WorkerReport>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Wrap a report channel. `thread` is joined after the report arrives.
    pub fn new(
        chunk: Chunk,
        report_receiver: Receiver<WorkerReport>,
        thread: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            chunk,
            report_receiver,
            thread,
        }
    }

    pub fn chunk(&self) -> Chunk {
        self.chunk
    }

    /// Block until the worker reports or disappears.
    pub fn join(self) -> WorkerExit {
        let report = self.report_receiver.recv();
        let panicked = match self.thread {
            Some(thread) => thread.join().is_err(),
            None => false,
        };

        match report {
            Ok(report) => WorkerExit::Finished(report),
            Err(_) => {
                tracing::warn!(
                    chunk = self.chunk.index,
                    panicked,
                    "worker exited without reporting"
                );
                WorkerExit::Lost
            }
        }
    }
}
