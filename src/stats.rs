use std::time::Duration;

/// Statistics collected while scanning
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub lines_read: usize,
    pub records_counted: usize,
    pub malformed_lines: usize,
    pub bytes_scanned: u64,
    pub chunks: usize,
    pub deferred_chunks: usize,
    pub processing_time: Duration,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a worker's counters into this one.
    ///
    /// Processing time is wall-clock for the whole run and is set by the
    /// coordinator, so it is not summed here.
    pub fn merge(&mut self, other: &ScanStats) {
        self.lines_read += other.lines_read;
        self.records_counted += other.records_counted;
        self.malformed_lines += other.malformed_lines;
        self.bytes_scanned += other.bytes_scanned;
        self.chunks += other.chunks;
        self.deferred_chunks += other.deferred_chunks;
    }

    pub fn format_stats(&self) -> String {
        let mut output = format!(
            "Lines processed: {} total, {} counted, {} malformed",
            self.lines_read, self.records_counted, self.malformed_lines
        );

        if self.chunks > 1 {
            output.push_str(&format!(", {} chunks", self.chunks));
        }

        if self.deferred_chunks > 0 {
            output.push_str(&format!(" ({} run in fallback)", self.deferred_chunks));
        }

        let processing_time_ms = self.processing_time.as_millis();
        output.push_str(&format!(" in {}ms", processing_time_ms));

        if processing_time_ms > 0 && self.lines_read > 0 {
            let lines_per_sec = (self.lines_read as f64 * 1000.0) / processing_time_ms as f64;
            let mib_per_sec =
                (self.bytes_scanned as f64 / (1024.0 * 1024.0)) * 1000.0 / processing_time_ms as f64;
            output.push_str(&format!(
                " ({:.0} lines/s, {:.1} MiB/s)",
                lines_per_sec, mib_per_sec
            ));
        }

        output
    }
}
