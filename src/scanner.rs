//! Streaming key scanner
//!
//! Reads a byte range of the input in bounded blocks and counts composite
//! keys. Lines that straddle two blocks are carried over and parsed once
//! complete. Inside the run of complete lines of a block the scanner jumps
//! from one delimiter to the next record using the fixed layout stride
//! instead of looking for every newline; each jump is checked, and a record
//! that does not fit the layout is parsed as a plain line instead.

use anyhow::{Context, Result};
use memchr::{memchr, memrchr};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Instant;

use crate::record::RecordLayout;
use crate::stats::ScanStats;
use crate::table::CountTable;

/// Default read block: 8 MiB.
pub const DEFAULT_BLOCK_SIZE: usize = 8 * 1024 * 1024;

const MALFORMED_PREVIEW_LEN: usize = 64;

/// Result of scanning one byte range
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub table: CountTable,
    pub stats: ScanStats,
}

impl ScanOutcome {
    pub fn merge(&mut self, other: ScanOutcome) {
        self.table.merge(other.table);
        self.stats.merge(&other.stats);
    }
}

#[derive(Debug, Clone)]
pub struct LineScanner {
    layout: RecordLayout,
    block_size: usize,
}

impl Default for LineScanner {
    fn default() -> Self {
        Self::new(RecordLayout::default())
    }
}

impl LineScanner {
    pub fn new(layout: RecordLayout) -> Self {
        Self {
            layout,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Scan bytes `[start, end)` of the file at `path`.
    pub fn scan_range(&self, path: &Path, start: u64, end: u64) -> Result<ScanOutcome> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file: {}", path.display()))?;
        self.scan_reader(file, start, end).with_context(|| {
            format!(
                "Failed to scan bytes {}..{} of {}",
                start,
                end,
                path.display()
            )
        })
    }

    /// Scan bytes `[start, end)` of any seekable reader.
    ///
    /// A trailing fragment without a newline at `end` is parsed as a line.
    pub fn scan_reader<R: Read + Seek>(&self, mut reader: R, start: u64, end: u64) -> Result<ScanOutcome> {
        let started = Instant::now();
        let mut state = ScanState::new(self.layout, start);

        if end > start {
            reader.seek(SeekFrom::Start(start))?;
            let mut reader = reader.take(end - start);
            let capacity = usize::try_from(end - start)
                .unwrap_or(usize::MAX)
                .min(self.block_size);
            let mut block = vec![0u8; capacity];

            loop {
                let filled = fill_block(&mut reader, &mut block)?;
                if filled == 0 {
                    break;
                }
                state.stats.bytes_scanned += filled as u64;
                state.consume_block(&block[..filled]);
            }
            state.flush_carry();
        }

        let mut outcome = state.finish();
        outcome.stats.processing_time = started.elapsed();
        Ok(outcome)
    }
}

/// Read until `buf` is full or the reader is exhausted.
fn fill_block<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

struct ScanState {
    layout: RecordLayout,
    range_start: u64,
    table: CountTable,
    stats: ScanStats,
    /// Unterminated tail of the previous block
    carry: Vec<u8>,
}

impl ScanState {
    fn new(layout: RecordLayout, range_start: u64) -> Self {
        Self {
            layout,
            range_start,
            table: CountTable::new(),
            stats: ScanStats::new(),
            carry: Vec::new(),
        }
    }

    fn consume_block(&mut self, block: &[u8]) {
        let mut offset = 0;

        if !self.carry.is_empty() {
            match memchr(b'\n', block) {
                Some(nl) => {
                    self.carry.extend_from_slice(&block[..nl]);
                    self.flush_carry();
                    offset = nl + 1;
                }
                None => {
                    self.carry.extend_from_slice(block);
                    return;
                }
            }
        }

        let rest = &block[offset..];
        match memrchr(b'\n', rest) {
            Some(last_nl) => {
                self.scan_complete_lines(&rest[..=last_nl]);
                self.carry.extend_from_slice(&rest[last_nl + 1..]);
            }
            None => self.carry.extend_from_slice(rest),
        }
    }

    /// Parse the carried line, if any.
    fn flush_carry(&mut self) {
        if self.carry.is_empty() {
            return;
        }
        let line = std::mem::take(&mut self.carry);
        self.count_line(&line);
        self.carry = line;
        self.carry.clear();
    }

    /// Count keys in `region`, which ends with a newline.
    fn scan_complete_lines(&mut self, region: &[u8]) {
        let len = region.len();
        let header_len = self.layout.header_len;
        let date_len = self.layout.date_len;
        let stride = self.layout.stride_after_delimiter();

        // Last delimiter search result, reused while it is still ahead of
        // the cursor. `None` means no delimiter from `searched_from` onward.
        let mut searched_from = usize::MAX;
        let mut found: Option<usize> = None;

        let mut offset = 0;
        while offset < len {
            let search_from = offset + header_len;

            let delimiter = if search_from >= len {
                None
            } else if searched_from <= search_from
                && found.map_or(true, |pos| pos >= search_from)
            {
                found
            } else {
                searched_from = search_from;
                found = memchr(b',', &region[search_from..]).map(|pos| pos + search_from);
                found
            };

            if let Some(comma) = delimiter {
                let next = comma + stride;
                if next <= len
                    && region[next - 1] == b'\n'
                    && memchr(b'\n', &region[offset..next - 1]).is_none()
                {
                    self.table.increment(&region[search_from..comma + 1 + date_len]);
                    self.stats.lines_read += 1;
                    self.stats.records_counted += 1;
                    offset = next;
                    continue;
                }
            }

            // Off-layout record: fall back to a plain line parse and resync
            let line_end = memchr(b'\n', &region[offset..]).map_or(len - 1, |pos| pos + offset);
            self.count_line(&region[offset..line_end]);
            offset = line_end + 1;
        }
    }

    fn count_line(&mut self, line: &[u8]) {
        self.stats.lines_read += 1;
        match self.layout.extract_key(line) {
            Some(key) => {
                self.table.increment(key);
                self.stats.records_counted += 1;
            }
            None => {
                self.stats.malformed_lines += 1;
                tracing::debug!(
                    chunk_start = self.range_start,
                    line_in_chunk = self.stats.lines_read,
                    preview = %String::from_utf8_lossy(&line[..line.len().min(MALFORMED_PREVIEW_LEN)]),
                    "skipping record without delimiter after header"
                );
            }
        }
    }

    fn finish(mut self) -> ScanOutcome {
        self.stats.chunks = 1;
        ScanOutcome {
            table: self.table,
            stats: self.stats,
        }
    }
}
