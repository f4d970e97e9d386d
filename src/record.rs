//! Fixed record layout
//!
//! Every input line has the shape
//!
//! ```text
//! [header: 19 bytes][entity id: variable],[date: 10 bytes][trailer: 16 bytes incl. '\n']
//! ```
//!
//! The header and trailer are opaque. Only the entity id and the date token
//! are kept, stored together as a composite key `entity,date`.

use std::ops::Range;

use memchr::memchr;

pub const DEFAULT_HEADER_LEN: usize = 19;
pub const DEFAULT_DATE_LEN: usize = 10;
pub const DEFAULT_TRAILER_LEN: usize = 16;

/// Byte widths of the fixed parts of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    pub header_len: usize,
    pub date_len: usize,
    /// Bytes after the date token up to and including the line terminator.
    pub trailer_len: usize,
}

impl Default for RecordLayout {
    fn default() -> Self {
        Self {
            header_len: DEFAULT_HEADER_LEN,
            date_len: DEFAULT_DATE_LEN,
            trailer_len: DEFAULT_TRAILER_LEN,
        }
    }
}

impl RecordLayout {
    /// Smallest well-formed record: header, empty entity id, comma, date, trailer.
    pub fn min_record_len(&self) -> usize {
        self.header_len + 1 + self.date_len + self.trailer_len
    }

    /// Distance from a record's delimiter to the start of the next record.
    pub fn stride_after_delimiter(&self) -> usize {
        1 + self.date_len + self.trailer_len
    }

    /// Locate the delimiter of a single line (no terminator), searching from
    /// the end of the header.
    pub fn find_delimiter(&self, line: &[u8]) -> Option<usize> {
        if line.len() <= self.header_len {
            return None;
        }
        memchr(b',', &line[self.header_len..]).map(|pos| pos + self.header_len)
    }

    /// Span of the composite key inside `line` given the delimiter position.
    ///
    /// The end is clamped to the line, so a truncated date token yields a
    /// shorter key instead of reading into the next record.
    pub fn key_span(&self, line_len: usize, delimiter: usize) -> Range<usize> {
        let end = (delimiter + 1 + self.date_len).min(line_len);
        self.header_len..end
    }

    /// Composite key of one line, or `None` when the line has no delimiter
    /// after the header.
    pub fn extract_key<'a>(&self, line: &'a [u8]) -> Option<&'a [u8]> {
        let delimiter = self.find_delimiter(line)?;
        Some(&line[self.key_span(line.len(), delimiter)])
    }

    /// Split a composite key into `(entity, date)`.
    ///
    /// Relies on the delimiter sitting exactly `date_len` bytes before the
    /// end of the key. Keys too short to hold a delimiter and a date are
    /// returned as an entity with an empty date.
    pub fn split_key<'a>(&self, key: &'a [u8]) -> (&'a [u8], &'a [u8]) {
        if key.len() < self.date_len + 1 {
            return (key, &[]);
        }
        let date_start = key.len() - self.date_len;
        (&key[..date_start - 1], &key[date_start..])
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.date_len == 0 {
            anyhow::bail!("date length must be at least 1 byte");
        }
        if self.trailer_len == 0 {
            anyhow::bail!("trailer length must be at least 1 byte (the line terminator)");
        }
        Ok(())
    }
}
