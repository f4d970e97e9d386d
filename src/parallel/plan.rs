//! Chunk planning
//!
//! Splits an input of `size` bytes into line-aligned byte ranges, one per
//! worker.

use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};

use super::types::Chunk;

const PLAN_READ_BUFFER: usize = 64 * 1024;

/// Compute `workers + 1` boundaries `[0, p1, ..., size]`.
///
/// Every internal boundary sits right after a newline (or at `size`), so no
/// record is split between two ranges. Ranges can be empty when two ideal
/// split points fall inside the same line. Inputs smaller than `workers`
/// minimal records are not split at all.
pub fn plan_chunks<R: Read + Seek>(
    reader: &mut R,
    size: u64,
    workers: usize,
    min_record_len: usize,
) -> io::Result<Vec<u64>> {
    let min_split_size = (min_record_len.max(1) as u64).saturating_mul(workers as u64);
    if workers <= 1 || size < min_split_size {
        return Ok(vec![0, size]);
    }

    let mut reader = BufReader::with_capacity(PLAN_READ_BUFFER, reader);
    let mut scratch = Vec::new();
    let mut points = Vec::with_capacity(workers + 1);
    points.push(0u64);
    let mut previous = 0u64;

    for i in 1..workers {
        let ideal = (size as u128 * i as u128 / workers as u128) as u64;
        let boundary = if ideal <= previous {
            previous
        } else {
            next_line_start(&mut reader, ideal, size, &mut scratch)?.max(previous)
        };
        points.push(boundary);
        previous = boundary;
    }

    points.push(size);
    Ok(points)
}

/// Start of the first line beginning at or after `ideal`.
///
/// Reading starts one byte early so that an `ideal` already sitting right
/// after a newline is kept as is.
fn next_line_start<R: Read + Seek>(
    reader: &mut BufReader<R>,
    ideal: u64,
    size: u64,
    scratch: &mut Vec<u8>,
) -> io::Result<u64> {
    let probe = ideal - 1;
    reader.seek(SeekFrom::Start(probe))?;
    scratch.clear();
    let consumed = reader.read_until(b'\n', scratch)?;
    Ok((probe + consumed as u64).min(size))
}

/// Turn boundary offsets into consecutive chunks.
pub fn chunks_from_boundaries(points: &[u64]) -> Vec<Chunk> {
    points
        .windows(2)
        .enumerate()
        .map(|(index, pair)| Chunk {
            index,
            start: pair[0],
            end: pair[1],
        })
        .collect()
}
