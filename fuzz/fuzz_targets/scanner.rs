#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use visit_tally::{CountTable, LineScanner, RecordLayout};

const MAX_INPUT_LEN: usize = 64 * 1024;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 || data.len() > MAX_INPUT_LEN {
        return;
    }

    // First byte picks the block size so carry handling gets exercised
    let block_size = 1 + data[0] as usize;
    let content = &data[1..];
    let layout = RecordLayout::default();

    let outcome = LineScanner::new(layout)
        .with_block_size(block_size)
        .scan_reader(Cursor::new(content), 0, content.len() as u64)
        .unwrap();

    let mut expected = CountTable::new();
    let mut lines = 0u64;
    for line in content.split_inclusive(|&b| b == b'\n') {
        let line = line.strip_suffix(b"\n").unwrap_or(line);
        lines += 1;
        if let Some(key) = layout.extract_key(line) {
            expected.increment(key);
        }
    }

    assert_eq!(outcome.stats.lines_read, lines);
    assert_eq!(outcome.table, expected);
});
