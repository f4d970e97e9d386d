#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use visit_tally::parallel::plan_chunks;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let workers = 1 + (data[0] % 8) as usize;
    let content = &data[1..];
    let size = content.len() as u64;

    let points = plan_chunks(&mut Cursor::new(content), size, workers, 4).unwrap();

    assert_eq!(points.first(), Some(&0));
    assert_eq!(points.last(), Some(&size));
    for pair in points.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    for &point in &points[1..points.len() - 1] {
        if point > 0 && point < size {
            assert_eq!(content[point as usize - 1], b'\n');
        }
    }
});
