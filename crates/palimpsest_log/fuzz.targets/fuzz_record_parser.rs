#![no_main]
use libfuzzer_sys::fuzz_target;
use palimpsest_log::{Normalizer, read_records};

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must never panic
    if let Ok(records) = read_records(data) {
        // Normalizing whatever decoded must not panic either
        let _ = Normalizer::default().normalize_by_file(records);
    }
});
