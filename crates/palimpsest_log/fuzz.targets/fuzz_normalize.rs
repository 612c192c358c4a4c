#![no_main]
use libfuzzer_sys::fuzz_target;
use palimpsest_log::{MergeCompositionArtifacts, NormalizePass, OperationRecord};

fuzz_target!(|input: Vec<(u8, u8, String, String)>| {
    let records: Vec<OperationRecord> = input
        .into_iter()
        .enumerate()
        .map(|(i, (start, _, inserted, deleted))| {
            OperationRecord::edit(i as u64, i as u64, "f.rs", start as usize, inserted, deleted)
        })
        .collect();
    let before = records.len();
    let after = MergeCompositionArtifacts.apply(records);
    assert!(after.len() <= before);
});
