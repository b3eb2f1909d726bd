//! Fuzz testing for alignment correction.
//!
//! For any offset, size and granularity the corrected request must start on
//! a granularity boundary, cover the requested bytes, and never wrap.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use mmapio::storage::Alignment;

#[derive(Debug, Arbitrary)]
struct AlignmentInput {
    offset: u64,
    size: usize,
    granularity_log2: u8,
    unknown_granularity: bool,
}

fuzz_target!(|input: AlignmentInput| {
    let granularity = if input.unknown_granularity {
        0
    } else {
        1usize << (input.granularity_log2 % 24)
    };

    match Alignment::compute(input.offset, input.size, granularity) {
        Ok(a) => {
            assert_eq!(a.offset + a.shift as u64, input.offset);
            assert_eq!(a.visible(), input.size);
            if granularity != 0 {
                assert_eq!(a.offset % granularity as u64, 0);
                assert!(a.shift < granularity);
            } else {
                assert_eq!(a.shift, 0);
            }
        }
        Err(_) => {
            let shift = (input.offset % granularity.max(1) as u64) as usize;
            assert!(input.size.checked_add(shift).is_none());
        }
    }
});
