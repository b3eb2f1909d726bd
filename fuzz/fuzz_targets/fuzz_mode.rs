//! Fuzz testing for the mode parser.
//!
//! Parsing must never panic, must only look at the first eight bytes, and
//! must round-trip through its canonical rendering.

#![no_main]

use libfuzzer_sys::fuzz_target;

use mmapio::config::{MODE_SCAN_LIMIT, MODE_TERMINATOR};
use mmapio::MapMode;

fuzz_target!(|data: &[u8]| {
    let mode = MapMode::parse_bytes(data);

    let bounded = &data[..data.len().min(MODE_SCAN_LIMIT)];
    assert_eq!(mode, MapMode::parse_bytes(bounded));

    if let Some(end) = data.iter().position(|&b| b == MODE_TERMINATOR) {
        assert_eq!(mode, MapMode::parse_bytes(&data[..end]));
    }

    assert_eq!(MapMode::parse(&mode.to_string()), mode);
});
