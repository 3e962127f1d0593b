//! Fuzz target: `Capture::from_reader`
//!
//! Feeds arbitrary bytes to the CSV capture parser. A parsed capture
//! must be non-empty, time-ordered and fit the bit-packed level word.
//!
//! cargo fuzz run fuzz_capture_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use mipe_bringup::capture::{Capture, MAX_CHANNELS};

fuzz_target!(|data: &[u8]| {
    let Ok(capture) = Capture::from_reader(data) else {
        return;
    };

    assert!(!capture.samples().is_empty(), "parsed capture has no rows");
    assert!(capture.channel_count() <= MAX_CHANNELS);
    assert!(
        capture.samples().windows(2).all(|w| w[0].time_s <= w[1].time_s),
        "rows out of time order"
    );
    assert!(capture.duration_s() >= 0.0);
    for ch in 0..capture.channel_count() {
        assert!(capture.edges(ch).len() < capture.samples().len());
    }
});
