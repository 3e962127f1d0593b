//! Fuzz target: `analyze` and `decode_spi`
//!
//! Any capture that parses must analyze without panicking, both with the
//! bench channel map and with every channel mapped to column 0.
//!
//! cargo fuzz run fuzz_analyze

#![no_main]

use libfuzzer_sys::fuzz_target;
use mipe_bringup::capture::{analyze, decode_spi, AnalysisConfig, Capture, ChannelMap, SpiChannels};

fuzz_target!(|data: &[u8]| {
    let Ok(capture) = Capture::from_reader(data) else {
        return;
    };

    // Rejects out-of-range channels with an error, never a panic.
    let _ = analyze(&capture, &AnalysisConfig::default());

    let zero = ChannelMap {
        cs: Some(0),
        sck: Some(0),
        mosi: Some(0),
        miso: Some(0),
        led0: Some(0),
        led1: Some(0),
        probe05: Some(0),
        probe06: Some(0),
    };
    let report = analyze(&capture, &AnalysisConfig { map: zero, ..AnalysisConfig::default() })
        .expect("column 0 always exists");
    assert_eq!(report.samples, capture.samples().len());

    if capture.channel_count() >= 4 {
        for frame in decode_spi(&capture, SpiChannels { cs: 0, sck: 1, mosi: 2, miso: 3 }) {
            assert_eq!(frame.mosi.len(), frame.miso.len());
            assert!(frame.trailing_bits < 8);
        }
    }
});
