//! SPI decoding from a capture: mode 0, MSB first, active-low CS.
//!
//! Data is sampled on the rising SCK edge while CS is low, using the
//! levels just before the edge. A frame starts when CS falls and ends
//! when it rises; a capture that starts with CS already low ignores that
//! partial frame because the byte alignment is unknown.

use serde::Serialize;

use super::Capture;
use crate::drivers::lsm6dso32::{read_frame, WHO_AM_I_REG};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpiChannels {
    pub cs: usize,
    pub sck: usize,
    pub mosi: usize,
    pub miso: usize,
}

/// One chip-select assertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpiFrame {
    pub start_s: f64,
    pub mosi: Vec<u8>,
    pub miso: Vec<u8>,
    /// Clock edges after the last whole byte.
    pub trailing_bits: u8,
    /// False when the capture ended with CS still asserted.
    pub terminated: bool,
}

impl SpiFrame {
    /// Register value returned when this frame is exactly the two-byte
    /// read of `reg`.
    pub fn read_value(&self, reg: u8) -> Option<u8> {
        if self.mosi == read_frame(reg) {
            self.miso.get(1).copied()
        } else {
            None
        }
    }

    /// Value returned when this frame reads `WHO_AM_I`.
    pub fn who_am_i(&self) -> Option<u8> {
        self.read_value(WHO_AM_I_REG)
    }
}

struct Shifter {
    mosi: u8,
    miso: u8,
    bits: u8,
}

pub fn decode_spi(capture: &Capture, ch: SpiChannels) -> Vec<SpiFrame> {
    let mut frames = Vec::new();
    let mut open: Option<(SpiFrame, Shifter)> = None;

    for w in capture.samples().windows(2) {
        let (prev, cur) = (&w[0], &w[1]);

        if prev.level(ch.cs) && !cur.level(ch.cs) {
            open = Some((
                SpiFrame {
                    start_s: cur.time_s,
                    mosi: Vec::new(),
                    miso: Vec::new(),
                    trailing_bits: 0,
                    terminated: false,
                },
                Shifter {
                    mosi: 0,
                    miso: 0,
                    bits: 0,
                },
            ));
            continue;
        }

        let Some((frame, shift)) = open.as_mut() else {
            continue;
        };

        if !prev.level(ch.sck) && cur.level(ch.sck) {
            shift.mosi = (shift.mosi << 1) | u8::from(prev.level(ch.mosi));
            shift.miso = (shift.miso << 1) | u8::from(prev.level(ch.miso));
            shift.bits += 1;
            if shift.bits == 8 {
                frame.mosi.push(shift.mosi);
                frame.miso.push(shift.miso);
                *shift = Shifter {
                    mosi: 0,
                    miso: 0,
                    bits: 0,
                };
            }
        }

        if cur.level(ch.cs) {
            if let Some((mut frame, shift)) = open.take() {
                frame.trailing_bits = shift.bits;
                frame.terminated = true;
                frames.push(frame);
            }
        }
    }

    if let Some((mut frame, shift)) = open {
        frame.trailing_bits = shift.bits;
        frames.push(frame);
    }
    frames
}
