//! GPIO / peripheral pin assignments for the MIPE_EV1 and MIPE_EV2 boards.
//!
//! EV1 and EV2 share the same assignments. The firmware logs this table
//! at start-up so an RTT capture records the wiring it ran with.

use core::fmt;

/// A GPIO identified by port and pin number, e.g. `P1.05`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinId {
    pub port: u8,
    pub pin: u8,
}

impl PinId {
    pub const fn new(port: u8, pin: u8) -> Self {
        Self { port, pin }
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}.{:02}", self.port, self.pin)
    }
}

// ---------------------------------------------------------------------------
// LEDs
// ---------------------------------------------------------------------------

/// LED0: driven with the toggle phase.
pub const LED0: PinId = PinId::new(0, 0);
/// LED1: driven with the inverse of the toggle phase.
pub const LED1: PinId = PinId::new(0, 1);

// ---------------------------------------------------------------------------
// Probe / test outputs (scope and logic analyzer)
// ---------------------------------------------------------------------------

/// Copies LED0.
pub const PROBE05: PinId = PinId::new(1, 5);
/// Copies LED1.
pub const PROBE06: PinId = PinId::new(1, 6);

// ---------------------------------------------------------------------------
// SPI00 to the LSM6DSO32
// ---------------------------------------------------------------------------

pub const SPI_SCK: PinId = PinId::new(2, 1);
pub const SPI_MOSI: PinId = PinId::new(2, 2);
pub const SPI_MISO: PinId = PinId::new(2, 4);
/// Chip select, active low.
pub const SPI_CS: PinId = PinId::new(2, 5);
