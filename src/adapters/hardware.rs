//! Hardware adapter: bridges the drivers to the domain port traits.
//!
//! This is the only module that ties `embedded-hal` peripherals to the
//! service. The firmware board module hands real HAL pins and the SPI
//! device in here; tests hand in mocks.

use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::app::ports::{SensorProbePort, SignalPort};
use crate::drivers::lsm6dso32::{Lsm6dso32, WHO_AM_I_VALUE};
use crate::drivers::signals::SignalBank;
use crate::error::{Error, Result};

// ── SignalPort implementation ─────────────────────────────────

impl<L0, L1, P5, P6> SignalPort for SignalBank<L0, L1, P5, P6>
where
    L0: OutputPin,
    L1: OutputPin,
    P5: OutputPin,
    P6: OutputPin,
{
    fn all_low(&mut self) -> Result<()> {
        SignalBank::all_low(self)
    }

    fn set_phase(&mut self, phase: bool) -> Result<()> {
        self.apply(phase)
    }

    fn phase(&self) -> bool {
        SignalBank::phase(self)
    }
}

// ── SensorProbePort implementation ────────────────────────────

impl<SPI: SpiDevice> SensorProbePort for Lsm6dso32<SPI> {
    fn read_identity(&mut self) -> Result<u8> {
        self.who_am_i()
    }

    fn expected_identity(&self) -> u8 {
        WHO_AM_I_VALUE
    }
}

/// Stand-in for boards or variants without the sensor.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSensor;

impl SensorProbePort for NoSensor {
    fn read_identity(&mut self) -> Result<u8> {
        Err(Error::NoSensor)
    }

    fn expected_identity(&self) -> u8 {
        WHO_AM_I_VALUE
    }
}
