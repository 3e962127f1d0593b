//! LSM6DSO32 accelerometer/gyroscope over SPI.
//!
//! Only the register read needed to confirm the part responds is
//! implemented. A read is a single two-byte full-duplex transfer:
//!
//! ```text
//!  MOSI:  [reg | 0x80] [0x00]
//!  MISO:  [   xx     ] [data]
//! ```
//!
//! The CS setup delay is issued inside the transaction, after the
//! device has asserted chip select and before the first clock.
//! No timeout handling and no retries: a failed transfer is reported to
//! the caller and the next poll simply tries again.

use embedded_hal::spi::{Error as _, Operation, SpiDevice};
use log::{error, info};

use crate::config::SpiSettings;
use crate::error::{Error, Result};

/// Identification register.
pub const WHO_AM_I_REG: u8 = 0x0F;
/// Value `WHO_AM_I` reads back on a genuine LSM6DSO32.
pub const WHO_AM_I_VALUE: u8 = 0x6C;
/// Set in the address byte to request a read.
pub const READ_BIT: u8 = 0x80;

/// Transmit frame for a read of `reg`.
pub const fn read_frame(reg: u8) -> [u8; 2] {
    [reg | READ_BIT, 0x00]
}

pub struct Lsm6dso32<SPI> {
    spi: SPI,
    cs_setup_ns: u32,
}

impl<SPI: SpiDevice> Lsm6dso32<SPI> {
    pub fn new(spi: SPI, settings: &SpiSettings) -> Self {
        Self {
            spi,
            cs_setup_ns: settings.cs_setup_us.saturating_mul(1_000),
        }
    }

    /// Read a single register.
    pub fn read_register(&mut self, reg: u8) -> Result<u8> {
        let mut frame = read_frame(reg);
        let result = self.spi.transaction(&mut [
            Operation::DelayNs(self.cs_setup_ns),
            Operation::TransferInPlace(&mut frame),
        ]);

        match result {
            Ok(()) => {
                let data = frame[1];
                info!("SPI read: reg=0x{:02X}, data=0x{:02X}", reg, data);
                Ok(data)
            }
            Err(e) => {
                let kind = e.kind();
                error!("SPI read failed: reg=0x{:02X} ({})", reg, kind);
                Err(Error::Spi(kind))
            }
        }
    }

    pub fn who_am_i(&mut self) -> Result<u8> {
        self.read_register(WHO_AM_I_REG)
    }

    /// Read `WHO_AM_I` and fail unless it matches [`WHO_AM_I_VALUE`].
    pub fn verify_identity(&mut self) -> Result<()> {
        let found = self.who_am_i()?;
        if found == WHO_AM_I_VALUE {
            Ok(())
        } else {
            Err(Error::IdMismatch {
                expected: WHO_AM_I_VALUE,
                found,
            })
        }
    }

    /// Give the SPI device back.
    pub fn release(self) -> SPI {
        self.spi
    }
}
