//! Unified error type for the bring-up library.
//!
//! Every fallible operation funnels into [`Error`]. All variants are
//! `Copy` so they can be carried through events and probe history
//! without allocation.

use core::fmt;

use embedded_hal::spi::ErrorKind as SpiErrorKind;

/// Every fallible operation in the library funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The SPI transaction itself failed.
    Spi(SpiErrorKind),
    /// A GPIO output could not be driven.
    Gpio,
    /// The device answered, but with the wrong identification byte.
    IdMismatch { expected: u8, found: u8 },
    /// No sensor is fitted for this program variant.
    NoSensor,
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi(kind) => write!(f, "spi: {kind}"),
            Self::Gpio => write!(f, "gpio write failed"),
            Self::IdMismatch { expected, found } => {
                write!(f, "id mismatch: expected 0x{expected:02X}, found 0x{found:02X}")
            }
            Self::NoSensor => write!(f, "no sensor fitted"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<SpiErrorKind> for Error {
    fn from(kind: SpiErrorKind) -> Self {
        Self::Spi(kind)
    }
}

/// Library-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
