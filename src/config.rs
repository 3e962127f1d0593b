//! Bring-up configuration.
//!
//! One preset per program variant, carrying the timing constants that
//! were proven on the bench. Presets can be serialised for inspection
//! and overridden from a JSON file on the host.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which bring-up program is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "host", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// MIPE_EV1: sleep-paced toggling plus periodic LSM6DSO32 probe.
    Ev1SpiTest,
    /// MIPE_EV1: busy-wait toggling, no SPI.
    Ev1Timer,
    /// MIPE_EV2: busy-wait toggling, no SPI.
    Ev2GpioTest,
}

impl Variant {
    pub const fn board(self) -> &'static str {
        match self {
            Self::Ev1SpiTest | Self::Ev1Timer => "MIPE_EV1",
            Self::Ev2GpioTest => "MIPE_EV2",
        }
    }
}

/// How the loop waits between toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pacing {
    /// Block on the delay provider for a fixed duration.
    Sleep { interval_ms: u32 },
    /// Spin a counter; the interval is whatever `threshold` iterations take.
    BusyWait { threshold: u32 },
}

/// Rapid toggling that acknowledges a good identification read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashConfig {
    /// Number of phase inversions. Must be even so the phase is restored.
    pub toggles: u8,
    pub interval_ms: u32,
}

/// SPI bus settings for the LSM6DSO32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiSettings {
    pub frequency_hz: u32,
    pub word_bits: u8,
    pub msb_first: bool,
    /// Delay between CS assertion and the first clock edge.
    pub cs_setup_us: u32,
}

impl Default for SpiSettings {
    fn default() -> Self {
        Self {
            frequency_hz: 1_000_000, // conservative start
            word_bits: 8,
            msb_first: true,
            cs_setup_us: 1,
        }
    }
}

/// Complete configuration for one bring-up program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BringupConfig {
    pub variant: Variant,
    pub pacing: Pacing,
    /// Cycles between SPI identification polls. `None` disables polling.
    pub spi_poll_every: Option<u32>,
    /// Run one identification probe during start-up.
    pub probe_at_start: bool,
    pub success_flash: Option<FlashConfig>,
    pub spi: SpiSettings,
}

/// Busy-wait threshold measured at roughly 23 ms per toggle on EV1.
pub const BUSY_WAIT_THRESHOLD: u32 = 1_000_000;

impl BringupConfig {
    /// The preset for `variant`.
    pub const fn preset(variant: Variant) -> Self {
        match variant {
            Variant::Ev1SpiTest => Self {
                variant,
                pacing: Pacing::Sleep { interval_ms: 200 },
                spi_poll_every: Some(10), // every 2 s
                probe_at_start: true,
                success_flash: Some(FlashConfig {
                    toggles: 6,
                    interval_ms: 50,
                }),
                spi: SpiSettings {
                    frequency_hz: 1_000_000,
                    word_bits: 8,
                    msb_first: true,
                    cs_setup_us: 1,
                },
            },
            Variant::Ev1Timer | Variant::Ev2GpioTest => Self {
                variant,
                pacing: Pacing::BusyWait {
                    threshold: BUSY_WAIT_THRESHOLD,
                },
                spi_poll_every: None,
                probe_at_start: false,
                success_flash: None,
                spi: SpiSettings {
                    frequency_hz: 1_000_000,
                    word_bits: 8,
                    msb_first: true,
                    cs_setup_us: 1,
                },
            },
        }
    }

    /// Whether this configuration ever talks to the sensor.
    pub fn uses_spi(&self) -> bool {
        self.probe_at_start || self.spi_poll_every.is_some()
    }

    /// Reject settings the loop cannot honour.
    pub fn validate(&self) -> Result<()> {
        match self.pacing {
            Pacing::Sleep { interval_ms: 0 } => {
                return Err(Error::Config("sleep interval must be non-zero"));
            }
            Pacing::BusyWait { threshold: 0 } => {
                return Err(Error::Config("busy-wait threshold must be non-zero"));
            }
            _ => {}
        }
        if self.spi_poll_every == Some(0) {
            return Err(Error::Config("spi poll period must be non-zero"));
        }
        if let Some(flash) = self.success_flash {
            if flash.toggles % 2 != 0 {
                return Err(Error::Config("flash toggle count must be even"));
            }
        }
        if self.spi.word_bits != 8 {
            return Err(Error::Config("only 8-bit SPI words are supported"));
        }
        if self.spi.frequency_hz == 0 {
            return Err(Error::Config("spi frequency must be non-zero"));
        }
        Ok(())
    }
}

impl Default for BringupConfig {
    fn default() -> Self {
        Self::preset(Variant::Ev1SpiTest)
    }
}

/// Why a JSON override was refused.
#[cfg(feature = "host")]
#[derive(Debug)]
pub enum OverrideError {
    /// Not a configuration document.
    Parse(serde_json::Error),
    /// Well-formed, but fails [`BringupConfig::validate`].
    Invalid(Error),
}

#[cfg(feature = "host")]
impl core::fmt::Display for OverrideError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "malformed override: {e}"),
            Self::Invalid(e) => write!(f, "invalid override: {e}"),
        }
    }
}

#[cfg(feature = "host")]
impl std::error::Error for OverrideError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(e) => Some(e),
            Self::Invalid(e) => Some(e),
        }
    }
}

#[cfg(feature = "host")]
impl BringupConfig {
    /// Parse a JSON override and validate it.
    pub fn from_json(text: &str) -> core::result::Result<Self, OverrideError> {
        let config: Self = serde_json::from_str(text).map_err(OverrideError::Parse)?;
        config.validate().map_err(OverrideError::Invalid)?;
        Ok(config)
    }
}
