//! Port traits: the boundary between the bring-up loop and the board.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BringupService
//! ```
//!
//! Concrete adapters live in [`crate::adapters`]. The service consumes
//! the ports via generics, so it never names a HAL type.

use crate::error::Result;

use super::events::BringupEvent;

// ───────────────────────────────────────────────────────────────
// Signal port (domain → GPIO)
// ───────────────────────────────────────────────────────────────

/// The LED / probe output group.
pub trait SignalPort {
    /// Drive every output low (start-up state).
    fn all_low(&mut self) -> Result<()>;

    /// Drive the outputs for `phase`: LED0 and PROBE05 follow it, LED1
    /// and PROBE06 take the inverse.
    fn set_phase(&mut self, phase: bool) -> Result<()>;

    /// Last phase driven.
    fn phase(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Sensor probe port (domain ↔ SPI sensor)
// ───────────────────────────────────────────────────────────────

/// A device that can be asked for its identification byte.
pub trait SensorProbePort {
    /// Read the identification register. One blocking bus transaction.
    fn read_identity(&mut self) -> Result<u8>;

    /// The value a genuine part returns.
    fn expected_identity(&self) -> u8;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging)
// ───────────────────────────────────────────────────────────────

/// The service reports what it does through this port. Adapters decide
/// where the events go (RTT log, a test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &BringupEvent);
}
