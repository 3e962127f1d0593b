//! Outbound events from the bring-up loop.
//!
//! The [`BringupService`](super::service::BringupService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.

use crate::config::Variant;
use crate::error::Error;

/// Result of one identification probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The device returned the expected identification byte.
    Ok(u8),
    /// The transaction completed but the byte was wrong.
    Mismatch { expected: u8, found: u8 },
    /// The transaction itself failed.
    Failed(Error),
}

impl ProbeOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// Structured events emitted by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BringupEvent {
    /// Outputs configured, loop about to start.
    Started { variant: Variant },

    /// The toggle phase was applied.
    Toggled { cycle: u64, phase: bool },

    /// A periodic identification poll is starting (1-based).
    ProbeStarted { poll: u32 },

    /// An identification probe finished.
    Probe(ProbeOutcome),

    /// The success flash completed; the phase is back where it was.
    FlashDone,

    /// An output could not be driven.
    SignalFault(Error),
}
