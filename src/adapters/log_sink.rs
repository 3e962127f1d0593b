//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each [`BringupEvent`] to the
//! `log` facade. On the board that is the RTT channel; on the host it is
//! whatever logger the binary installs. Per-cycle toggles go to `trace`
//! so the default level only shows probes and faults.

use log::{error, info, trace, warn};

use crate::app::events::{BringupEvent, ProbeOutcome};
use crate::app::ports::EventSink;

/// Adapter that logs every [`BringupEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self { emitted: 0 }
    }

    /// Events logged so far.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &BringupEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            BringupEvent::Started { variant } => {
                info!("START | {} {:?}, outputs low", variant.board(), variant);
            }
            BringupEvent::Toggled { cycle, phase } => {
                trace!("TOGGLE | cycle={} led0={} led1={}", cycle, u8::from(*phase), u8::from(!*phase));
            }
            BringupEvent::ProbeStarted { poll } => {
                info!("PROBE | testing SPI communication (poll {})", poll);
            }
            BringupEvent::Probe(ProbeOutcome::Ok(value)) => {
                info!("PROBE | SPI communication working, WHO_AM_I=0x{:02X}", value);
            }
            BringupEvent::Probe(ProbeOutcome::Mismatch { expected, found }) => {
                warn!(
                    "PROBE | unexpected WHO_AM_I=0x{:02X} (expected 0x{:02X})",
                    found, expected
                );
            }
            BringupEvent::Probe(ProbeOutcome::Failed(e)) => {
                error!("PROBE | SPI communication failed: {}", e);
            }
            BringupEvent::FlashDone => {
                info!("FLASH | success flash done");
            }
            BringupEvent::SignalFault(e) => {
                error!("GPIO | {}", e);
            }
        }
    }
}
