//! Loop pacing.
//!
//! Two ways of waiting between toggles, matching the bring-up programs:
//!
//! - **Sleep**: block on a [`DelayNs`] provider for a fixed interval.
//! - **Busy-wait**: spin a counter up to a threshold. The resulting
//!   interval depends on clock speed and code generation (about 23 ms on
//!   EV1 for the default threshold) and is meant to be measured, not
//!   trusted.

use embedded_hal::delay::DelayNs;

use crate::config::Pacing;

/// Counts loop iterations and fires once every `threshold` of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickCounter {
    count: u32,
    threshold: u32,
}

impl TickCounter {
    pub const fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold,
        }
    }

    /// Count one iteration. Returns `true` and restarts when the
    /// threshold is reached.
    pub fn advance(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.threshold {
            self.count = 0;
            true
        } else {
            false
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}

/// Waits out one loop cycle according to the configured [`Pacing`].
pub struct Pacer<D> {
    delay: D,
    mode: Mode,
}

enum Mode {
    Sleep { interval_ms: u32 },
    BusyWait(TickCounter),
}

impl<D: DelayNs> Pacer<D> {
    pub fn new(delay: D, pacing: Pacing) -> Self {
        let mode = match pacing {
            Pacing::Sleep { interval_ms } => Mode::Sleep { interval_ms },
            Pacing::BusyWait { threshold } => Mode::BusyWait(TickCounter::new(threshold)),
        };
        Self { delay, mode }
    }

    /// Block until the next toggle is due.
    pub fn wait_cycle(&mut self) {
        match &mut self.mode {
            Mode::Sleep { interval_ms } => self.delay.delay_ms(*interval_ms),
            Mode::BusyWait(counter) => {
                // black_box keeps the optimiser from collapsing the spin.
                while !core::hint::black_box(&mut *counter).advance() {
                    core::hint::spin_loop();
                }
            }
        }
    }

    /// Short pause independent of the pacing mode.
    pub fn pause_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    pub fn release(self) -> D {
        self.delay
    }
}
