//! Bring-up service: the control loop shared by every program variant.
//!
//! [`BringupService`] owns the loop counters and probe statistics. All
//! I/O flows through port traits injected at call sites, so the loop can
//! be stepped one cycle at a time with mock adapters.
//!
//! ```text
//!  SignalPort ◀── ┌──────────────────────┐ ──▶ EventSink
//!                 │   BringupService     │
//!  SensorProbe ◀─▶│ toggle · poll · flash│ ──▶ Pacer
//!                 └──────────────────────┘
//! ```
//!
//! One cycle: invert the phase and drive the outputs, poll the sensor if
//! the poll period has elapsed, then wait. Nothing here is fatal: a bad
//! probe or a failed GPIO write is reported and the next cycle runs.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::config::{BringupConfig, FlashConfig};
use crate::timing::Pacer;

use super::events::{BringupEvent, ProbeOutcome};
use super::ports::{EventSink, SensorProbePort, SignalPort};
use super::stats::ProbeStats;

/// What happened during one call to [`BringupService::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// 1-based cycle number.
    pub cycle: u64,
    /// Phase driven this cycle.
    pub phase: bool,
    /// Present when this cycle polled the sensor.
    pub probe: Option<ProbeOutcome>,
}

pub struct BringupService {
    config: BringupConfig,
    cycle: u64,
    since_poll: u32,
    polls: u32,
    stats: ProbeStats,
}

impl BringupService {
    /// Construct the service. Does **not** touch the outputs; call
    /// [`start`](Self::start) next.
    pub fn new(config: BringupConfig) -> Self {
        Self {
            config,
            cycle: 0,
            since_poll: 0,
            polls: 0,
            stats: ProbeStats::new(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive every output low and, when configured, run the start-up
    /// identification probe. The probe outcome is returned for the
    /// caller to inspect but never stops the program.
    pub fn start(
        &mut self,
        signals: &mut impl SignalPort,
        probe: &mut impl SensorProbePort,
        sink: &mut impl EventSink,
    ) -> Option<ProbeOutcome> {
        info!(
            "{} bring-up starting ({:?}, {:?})",
            self.config.variant.board(),
            self.config.variant,
            self.config.pacing
        );

        if let Err(e) = signals.all_low() {
            sink.emit(&BringupEvent::SignalFault(e));
        }
        sink.emit(&BringupEvent::Started {
            variant: self.config.variant,
        });

        if self.config.probe_at_start {
            let outcome = self.probe(probe, sink);
            if !outcome.is_ok() {
                warn!("Start-up probe failed, continuing with GPIO loop");
            }
            Some(outcome)
        } else {
            None
        }
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one loop cycle: toggle → optional poll (and flash) → wait.
    pub fn tick<D: DelayNs>(
        &mut self,
        signals: &mut impl SignalPort,
        probe: &mut impl SensorProbePort,
        pacer: &mut Pacer<D>,
        sink: &mut impl EventSink,
    ) -> CycleReport {
        self.cycle += 1;
        let phase = !signals.phase();
        match signals.set_phase(phase) {
            Ok(()) => sink.emit(&BringupEvent::Toggled {
                cycle: self.cycle,
                phase,
            }),
            Err(e) => sink.emit(&BringupEvent::SignalFault(e)),
        }

        let mut polled = None;
        if let Some(every) = self.config.spi_poll_every {
            self.since_poll += 1;
            if self.since_poll >= every {
                self.since_poll = 0;
                self.polls += 1;
                sink.emit(&BringupEvent::ProbeStarted { poll: self.polls });

                let outcome = self.probe(probe, sink);
                if let (true, Some(flash)) = (outcome.is_ok(), self.config.success_flash) {
                    Self::flash(signals, pacer, flash, sink);
                }
                polled = Some(outcome);
            }
        }

        pacer.wait_cycle();

        CycleReport {
            cycle: self.cycle,
            phase,
            probe: polled,
        }
    }

    /// Start, then cycle forever.
    pub fn run<D: DelayNs>(
        &mut self,
        signals: &mut impl SignalPort,
        probe: &mut impl SensorProbePort,
        pacer: &mut Pacer<D>,
        sink: &mut impl EventSink,
    ) -> ! {
        self.start(signals, probe, sink);
        loop {
            self.tick(signals, probe, pacer, sink);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &BringupConfig {
        &self.config
    }

    /// Cycles completed so far.
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    /// Periodic polls issued so far (the start-up probe is not counted).
    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn stats(&self) -> &ProbeStats {
        &self.stats
    }

    // ── Internals ─────────────────────────────────────────────

    fn probe(&mut self, probe: &mut impl SensorProbePort, sink: &mut impl EventSink) -> ProbeOutcome {
        let expected = probe.expected_identity();
        let outcome = match probe.read_identity() {
            Ok(value) if value == expected => ProbeOutcome::Ok(value),
            Ok(found) => ProbeOutcome::Mismatch { expected, found },
            Err(e) => ProbeOutcome::Failed(e),
        };
        self.stats.record(outcome);
        sink.emit(&BringupEvent::Probe(outcome));
        outcome
    }

    /// Invert all four outputs `toggles` times. The toggle count is even
    /// (enforced by config validation), so the phase ends where it began
    /// and the LED pair stays complementary throughout.
    fn flash<D: DelayNs>(
        signals: &mut impl SignalPort,
        pacer: &mut Pacer<D>,
        flash: FlashConfig,
        sink: &mut impl EventSink,
    ) {
        for _ in 0..flash.toggles {
            let phase = !signals.phase();
            if let Err(e) = signals.set_phase(phase) {
                sink.emit(&BringupEvent::SignalFault(e));
            }
            pacer.pause_ms(flash.interval_ms);
        }
        sink.emit(&BringupEvent::FlashDone);
    }
}
