//! Probe bookkeeping: running totals plus the last few outcomes.
//!
//! Stack-allocated; the history is a fixed-size ring that overwrites the
//! oldest entry.

use heapless::HistoryBuffer;

use super::events::ProbeOutcome;

/// Number of recent probe outcomes kept.
pub const HISTORY_LEN: usize = 8;

pub struct ProbeStats {
    ok: u32,
    mismatched: u32,
    failed: u32,
    recent: HistoryBuffer<ProbeOutcome, HISTORY_LEN>,
}

impl Default for ProbeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeStats {
    pub fn new() -> Self {
        Self {
            ok: 0,
            mismatched: 0,
            failed: 0,
            recent: HistoryBuffer::new(),
        }
    }

    pub fn record(&mut self, outcome: ProbeOutcome) {
        match outcome {
            ProbeOutcome::Ok(_) => self.ok = self.ok.saturating_add(1),
            ProbeOutcome::Mismatch { .. } => self.mismatched = self.mismatched.saturating_add(1),
            ProbeOutcome::Failed(_) => self.failed = self.failed.saturating_add(1),
        }
        self.recent.write(outcome);
    }

    pub fn ok(&self) -> u32 {
        self.ok
    }

    pub fn mismatched(&self) -> u32 {
        self.mismatched
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn total(&self) -> u32 {
        self.ok
            .saturating_add(self.mismatched)
            .saturating_add(self.failed)
    }

    pub fn last(&self) -> Option<ProbeOutcome> {
        self.recent.recent().copied()
    }

    /// Successful probes among the retained history, and the history length.
    pub fn recent_ok(&self) -> (usize, usize) {
        let ok = self.recent.oldest_ordered().filter(|o| o.is_ok()).count();
        (ok, self.recent.len())
    }

    /// Retained outcomes, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.recent.oldest_ordered()
    }
}
