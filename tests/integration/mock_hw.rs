//! Mock hardware for integration tests.
//!
//! Implements the `embedded-hal` 1.0 traits directly, so the real
//! drivers and adapters run on top of them. Every pin write and SPI
//! transaction is recorded for later assertions.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, Operation, SpiDevice};

use mipe_bringup::app::events::BringupEvent;
use mipe_bringup::app::ports::EventSink;
use mipe_bringup::drivers::signals::SignalBank;

// ── Pins ──────────────────────────────────────────────────────

/// Which output a write went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Led0,
    Led1,
    Probe05,
    Probe06,
}

/// Shared record of every pin write, in order.
#[derive(Debug, Default)]
pub struct PinLog {
    pub writes: Vec<(Line, bool)>,
    /// Current level of each line (index = `Line as usize`).
    pub levels: [Option<bool>; 4],
}

#[allow(dead_code)]
impl PinLog {
    pub fn level(&self, line: Line) -> Option<bool> {
        self.levels[line as usize]
    }

    /// Levels after each complete group of four writes.
    pub fn snapshots(&self) -> Vec<[bool; 4]> {
        let mut current = [false; 4];
        let mut out = Vec::new();
        for (i, &(line, high)) in self.writes.iter().enumerate() {
            current[line as usize] = high;
            if i % 4 == 3 {
                out.push(current);
            }
        }
        out
    }
}

pub struct MockPin {
    line: Line,
    log: Rc<RefCell<PinLog>>,
    fail: bool,
}

impl digital::ErrorType for MockPin {
    type Error = digital::ErrorKind;
}

impl MockPin {
    fn write(&mut self, high: bool) -> Result<(), digital::ErrorKind> {
        if self.fail {
            return Err(digital::ErrorKind::Other);
        }
        let mut log = self.log.borrow_mut();
        log.writes.push((self.line, high));
        log.levels[self.line as usize] = Some(high);
        Ok(())
    }
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

pub type MockBank = SignalBank<MockPin, MockPin, MockPin, MockPin>;

/// A signal bank over mock pins plus its shared write log.
pub fn mock_bank() -> (MockBank, Rc<RefCell<PinLog>>) {
    bank_with_failure(None)
}

/// Same as [`mock_bank`], but writes to `failing` always error.
pub fn bank_with_failure(failing: Option<Line>) -> (MockBank, Rc<RefCell<PinLog>>) {
    let log = Rc::new(RefCell::new(PinLog::default()));
    let pin = |line| MockPin {
        line,
        log: Rc::clone(&log),
        fail: failing == Some(line),
    };
    let bank = SignalBank::new(pin(Line::Led0), pin(Line::Led1), pin(Line::Probe05), pin(Line::Probe06));
    (bank, log)
}

// ── SPI ───────────────────────────────────────────────────────

/// Scripted SPI device. Each transaction pops one reply: the bytes to
/// shift back, or an error kind.
#[derive(Default)]
pub struct MockSpi {
    pub replies: VecDeque<Result<Vec<u8>, spi::ErrorKind>>,
    /// Bytes clocked out, one entry per transaction.
    pub sent: Vec<Vec<u8>>,
    /// Delay operations seen, in nanoseconds.
    pub delays_ns: Vec<u32>,
    /// Reply used once the script runs out.
    pub fallback: Option<Vec<u8>>,
}

#[allow(dead_code)]
impl MockSpi {
    /// A device that answers every read with `[0x00, value]`.
    pub fn answering(value: u8) -> Self {
        Self {
            fallback: Some(vec![0x00, value]),
            ..Self::default()
        }
    }

    pub fn then(mut self, reply: Result<Vec<u8>, spi::ErrorKind>) -> Self {
        self.replies.push_back(reply);
        self
    }
}

impl spi::ErrorType for MockSpi {
    type Error = spi::ErrorKind;
}

impl SpiDevice for MockSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let reply = match self.replies.pop_front() {
            Some(r) => r?,
            None => self.fallback.clone().ok_or(spi::ErrorKind::Other)?,
        };

        let mut sent = Vec::new();
        let mut rx = reply.into_iter();
        for op in operations {
            match op {
                Operation::DelayNs(ns) => self.delays_ns.push(*ns),
                Operation::TransferInPlace(buf) => {
                    sent.extend_from_slice(buf);
                    for b in buf.iter_mut() {
                        *b = rx.next().unwrap_or(0xFF);
                    }
                }
                Operation::Write(buf) => sent.extend_from_slice(buf),
                Operation::Read(buf) => {
                    for b in buf.iter_mut() {
                        *b = rx.next().unwrap_or(0xFF);
                    }
                }
                Operation::Transfer(read, write) => {
                    sent.extend_from_slice(write);
                    for b in read.iter_mut() {
                        *b = rx.next().unwrap_or(0xFF);
                    }
                }
            }
        }
        self.sent.push(sent);
        Ok(())
    }
}

// ── Delay ─────────────────────────────────────────────────────

/// Sums requested delays instead of sleeping.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub total_ns: u64,
    pub calls: u32,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.calls += 1;
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<BringupEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&BringupEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &BringupEvent) {
        self.events.push(*event);
    }
}
