//! Host-side board simulation (feature `host`).
//!
//! Runs the real [`BringupService`](crate::app::service::BringupService)
//! against in-memory outputs, a simulated sensor and a virtual clock, and
//! records what a logic analyzer wired like the bench would have seen:
//!
//! | Channel | Signal      |
//! |---------|-------------|
//! | 0       | CS (P2.05)  |
//! | 1       | SCK (P2.01) |
//! | 2       | MOSI (P2.02)|
//! | 3       | MISO (P2.04)|
//! | 4       | unused      |
//! | 5       | P1.05       |
//! | 6       | P1.06       |
//!
//! The trace is written in the same CSV layout the capture checker reads.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::ErrorKind;

use crate::app::ports::{SensorProbePort, SignalPort};
use crate::drivers::lsm6dso32::{read_frame, WHO_AM_I_REG, WHO_AM_I_VALUE};
use crate::error::{Error, Result};

const CS: u8 = 0;
const SCK: u8 = 1;
const MOSI: u8 = 2;
const MISO: u8 = 3;
const PROBE05: u8 = 5;
const PROBE06: u8 = 6;
const CHANNELS: u8 = 7;

/// Virtual time plus the recorded level changes.
#[derive(Debug, Default)]
struct Trace {
    now_ns: u64,
    levels: u8,
    rows: Vec<(u64, u8)>,
}

impl Trace {
    fn set(&mut self, channel: u8, high: bool) {
        if high {
            self.levels |= 1 << channel;
        } else {
            self.levels &= !(1 << channel);
        }
    }

    /// Record the current levels at the current time.
    fn commit(&mut self) {
        self.rows.push((self.now_ns, self.levels));
    }
}

/// Shared handle onto one simulated board.
#[derive(Debug, Clone)]
pub struct SimBoard {
    trace: Rc<RefCell<Trace>>,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBoard {
    /// A board at t = 0 with every line low and CS idle high.
    pub fn new() -> Self {
        let mut trace = Trace::default();
        trace.set(CS, true);
        trace.commit();
        Self {
            trace: Rc::new(RefCell::new(trace)),
        }
    }

    pub fn clock(&self) -> SimClock {
        SimClock {
            trace: Rc::clone(&self.trace),
        }
    }

    pub fn signals(&self) -> SimSignals {
        SimSignals {
            trace: Rc::clone(&self.trace),
            phase: false,
        }
    }

    /// A sensor answering `identity`, or failing every transaction when
    /// `None`.
    pub fn sensor(&self, identity: Option<u8>) -> SimSensor {
        SimSensor {
            trace: Rc::clone(&self.trace),
            identity,
            half_period_ns: 500,
        }
    }

    /// Let virtual time pass without any output change.
    pub fn advance_us(&self, us: u64) {
        self.trace.borrow_mut().now_ns += us * 1_000;
    }

    pub fn now_s(&self) -> f64 {
        self.trace.borrow().now_ns as f64 / 1e9
    }

    /// Rows recorded so far.
    pub fn rows(&self) -> usize {
        self.trace.borrow().rows.len()
    }

    /// Write the trace as a logic-analyzer CSV export.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        let mut header = vec!["Time [s]".to_owned()];
        header.extend((0..CHANNELS).map(|c| format!("Channel {c}")));
        out.write_record(&header)?;

        for &(ns, levels) in &self.trace.borrow().rows {
            let mut row = vec![format!("{}.{:09}", ns / 1_000_000_000, ns % 1_000_000_000)];
            row.extend((0..CHANNELS).map(|c| ((levels >> c) & 1).to_string()));
            out.write_record(&row)?;
        }
        out.flush()?;
        Ok(())
    }
}

/// Delay provider that advances virtual time instead of blocking.
#[derive(Debug, Clone)]
pub struct SimClock {
    trace: Rc<RefCell<Trace>>,
}

impl DelayNs for SimClock {
    fn delay_ns(&mut self, ns: u32) {
        self.trace.borrow_mut().now_ns += u64::from(ns);
    }
}

/// The LED and probe outputs. Only the probe pins reach the analyzer.
#[derive(Debug)]
pub struct SimSignals {
    trace: Rc<RefCell<Trace>>,
    phase: bool,
}

impl SignalPort for SimSignals {
    fn all_low(&mut self) -> Result<()> {
        let mut t = self.trace.borrow_mut();
        t.set(PROBE05, false);
        t.set(PROBE06, false);
        t.commit();
        self.phase = false;
        Ok(())
    }

    fn set_phase(&mut self, phase: bool) -> Result<()> {
        let mut t = self.trace.borrow_mut();
        t.set(PROBE05, phase);
        t.set(PROBE06, !phase);
        t.commit();
        self.phase = phase;
        Ok(())
    }

    fn phase(&self) -> bool {
        self.phase
    }
}

/// LSM6DSO32 stand-in that draws each read onto the SPI channels.
#[derive(Debug)]
pub struct SimSensor {
    trace: Rc<RefCell<Trace>>,
    identity: Option<u8>,
    half_period_ns: u64,
}

impl SimSensor {
    /// Draw one mode-0 transaction: CS low, 1 µs setup, then each bit
    /// presented on the falling edge and sampled on the rising edge.
    fn draw(&self, mosi: [u8; 2], miso: [u8; 2]) {
        let mut t = self.trace.borrow_mut();
        t.set(CS, false);
        t.commit();
        t.now_ns += 1_000;

        for (o, i) in mosi.into_iter().zip(miso) {
            for bit in (0..8).rev() {
                t.set(SCK, false);
                t.set(MOSI, (o >> bit) & 1 == 1);
                t.set(MISO, (i >> bit) & 1 == 1);
                t.commit();
                t.now_ns += self.half_period_ns;
                t.set(SCK, true);
                t.commit();
                t.now_ns += self.half_period_ns;
            }
        }

        t.set(SCK, false);
        t.set(MOSI, false);
        t.set(MISO, false);
        t.commit();
        t.now_ns += 1_000;
        t.set(CS, true);
        t.commit();
    }
}

impl SensorProbePort for SimSensor {
    fn read_identity(&mut self) -> Result<u8> {
        let value = self.identity.ok_or(Error::Spi(ErrorKind::Other))?;
        self.draw(read_frame(WHO_AM_I_REG), [0x00, value]);
        Ok(value)
    }

    fn expected_identity(&self) -> u8 {
        WHO_AM_I_VALUE
    }
}
