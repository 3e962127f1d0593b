//! The four bring-up outputs: two LEDs and two probe pins.
//!
//! LED1 always carries the inverse of LED0, and each probe pin copies
//! one LED so the pattern can be measured with a scope or logic
//! analyzer without loading the LED nets:
//!
//! | Output  | Level   |
//! |---------|---------|
//! | LED0    | phase   |
//! | LED1    | !phase  |
//! | PROBE05 | phase   |
//! | PROBE06 | !phase  |
//!
//! Outputs are written in table order, so there is a short window
//! (a few GPIO writes) in which the pairs disagree.

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::{Error, Result};

pub struct SignalBank<L0, L1, P5, P6> {
    led0: L0,
    led1: L1,
    probe05: P5,
    probe06: P6,
    phase: bool,
}

impl<L0, L1, P5, P6> SignalBank<L0, L1, P5, P6>
where
    L0: OutputPin,
    L1: OutputPin,
    P5: OutputPin,
    P6: OutputPin,
{
    /// Take ownership of the four outputs. Nothing is driven yet; call
    /// [`all_low`](Self::all_low) to establish the start-up state.
    pub fn new(led0: L0, led1: L1, probe05: P5, probe06: P6) -> Self {
        Self {
            led0,
            led1,
            probe05,
            probe06,
            phase: false,
        }
    }

    /// Drive every output low. This is the only state in which the LED
    /// pair is not complementary.
    pub fn all_low(&mut self) -> Result<()> {
        let result = self.write(PinState::Low, PinState::Low);
        self.phase = false;
        result
    }

    /// Drive all four outputs for `phase`.
    ///
    /// Every pin is written even if an earlier one fails and the phase
    /// advances regardless. The first failure is returned.
    pub fn apply(&mut self, phase: bool) -> Result<()> {
        let result = self.write(PinState::from(phase), PinState::from(!phase));
        self.phase = phase;
        result
    }

    fn write(&mut self, on: PinState, off: PinState) -> Result<()> {
        let results = [
            self.led0.set_state(on).map_err(|_| Error::Gpio),
            self.led1.set_state(off).map_err(|_| Error::Gpio),
            self.probe05.set_state(on).map_err(|_| Error::Gpio),
            self.probe06.set_state(off).map_err(|_| Error::Gpio),
        ];
        results.into_iter().collect()
    }

    /// Last phase applied.
    pub fn phase(&self) -> bool {
        self.phase
    }

    pub fn release(self) -> (L0, L1, P5, P6) {
        (self.led0, self.led1, self.probe05, self.probe06)
    }
}
