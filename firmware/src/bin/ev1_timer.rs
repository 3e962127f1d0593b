//! MIPE_EV1: busy-wait toggling of the LEDs and probe pins, no SPI.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use mipe_bringup::config::Variant;
use panic_halt as _;

#[entry]
fn main() -> ! {
    mipe_firmware::run(Variant::Ev1Timer)
}
