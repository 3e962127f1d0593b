//! nRF54L15 peripheral setup for MIPE_EV1/EV2.
//!
//! Pin numbers come from [`mipe_bringup::pins`]; this module only maps
//! them onto embassy-nrf peripheral singletons.

use embassy_nrf::gpio::{Level, Output, OutputDrive, Pin};
use embassy_nrf::peripherals::{P2_01, P2_02, P2_04, P2_05, SERIAL00};
use embassy_nrf::spim::{self, Spim};
use embassy_nrf::{bind_interrupts, Peri, Peripherals};
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;
use mipe_bringup::config::SpiSettings;
use mipe_bringup::drivers::lsm6dso32::Lsm6dso32;
use mipe_bringup::drivers::signals::SignalBank;

bind_interrupts!(struct Irqs {
    SERIAL00 => spim::InterruptHandler<SERIAL00>;
});

pub type Signals = SignalBank<Output<'static>, Output<'static>, Output<'static>, Output<'static>>;
pub type SensorDevice = ExclusiveDevice<Spim<'static>, Output<'static>, Delay>;

pub fn init_logging() {
    rtt_target::rtt_init_log!(log::LevelFilter::Info);
}

/// SPI pins, held unconfigured until a variant needs the sensor.
pub struct SpiPins {
    spim: Peri<'static, SERIAL00>,
    sck: Peri<'static, P2_01>,
    mosi: Peri<'static, P2_02>,
    miso: Peri<'static, P2_04>,
    cs: Peri<'static, P2_05>,
}

impl SpiPins {
    /// Configure SERIAL00 as an SPI master (mode 0, MSB first) with a
    /// software chip select idling high.
    pub fn into_sensor(self, settings: &SpiSettings) -> Lsm6dso32<SensorDevice> {
        let mut config = spim::Config::default();
        config.frequency = frequency(settings.frequency_hz);
        config.mode = spim::MODE_0;

        let bus = Spim::new(self.spim, Irqs, self.sck, self.miso, self.mosi, config);
        let cs = Output::new(self.cs, Level::High, OutputDrive::Standard);
        let device = ExclusiveDevice::new(bus, cs, Delay).unwrap_or_else(|e| match e {});
        Lsm6dso32::new(device, settings)
    }
}

/// Split the peripherals into the output bank (all low) and the
/// untouched SPI pins.
pub fn split(p: Peripherals) -> (Signals, SpiPins) {
    let signals = SignalBank::new(low(p.P0_00), low(p.P0_01), low(p.P1_05), low(p.P1_06));
    let spi = SpiPins {
        spim: p.SERIAL00,
        sck: p.P2_01,
        mosi: p.P2_02,
        miso: p.P2_04,
        cs: p.P2_05,
    };
    (signals, spi)
}

fn low(pin: Peri<'static, impl Pin>) -> Output<'static> {
    Output::new(pin, Level::Low, OutputDrive::Standard)
}

/// Highest SPIM frequency not above `hz`.
fn frequency(hz: u32) -> spim::Frequency {
    match hz {
        8_000_000.. => spim::Frequency::M8,
        4_000_000.. => spim::Frequency::M4,
        2_000_000.. => spim::Frequency::M2,
        1_000_000.. => spim::Frequency::M1,
        500_000.. => spim::Frequency::K500,
        250_000.. => spim::Frequency::K250,
        _ => spim::Frequency::K125,
    }
}
