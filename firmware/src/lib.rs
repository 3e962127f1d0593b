//! Board support for the MIPE bring-up programs.
//!
//! Wires the nRF54L15 peripherals to the `mipe-bringup` ports and runs
//! the shared loop. Each binary in `src/bin` only picks a variant.

#![no_std]

pub mod board;

use log::{error, info};
use mipe_bringup::adapters::hardware::NoSensor;
use mipe_bringup::adapters::log_sink::LogEventSink;
use mipe_bringup::app::ports::SensorProbePort;
use mipe_bringup::app::service::BringupService;
use mipe_bringup::config::{BringupConfig, Variant};
use mipe_bringup::pins;
use embassy_time::Delay;
use mipe_bringup::timing::Pacer;

/// Bring up the board for `variant` and run its loop forever.
pub fn run(variant: Variant) -> ! {
    board::init_logging();

    let config = BringupConfig::preset(variant);
    if let Err(e) = config.validate() {
        error!("Invalid configuration for {:?}: {}", variant, e);
        halt();
    }

    let p = embassy_nrf::init(Default::default());
    let (mut signals, spi) = board::split(p);
    info!(
        "Outputs: LED0={} LED1={} PROBE05={} PROBE06={}",
        pins::LED0,
        pins::LED1,
        pins::PROBE05,
        pins::PROBE06
    );

    if config.uses_spi() {
        info!(
            "SPI: {} Hz, CS={} SCK={} MOSI={} MISO={}",
            config.spi.frequency_hz,
            pins::SPI_CS,
            pins::SPI_SCK,
            pins::SPI_MOSI,
            pins::SPI_MISO
        );
        let mut sensor = spi.into_sensor(&config.spi);
        run_loop(config, &mut signals, &mut sensor)
    } else {
        run_loop(config, &mut signals, &mut NoSensor)
    }
}

fn run_loop(config: BringupConfig, signals: &mut board::Signals, probe: &mut impl SensorProbePort) -> ! {
    let mut pacer = Pacer::new(Delay, config.pacing);
    let mut sink = LogEventSink::new();
    BringupService::new(config).run(signals, probe, &mut pacer, &mut sink)
}

fn halt() -> ! {
    loop {
        cortex_m::asm::wfi();
    }
}
