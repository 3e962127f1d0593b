//! Integration tests for the BringupService → drivers → embedded-hal path.
//!
//! The real `SignalBank` and `Lsm6dso32` drivers run on mock pins, a
//! scripted SPI device and a counting delay.

use embedded_hal::spi::ErrorKind;

use mipe_bringup::adapters::hardware::NoSensor;
use mipe_bringup::app::events::{BringupEvent, ProbeOutcome};
use mipe_bringup::app::service::BringupService;
use mipe_bringup::config::{BringupConfig, Pacing, SpiSettings, Variant};
use mipe_bringup::drivers::lsm6dso32::Lsm6dso32;
use mipe_bringup::timing::Pacer;
use mipe_bringup::Error;

use crate::mock_hw::{bank_with_failure, mock_bank, Line, MockDelay, MockSpi, RecordingSink};

fn spi_test() -> BringupConfig {
    BringupConfig::preset(Variant::Ev1SpiTest)
}

// ── Signal invariants ─────────────────────────────────────────

#[test]
fn leds_complementary_and_probes_mirror_through_flashes() {
    let config = spi_test();
    let (mut bank, log) = mock_bank();
    let mut sensor = Lsm6dso32::new(MockSpi::answering(0x6C), &config.spi);
    let mut pacer = Pacer::new(MockDelay::default(), config.pacing);
    let mut sink = RecordingSink::default();
    let mut svc = BringupService::new(config);

    svc.start(&mut bank, &mut sensor, &mut sink);
    for _ in 0..30 {
        svc.tick(&mut bank, &mut sensor, &mut pacer, &mut sink);
    }

    let snapshots = log.borrow().snapshots();
    // all_low + 30 toggles + 3 flashes of 6
    assert_eq!(snapshots.len(), 1 + 30 + 18);
    assert_eq!(snapshots[0], [false; 4]);
    for (i, [led0, led1, p05, p06]) in snapshots.iter().copied().enumerate().skip(1) {
        assert_ne!(led0, led1, "LEDs equal after group {i}");
        assert_eq!(p05, led0, "PROBE05 diverged after group {i}");
        assert_eq!(p06, led1, "PROBE06 diverged after group {i}");
    }
    assert_eq!(sink.count(|e| matches!(e, BringupEvent::FlashDone)), 3);
}

#[test]
fn outputs_written_in_table_order() {
    let (mut bank, log) = mock_bank();
    let mut sink = RecordingSink::default();
    let mut svc = BringupService::new(BringupConfig::preset(Variant::Ev1Timer));
    svc.start(&mut bank, &mut NoSensor, &mut sink);

    let lines: Vec<Line> = log.borrow().writes.iter().map(|&(l, _)| l).collect();
    assert_eq!(lines, [Line::Led0, Line::Led1, Line::Probe05, Line::Probe06]);
}

// ── SPI probing ───────────────────────────────────────────────

#[test]
fn probes_send_who_am_i_frames_with_cs_setup() {
    let config = spi_test();
    let (mut bank, _) = mock_bank();
    let mut sensor = Lsm6dso32::new(MockSpi::answering(0x6C), &config.spi);
    let mut pacer = Pacer::new(MockDelay::default(), config.pacing);
    let mut sink = RecordingSink::default();
    let mut svc = BringupService::new(config);

    assert_eq!(svc.start(&mut bank, &mut sensor, &mut sink), Some(ProbeOutcome::Ok(0x6C)));
    for _ in 0..20 {
        svc.tick(&mut bank, &mut sensor, &mut pacer, &mut sink);
    }

    let spi = sensor.release();
    assert_eq!(spi.sent.len(), 3, "start-up probe plus polls at cycles 10 and 20");
    assert!(spi.sent.iter().all(|f| f == &[0x8F, 0x00]));
    assert!(spi.delays_ns.iter().all(|&ns| ns == 1_000));
    assert_eq!(svc.polls(), 2);
    assert_eq!(svc.stats().ok(), 3);
}

#[test]
fn wrong_identity_is_reported_and_not_flashed() {
    let config = spi_test();
    let (mut bank, _) = mock_bank();
    let mut sensor = Lsm6dso32::new(MockSpi::answering(0x6A), &config.spi);
    let mut pacer = Pacer::new(MockDelay::default(), config.pacing);
    let mut sink = RecordingSink::default();
    let mut svc = BringupService::new(config);

    for _ in 0..10 {
        svc.tick(&mut bank, &mut sensor, &mut pacer, &mut sink);
    }

    assert!(sink.events.contains(&BringupEvent::Probe(ProbeOutcome::Mismatch {
        expected: 0x6C,
        found: 0x6A,
    })));
    assert_eq!(sink.count(|e| matches!(e, BringupEvent::FlashDone)), 0);
    // Ten sleeps of 200 ms, no flash pauses.
    assert_eq!(pacer.release().total_ns, 10 * 200_000_000);
}

#[test]
fn bus_error_is_reported_and_loop_continues() {
    let config = spi_test();
    let (mut bank, _) = mock_bank();
    let spi = MockSpi::answering(0x6C).then(Err(ErrorKind::ModeFault));
    let mut sensor = Lsm6dso32::new(spi, &config.spi);
    let mut pacer = Pacer::new(MockDelay::default(), config.pacing);
    let mut sink = RecordingSink::default();
    let mut svc = BringupService::new(config);

    let first = svc.start(&mut bank, &mut sensor, &mut sink);
    assert_eq!(first, Some(ProbeOutcome::Failed(Error::Spi(ErrorKind::ModeFault))));

    let mut outcomes = Vec::new();
    for _ in 0..20 {
        if let Some(o) = svc.tick(&mut bank, &mut sensor, &mut pacer, &mut sink).probe {
            outcomes.push(o);
        }
    }
    assert_eq!(outcomes, [ProbeOutcome::Ok(0x6C), ProbeOutcome::Ok(0x6C)]);
    assert_eq!(svc.cycles(), 20);
    assert_eq!(svc.stats().failed(), 1);
}

#[test]
fn poll_numbers_count_up_from_one() {
    let config = spi_test();
    let (mut bank, _) = mock_bank();
    let mut sensor = Lsm6dso32::new(MockSpi::answering(0x6C), &config.spi);
    let mut pacer = Pacer::new(MockDelay::default(), config.pacing);
    let mut sink = RecordingSink::default();
    let mut svc = BringupService::new(config);

    for _ in 0..30 {
        svc.tick(&mut bank, &mut sensor, &mut pacer, &mut sink);
    }
    let polls: Vec<u32> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            BringupEvent::ProbeStarted { poll } => Some(*poll),
            _ => None,
        })
        .collect();
    assert_eq!(polls, [1, 2, 3]);
}

// ── GPIO-only variants ────────────────────────────────────────

#[test]
fn busy_wait_variant_never_touches_spi_or_delay() {
    let mut config = BringupConfig::preset(Variant::Ev2GpioTest);
    config.pacing = Pacing::BusyWait { threshold: 1_000 };
    let (mut bank, log) = mock_bank();
    let mut pacer = Pacer::new(MockDelay::default(), config.pacing);
    let mut sink = RecordingSink::default();
    let mut svc = BringupService::new(config);

    assert_eq!(svc.start(&mut bank, &mut NoSensor, &mut sink), None);
    for _ in 0..5 {
        svc.tick(&mut bank, &mut NoSensor, &mut pacer, &mut sink);
    }

    assert_eq!(sink.count(|e| matches!(e, BringupEvent::Probe(_))), 0);
    assert_eq!(pacer.release().calls, 0);
    assert_eq!(log.borrow().level(Line::Led0), Some(true));
    assert_eq!(log.borrow().level(Line::Led1), Some(false));
}

#[test]
fn sleep_interval_matches_config() {
    let mut config = spi_test();
    config.spi_poll_every = None;
    config.probe_at_start = false;
    let (mut bank, _) = mock_bank();
    let mut pacer = Pacer::new(MockDelay::default(), config.pacing);
    let mut sink = RecordingSink::default();
    let mut svc = BringupService::new(config);

    for _ in 0..7 {
        svc.tick(&mut bank, &mut NoSensor, &mut pacer, &mut sink);
    }
    let delay = pacer.release();
    assert_eq!(delay.calls, 7);
    assert_eq!(delay.total_ns, 7 * 200_000_000);
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn failing_output_is_reported_every_cycle() {
    let config = BringupConfig::preset(Variant::Ev1Timer);
    let (mut bank, _) = bank_with_failure(Some(Line::Probe06));
    let mut pacer = Pacer::new(MockDelay::default(), Pacing::BusyWait { threshold: 10 });
    let mut sink = RecordingSink::default();
    let mut svc = BringupService::new(config);

    svc.start(&mut bank, &mut NoSensor, &mut sink);
    for _ in 0..3 {
        svc.tick(&mut bank, &mut NoSensor, &mut pacer, &mut sink);
    }
    assert_eq!(
        sink.count(|e| matches!(e, BringupEvent::SignalFault(Error::Gpio))),
        4,
        "start-up plus every cycle"
    );
    assert_eq!(svc.cycles(), 3);
}

#[test]
fn custom_cs_setup_reaches_the_bus() {
    let settings = SpiSettings {
        cs_setup_us: 5,
        ..SpiSettings::default()
    };
    let mut sensor = Lsm6dso32::new(MockSpi::answering(0x6C), &settings);
    assert_eq!(sensor.verify_identity(), Ok(()));
    assert_eq!(sensor.release().delays_ns, [5_000]);
}
