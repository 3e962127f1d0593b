//! End-to-end: run the loop on a simulated board, export the trace as a
//! logic-analyzer CSV and check it with the capture analyzer.

use mipe_bringup::adapters::log_sink::LogEventSink;
use mipe_bringup::app::service::BringupService;
use mipe_bringup::capture::{analyze, AnalysisConfig, Capture, Status};
use mipe_bringup::config::{BringupConfig, Pacing, Variant};
use mipe_bringup::sim::SimBoard;
use mipe_bringup::timing::Pacer;

fn simulate(config: BringupConfig, identity: Option<u8>, cycles: u32, busy_wait_us: u64) -> Capture {
    let board = SimBoard::new();
    let mut signals = board.signals();
    let mut sensor = board.sensor(identity);
    let mut pacer = Pacer::new(board.clock(), config.pacing);
    let mut sink = LogEventSink::new();
    let mut svc = BringupService::new(config);

    svc.start(&mut signals, &mut sensor, &mut sink);
    for _ in 0..cycles {
        svc.tick(&mut signals, &mut sensor, &mut pacer, &mut sink);
        if let Pacing::BusyWait { .. } = config.pacing {
            board.advance_us(busy_wait_us);
        }
    }

    let mut csv = Vec::new();
    board.write_csv(&mut csv).unwrap();
    Capture::from_reader(csv.as_slice()).unwrap()
}

#[test]
fn healthy_spi_board_passes_every_check() {
    let config = BringupConfig::preset(Variant::Ev1SpiTest);
    let capture = simulate(config, Some(0x6C), 40, 0);
    let report = analyze(&capture, &AnalysisConfig::for_bringup(&config)).unwrap();

    assert!(report.pass, "{report:#?}");
    let spi = report.spi.as_ref().unwrap();
    // start-up probe plus polls at cycles 10, 20, 30 and 40
    assert_eq!(spi.who_am_i_reads, 5);
    assert_eq!(spi.who_am_i_ok, 5);

    let interval = report.interval.unwrap();
    assert!(interval.within(0.200, 0.001), "{interval:?}");
    assert!(interval.min_s < 0.001, "flash follows the poll immediately");
}

#[test]
fn wrong_part_fails_who_am_i_only() {
    let config = BringupConfig::preset(Variant::Ev1SpiTest);
    let capture = simulate(config, Some(0x6A), 20, 0);
    let report = analyze(&capture, &AnalysisConfig::for_bringup(&config)).unwrap();

    assert!(!report.pass);
    let failed: Vec<_> = report.failures().map(|c| c.name).collect();
    assert_eq!(failed, ["who_am_i"]);
    assert_eq!(report.spi.as_ref().unwrap().unexpected_values, [0x6A]);
}

#[test]
fn silent_sensor_leaves_no_frames() {
    let config = BringupConfig::preset(Variant::Ev1SpiTest);
    let capture = simulate(config, None, 20, 0);
    let report = analyze(&capture, &AnalysisConfig::for_bringup(&config)).unwrap();

    assert_eq!(report.spi.as_ref().unwrap().frames, 0);
    assert_eq!(report.check("who_am_i").unwrap().status, Status::Fail);
    assert_eq!(report.check("toggle_interval").unwrap().status, Status::Pass);
}

#[test]
fn busy_wait_board_checked_without_spi() {
    let mut config = BringupConfig::preset(Variant::Ev2GpioTest);
    config.pacing = Pacing::BusyWait { threshold: 100 };
    let capture = simulate(config, None, 60, 23_000);
    let report = analyze(&capture, &AnalysisConfig::for_bringup(&config)).unwrap();

    assert!(report.pass, "{report:#?}");
    assert!(report.spi.is_none());
    assert_eq!(report.check("who_am_i").unwrap().status, Status::Skipped);
    assert_eq!(report.interval.unwrap().count, 59);
}

#[test]
fn interval_outside_tolerance_fails() {
    let mut config = BringupConfig::preset(Variant::Ev1Timer);
    config.pacing = Pacing::BusyWait { threshold: 100 };
    // 30 ms per cycle against the expected 23 ± 2 ms.
    let capture = simulate(config, None, 20, 30_000);
    let report = analyze(&capture, &AnalysisConfig::for_bringup(&config)).unwrap();

    assert_eq!(report.check("toggle_interval").unwrap().status, Status::Fail);
    assert_eq!(report.check("probes_mirror_leds").unwrap().status, Status::Pass);
}
