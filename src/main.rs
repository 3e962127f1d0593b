//! `mipe-capture`: bench-side companion to the bring-up firmware.
//!
//! ```text
//! mipe-capture check capture.csv --variant ev1-spi-test --report out.json
//! mipe-capture config ev2-gpio-test
//! mipe-capture simulate ev1-spi-test --cycles 50 --output sim.csv
//! ```
//!
//! `check` verifies a logic-analyzer export of a flashed board, `config`
//! prints the preset a firmware variant runs with, and `simulate` runs
//! the loop on a virtual board and checks the trace it would produce.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use log::{error, info, warn};

use mipe_bringup::adapters::log_sink::LogEventSink;
use mipe_bringup::app::service::BringupService;
use mipe_bringup::capture::{analyze, AnalysisConfig, Capture, ChannelMap, Report, Status};
use mipe_bringup::config::{BringupConfig, Pacing, Variant};
use mipe_bringup::sim::SimBoard;
use mipe_bringup::timing::Pacer;

// ----------------------------------------------------------------------------
// Command-line Interface

#[derive(Debug, Parser)]
#[command(version, about)]
enum Cli {
    /// Verify a logic-analyzer CSV export of a running board.
    Check(CheckArgs),
    /// Print the configuration a firmware variant runs with.
    Config(ConfigArgs),
    /// Run the bring-up loop on a simulated board and check its trace.
    Simulate(SimulateArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Logic 2 digital CSV export.
    csv: PathBuf,
    /// Take interval defaults and SPI expectations from this variant.
    #[arg(long, value_enum, default_value_t = Variant::Ev1SpiTest)]
    variant: Variant,
    /// Expected toggle interval in milliseconds.
    #[arg(long)]
    expected_ms: Option<f64>,
    /// Allowed deviation of the median interval in milliseconds.
    #[arg(long)]
    tolerance_ms: Option<f64>,
    /// Longest disagreement between paired outputs still counted as
    /// write skew, in microseconds.
    #[arg(long)]
    skew_us: Option<f64>,
    #[command(flatten)]
    channels: ChannelArgs,
    /// Skip SPI decoding even if the variant uses the sensor.
    #[arg(long)]
    no_spi: bool,
    /// Write the full report as JSON.
    #[arg(long)]
    report: Option<PathBuf>,
}

/// Channel overrides. Unset flags keep the bench wiring.
#[derive(Debug, Args)]
struct ChannelArgs {
    #[arg(long)]
    cs: Option<usize>,
    #[arg(long)]
    sck: Option<usize>,
    #[arg(long)]
    mosi: Option<usize>,
    #[arg(long)]
    miso: Option<usize>,
    #[arg(long)]
    led0: Option<usize>,
    #[arg(long)]
    led1: Option<usize>,
    #[arg(long)]
    probe05: Option<usize>,
    #[arg(long)]
    probe06: Option<usize>,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[arg(value_enum)]
    variant: Variant,
    /// JSON file replacing the preset; validated before printing.
    #[arg(long = "override")]
    override_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct SimulateArgs {
    #[arg(value_enum)]
    variant: Variant,
    /// Loop cycles to run after start-up.
    #[arg(long, default_value_t = 50)]
    cycles: u64,
    /// Identification byte the simulated sensor returns.
    #[arg(long, default_value = "0x6C", value_parser = parse_byte)]
    identity: u8,
    /// Simulate a board whose sensor never answers.
    #[arg(long, conflicts_with = "identity")]
    no_sensor: bool,
    /// Virtual duration of one busy-wait cycle, in microseconds.
    #[arg(long, default_value_t = 23_000)]
    busy_wait_us: u64,
    /// Keep the simulated trace as a CSV export.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("{s:?} is not a byte: {e}"))
}

// ----------------------------------------------------------------------------
// Application

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_module("mipe_capture", log::LevelFilter::Info)
        .filter_module("mipe_bringup", log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match Cli::parse() {
        Cli::Check(args) => check(args),
        Cli::Config(args) => config(args),
        Cli::Simulate(args) => simulate(args),
    }
}

fn check(args: CheckArgs) -> Result<()> {
    let capture = Capture::from_path(&args.csv)
        .with_context(|| format!("failed to read capture {}", args.csv.display()))?;
    info!(
        "Loaded {} rows over {:.3} s, channels: {}",
        capture.samples().len(),
        capture.duration_s(),
        capture.channel_names().join(", ")
    );

    let mut cfg = AnalysisConfig::for_bringup(&BringupConfig::preset(args.variant));
    if let Some(ms) = args.expected_ms {
        cfg.expected_interval_s = ms / 1e3;
    }
    if let Some(ms) = args.tolerance_ms {
        cfg.tolerance_s = ms / 1e3;
    }
    if let Some(us) = args.skew_us {
        cfg.skew_s = us / 1e6;
    }
    cfg.map = apply_channels(cfg.map, &args.channels);
    if args.no_spi {
        cfg.map = cfg.map.without_spi();
    }

    let report = analyze(&capture, &cfg).context("capture does not match the channel map")?;
    log_report(&report);

    if let Some(path) = &args.report {
        write_report(path, &report)?;
    }
    if !report.pass {
        bail!("{} check(s) failed", report.failures().count());
    }
    Ok(())
}

fn apply_channels(map: ChannelMap, ch: &ChannelArgs) -> ChannelMap {
    ChannelMap {
        cs: ch.cs.or(map.cs),
        sck: ch.sck.or(map.sck),
        mosi: ch.mosi.or(map.mosi),
        miso: ch.miso.or(map.miso),
        led0: ch.led0.or(map.led0),
        led1: ch.led1.or(map.led1),
        probe05: ch.probe05.or(map.probe05),
        probe06: ch.probe06.or(map.probe06),
    }
}

fn config(args: ConfigArgs) -> Result<()> {
    let config = match &args.override_file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let config = BringupConfig::from_json(&text)
                .with_context(|| format!("rejected {}", path.display()))?;
            if config.variant != args.variant {
                warn!(
                    "Override is for {:?}, not {:?}",
                    config.variant, args.variant
                );
            }
            config
        }
        None => BringupConfig::preset(args.variant),
    };

    serde_json::to_writer_pretty(io::stdout().lock(), &config)?;
    println!();
    Ok(())
}

fn simulate(args: SimulateArgs) -> Result<()> {
    let config = BringupConfig::preset(args.variant);
    let board = SimBoard::new();
    let mut signals = board.signals();
    let mut sensor = board.sensor((!args.no_sensor).then_some(args.identity));
    let mut pacer = Pacer::new(board.clock(), config.pacing);
    let mut sink = LogEventSink::new();
    let mut service = BringupService::new(config);

    service.start(&mut signals, &mut sensor, &mut sink);
    for _ in 0..args.cycles {
        service.tick(&mut signals, &mut sensor, &mut pacer, &mut sink);
        if let Pacing::BusyWait { .. } = config.pacing {
            board.advance_us(args.busy_wait_us);
        }
    }

    let stats = service.stats();
    info!(
        "Simulated {} cycles ({:.3} s virtual), {} events, probes ok={} mismatched={} failed={}",
        service.cycles(),
        board.now_s(),
        sink.emitted(),
        stats.ok(),
        stats.mismatched(),
        stats.failed()
    );

    let mut csv = Vec::new();
    board.write_csv(&mut csv)?;
    if let Some(path) = &args.output {
        fs::write(path, &csv).with_context(|| format!("failed to write {}", path.display()))?;
        info!("Trace written to {}", path.display());
    }

    let capture = Capture::from_reader(csv.as_slice())?;
    let mut cfg = AnalysisConfig::for_bringup(&config);
    if let Pacing::BusyWait { .. } = config.pacing {
        cfg.expected_interval_s = args.busy_wait_us as f64 / 1e6;
    }
    let report = analyze(&capture, &cfg)?;
    log_report(&report);
    Ok(())
}

// ----------------------------------------------------------------------------
// Helper Functions

fn log_report(report: &Report) {
    for check in &report.checks {
        match check.status {
            Status::Pass => info!("PASS  {:<20} {}", check.name, check.detail),
            Status::Skipped => info!("SKIP  {:<20} {}", check.name, check.detail),
            Status::Fail => error!("FAIL  {:<20} {}", check.name, check.detail),
        }
    }
    if let Some(spi) = &report.spi {
        info!(
            "SPI: {} frames, {} WHO_AM_I reads, {} correct",
            spi.frames, spi.who_am_i_reads, spi.who_am_i_ok
        );
        if !spi.unexpected_values.is_empty() {
            let values: Vec<String> = spi
                .unexpected_values
                .iter()
                .map(|v| format!("0x{v:02X}"))
                .collect();
            warn!("SPI: unexpected WHO_AM_I values {}", values.join(", "));
        }
    }
    if report.pass {
        info!("All checks passed");
    }
}

fn write_report(path: &Path, report: &Report) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)?;
    info!("Report written to {}", path.display());
    Ok(())
}
