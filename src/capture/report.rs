//! Capture analysis and the serialisable report.

use serde::Serialize;

use super::checks::{agreement, interval_stats, AgreementCheck, IntervalStats, Relation};
use super::spi::{decode_spi, SpiChannels};
use super::{Capture, CaptureError};
use crate::config::{BringupConfig, Pacing};
use crate::drivers::lsm6dso32::WHO_AM_I_VALUE;

/// Which capture column carries which board signal. Indices count
/// channel columns only (the time column is not counted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMap {
    pub cs: Option<usize>,
    pub sck: Option<usize>,
    pub mosi: Option<usize>,
    pub miso: Option<usize>,
    pub led0: Option<usize>,
    pub led1: Option<usize>,
    pub probe05: Option<usize>,
    pub probe06: Option<usize>,
}

impl Default for ChannelMap {
    /// Bench wiring: D0=CS, D1=SCK, D2=MOSI, D3=MISO, D5=P1.05, D6=P1.06.
    fn default() -> Self {
        Self {
            cs: Some(0),
            sck: Some(1),
            mosi: Some(2),
            miso: Some(3),
            led0: None,
            led1: None,
            probe05: Some(5),
            probe06: Some(6),
        }
    }
}

impl ChannelMap {
    /// The same wiring with the SPI channels unmapped.
    pub fn without_spi(self) -> Self {
        Self {
            cs: None,
            sck: None,
            mosi: None,
            miso: None,
            ..self
        }
    }

    pub fn spi(&self) -> Option<SpiChannels> {
        Some(SpiChannels {
            cs: self.cs?,
            sck: self.sck?,
            mosi: self.mosi?,
            miso: self.miso?,
        })
    }

    fn mapped(&self) -> impl Iterator<Item = usize> {
        [
            self.cs,
            self.sck,
            self.mosi,
            self.miso,
            self.led0,
            self.led1,
            self.probe05,
            self.probe06,
        ]
        .into_iter()
        .flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    pub map: ChannelMap,
    pub expected_interval_s: f64,
    pub tolerance_s: f64,
    /// Disagreements shorter than this are write skew, not faults.
    pub skew_s: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            map: ChannelMap::default(),
            expected_interval_s: 0.200,
            tolerance_s: 0.010,
            skew_s: 50e-6,
        }
    }
}

impl AnalysisConfig {
    /// Defaults for checking a board running `config`. Busy-wait variants
    /// have no nominal interval; the EV1 bench measurement is used.
    pub fn for_bringup(config: &BringupConfig) -> Self {
        let (expected_interval_s, tolerance_s) = match config.pacing {
            Pacing::Sleep { interval_ms } => (f64::from(interval_ms) / 1000.0, 0.010),
            Pacing::BusyWait { .. } => (0.023, 0.002),
        };
        let map = if config.uses_spi() {
            ChannelMap::default()
        } else {
            ChannelMap::default().without_spi()
        };
        Self {
            map,
            expected_interval_s,
            tolerance_s,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    /// The channels needed were not mapped.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub status: Status,
    pub detail: String,
}

impl CheckResult {
    fn skipped(name: &'static str, why: &str) -> Self {
        Self {
            name,
            status: Status::Skipped,
            detail: why.to_owned(),
        }
    }

    fn from_agreement(name: &'static str, c: &AgreementCheck) -> Self {
        let status = if c.passed() { Status::Pass } else { Status::Fail };
        let detail = match c.first_violation_s {
            Some(t) => format!(
                "{} violation(s), first at {:.6} s, longest {:.1} µs",
                c.violations,
                t,
                c.longest_s * 1e6
            ),
            None => format!("held, longest skew {:.1} µs", c.longest_s * 1e6),
        };
        Self { name, status, detail }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpiSummary {
    pub frames: usize,
    pub who_am_i_reads: usize,
    pub who_am_i_ok: usize,
    /// Distinct wrong values seen, in order of first appearance.
    pub unexpected_values: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub samples: usize,
    pub duration_s: f64,
    pub channels: Vec<String>,
    pub checks: Vec<CheckResult>,
    pub interval: Option<IntervalStats>,
    pub spi: Option<SpiSummary>,
    pub pass: bool,
}

impl Report {
    pub fn check(&self, name: &str) -> Option<&CheckResult> {
        self.checks.iter().find(|c| c.name == name)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| c.status == Status::Fail)
    }
}

/// Run every check the channel map allows.
pub fn analyze(capture: &Capture, cfg: &AnalysisConfig) -> Result<Report, CaptureError> {
    for ch in cfg.map.mapped() {
        capture.check_channel(ch)?;
    }
    let map = &cfg.map;
    let mut checks = Vec::new();

    // 1. LED pair complementary.
    checks.push(match (map.led0, map.led1) {
        (Some(a), Some(b)) => CheckResult::from_agreement(
            "leds_complementary",
            &agreement(capture, a, b, Relation::Opposite, cfg.skew_s),
        ),
        _ => CheckResult::skipped("leds_complementary", "LED channels not captured"),
    });

    // 2. Probes mirror the LEDs, or are complementary to each other when
    //    the LEDs themselves were not captured.
    let mirror = [(map.led0, map.probe05), (map.led1, map.probe06)];
    if mirror.iter().any(|(l, p)| l.is_some() && p.is_some()) {
        let mut worst: Option<AgreementCheck> = None;
        for (led, probe) in mirror {
            if let (Some(l), Some(p)) = (led, probe) {
                let c = agreement(capture, l, p, Relation::Same, cfg.skew_s);
                if worst.is_none_or(|w| c.violations > w.violations) {
                    worst = Some(c);
                }
            }
        }
        if let Some(c) = worst {
            checks.push(CheckResult::from_agreement("probes_mirror_leds", &c));
        }
    } else if let (Some(a), Some(b)) = (map.probe05, map.probe06) {
        checks.push(CheckResult::from_agreement(
            "probes_mirror_leds",
            &agreement(capture, a, b, Relation::Opposite, cfg.skew_s),
        ));
    } else {
        checks.push(CheckResult::skipped("probes_mirror_leds", "probe channels not captured"));
    }

    // 3. Toggle interval.
    let reference = map.led0.or(map.probe05);
    let interval = reference.and_then(|ch| interval_stats(&capture.edges(ch)));
    checks.push(match (reference, interval) {
        (None, _) => CheckResult::skipped("toggle_interval", "no LED0 or P1.05 channel"),
        (Some(_), None) => CheckResult {
            name: "toggle_interval",
            status: Status::Fail,
            detail: "fewer than two edges on the reference channel".to_owned(),
        },
        (Some(_), Some(s)) => CheckResult {
            name: "toggle_interval",
            status: if s.within(cfg.expected_interval_s, cfg.tolerance_s) {
                Status::Pass
            } else {
                Status::Fail
            },
            detail: format!(
                "median {:.3} ms over {} intervals (expected {:.3} ± {:.3} ms, min {:.3}, max {:.3})",
                s.median_s * 1e3,
                s.count,
                cfg.expected_interval_s * 1e3,
                cfg.tolerance_s * 1e3,
                s.min_s * 1e3,
                s.max_s * 1e3
            ),
        },
    });

    // 4. WHO_AM_I reads.
    let spi = map.spi().map(|ch| {
        let frames = decode_spi(capture, ch);
        let values: Vec<u8> = frames.iter().filter_map(|f| f.who_am_i()).collect();
        let mut unexpected_values = Vec::new();
        for &v in &values {
            if v != WHO_AM_I_VALUE && !unexpected_values.contains(&v) {
                unexpected_values.push(v);
            }
        }
        SpiSummary {
            frames: frames.len(),
            who_am_i_reads: values.len(),
            who_am_i_ok: values.iter().filter(|&&v| v == WHO_AM_I_VALUE).count(),
            unexpected_values,
        }
    });
    checks.push(match &spi {
        None => CheckResult::skipped("who_am_i", "SPI channels not mapped"),
        Some(s) if s.who_am_i_reads == 0 => CheckResult {
            name: "who_am_i",
            status: Status::Fail,
            detail: format!("no WHO_AM_I reads among {} SPI frames", s.frames),
        },
        Some(s) => CheckResult {
            name: "who_am_i",
            status: if s.who_am_i_ok == s.who_am_i_reads {
                Status::Pass
            } else {
                Status::Fail
            },
            detail: format!(
                "{}/{} reads returned 0x{:02X}",
                s.who_am_i_ok, s.who_am_i_reads, WHO_AM_I_VALUE
            ),
        },
    });

    let pass = checks.iter().all(|c| c.status != Status::Fail);
    Ok(Report {
        samples: capture.samples().len(),
        duration_s: capture.duration_s(),
        channels: capture.channel_names().to_vec(),
        checks,
        interval,
        spi,
        pass,
    })
}
