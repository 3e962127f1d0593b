//! Signal checks over a parsed capture.
//!
//! The outputs are written one after another, so two signals that
//! should agree are briefly out of step on every toggle. A disagreement
//! only counts as a violation when it lasts longer than the skew
//! tolerance.

use serde::Serialize;

use super::Capture;

/// Expected relation between two channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relation {
    /// Always at the same level (probe copying an LED).
    Same,
    /// Always at opposite levels (LED pair).
    Opposite,
}

impl Relation {
    fn holds(self, a: bool, b: bool) -> bool {
        match self {
            Self::Same => a == b,
            Self::Opposite => a != b,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgreementCheck {
    pub relation: Relation,
    /// Disagreements longer than the skew tolerance.
    pub violations: usize,
    /// Longest disagreement seen, including tolerated ones.
    pub longest_s: f64,
    pub first_violation_s: Option<f64>,
}

impl AgreementCheck {
    pub fn passed(&self) -> bool {
        self.violations == 0
    }
}

/// Check that channels `a` and `b` keep `relation` for the whole capture.
///
/// A capture that starts with both channels low is exempt until either
/// channel first changes level: that is the power-on state before the
/// first toggle. A pair that never leaves that state is a violation
/// spanning the whole capture.
pub fn agreement(capture: &Capture, a: usize, b: usize, relation: Relation, skew_s: f64) -> AgreementCheck {
    let mut check = AgreementCheck {
        relation,
        violations: 0,
        longest_s: 0.0,
        first_violation_s: None,
    };

    let samples = capture.samples();
    let first = samples.first().map(|s| (s.level(a), s.level(b)));
    let mut power_on = first == Some((false, false)) && !relation.holds(false, false);
    let mut bad_since: Option<f64> = None;

    let close = |check: &mut AgreementCheck, since: f64, until: f64| {
        let held = until - since;
        check.longest_s = check.longest_s.max(held);
        if held > skew_s {
            check.violations += 1;
            check.first_violation_s.get_or_insert(since);
        }
    };

    for s in samples {
        let levels = (s.level(a), s.level(b));
        if power_on {
            if Some(levels) == first {
                bad_since.get_or_insert(s.time_s);
                continue;
            }
            // First change: the exemption ends here.
            power_on = false;
            bad_since = None;
        }

        match (relation.holds(levels.0, levels.1), bad_since) {
            (false, None) => bad_since = Some(s.time_s),
            (true, Some(since)) => {
                close(&mut check, since, s.time_s);
                bad_since = None;
            }
            _ => {}
        }
    }

    if let (Some(since), Some(last)) = (bad_since, samples.last()) {
        close(&mut check, since, last.time_s);
    }
    check
}

/// Edge-to-edge interval statistics for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntervalStats {
    pub count: usize,
    pub median_s: f64,
    pub min_s: f64,
    pub max_s: f64,
}

impl IntervalStats {
    /// Median within `tolerance_s` of `expected_s`.
    pub fn within(&self, expected_s: f64, tolerance_s: f64) -> bool {
        (self.median_s - expected_s).abs() <= tolerance_s
    }
}

/// Statistics over the gaps between consecutive `edges`. `None` with
/// fewer than two edges.
///
/// The median is used so that the occasional short gap (the success
/// flash) or long gap (an SPI poll) does not skew the result.
pub fn interval_stats(edges: &[f64]) -> Option<IntervalStats> {
    let mut gaps: Vec<f64> = edges.windows(2).map(|w| w[1] - w[0]).collect();
    if gaps.is_empty() {
        return None;
    }
    gaps.sort_by(f64::total_cmp);

    let n = gaps.len();
    let median_s = if n % 2 == 1 {
        gaps[n / 2]
    } else {
        (gaps[n / 2 - 1] + gaps[n / 2]) / 2.0
    };
    Some(IntervalStats {
        count: n,
        median_s,
        min_s: gaps[0],
        max_s: gaps[n - 1],
    })
}
