//! GPS fix edge tracking and periodic accuracy summary.

use crate::core::types::GpsSample;

/// Fix validity transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixEdge {
    Acquired,
    Lost,
}

/// Tracks fix availability across ticks
///
/// Only used for edge-triggered logging; publication never depends on it.
#[derive(Debug, Default)]
pub struct FixTracker {
    fix_available: bool,
    /// Set once "fix not available" has been logged, cleared on acquisition
    warned_no_fix: bool,
}

impl FixTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fix_available(&self) -> bool {
        self.fix_available
    }

    pub fn has_warned_no_fix(&self) -> bool {
        self.warned_no_fix
    }

    /// Feed one GPS sample; returns the edge it caused, if any
    pub fn observe(&mut self, sample: &GpsSample) -> Option<FixEdge> {
        let valid = sample.lat_lon_valid;
        let mut edge = None;

        if valid && !self.fix_available {
            log::info!("GPS fix available.");
            self.fix_available = true;
            self.warned_no_fix = false;
            edge = Some(FixEdge::Acquired);
        } else if !valid && self.fix_available {
            log::warn!("GPS fix lost.");
            self.fix_available = false;
            edge = Some(FixEdge::Lost);
        }

        if !valid && !self.warned_no_fix {
            log::warn!("GPS fix not available.");
            self.warned_no_fix = true;
        }

        edge
    }
}

/// One line of a periodic GPS summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SummaryLine {
    LatLonInvalid,
    HorizontalAccuracyInvalid,
    HorizontalAccuracy(f64),
}

/// Periodic GPS quality summary
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    pub lines: Vec<SummaryLine>,
}

impl SummaryReport {
    pub fn from_sample(sample: &GpsSample) -> Self {
        let mut lines = Vec::with_capacity(2);
        if !sample.lat_lon_valid {
            lines.push(SummaryLine::LatLonInvalid);
        }
        if !sample.horizontal_accuracy_valid {
            lines.push(SummaryLine::HorizontalAccuracyInvalid);
        } else if sample.lat_lon_valid {
            lines.push(SummaryLine::HorizontalAccuracy(sample.horizontal_accuracy));
        }
        Self { lines }
    }

    pub fn log(&self) {
        for line in &self.lines {
            match line {
                SummaryLine::LatLonInvalid => log::warn!("LAT/LON not valid."),
                SummaryLine::HorizontalAccuracyInvalid => {
                    log::warn!("Horizontal accuracy not valid.")
                }
                SummaryLine::HorizontalAccuracy(a) => {
                    log::info!("GPS horizontal accuracy: {:.3}", a)
                }
            }
        }
    }
}

/// Emits a [`SummaryReport`] every `2 * rate` published fixes
#[derive(Debug)]
pub struct SummaryCounter {
    period: u32,
    count: u32,
}

impl SummaryCounter {
    pub fn new(rate_hz: f64) -> Self {
        let period = (2.0 * rate_hz).round().max(1.0) as u32;
        Self { period, count: 0 }
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Count one published fix; logs and returns the summary when due
    pub fn advance(&mut self, sample: &GpsSample) -> Option<SummaryReport> {
        self.count += 1;
        if self.count < self.period {
            return None;
        }
        self.count = 0;
        let report = SummaryReport::from_sample(sample);
        report.log();
        Some(report)
    }
}
