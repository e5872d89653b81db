//! Sleep-Phase Classification from Heart-Rate Telemetry
//!
//! ## Overview
//!
//! During the wake window the controller periodically classifies the
//! sleeper's current phase from the newest ring entries. The classifier
//! is a small statistical model over three signals:
//!
//! - **mean** BPM of the analysis window against a longer **baseline**
//! - **standard deviation** (population) as a variability measure
//! - **trend**: second-half mean minus first-half mean
//!
//! The heuristics follow the well-known physiology: deep sleep shows a
//! heart rate well below the sleeper's baseline with very little
//! variability, REM shows high variability, and light sleep sits in
//! between or shows the rate climbing back toward baseline at the end
//! of a cycle.
//!
//! ## Classification rules
//!
//! Evaluated in order against the analysis window, first match wins:
//!
//! | # | condition                                         | phase |
//! |---|---------------------------------------------------|-------|
//! | 1 | mean < baseline - 6 and stddev < 3                | Deep  |
//! | 2 | stddev > 7                                        | REM   |
//! | 3 | 3 <= stddev <= 7                                  | Light |
//! | 4 | trend > 2 and mean > baseline - 6                 | Light |
//! | 5 | stddev < 3 and mean >= baseline - 6               | Light |
//! | 6 | otherwise                                         | Deep  |
//!
//! This is heuristic wake-timing logic, not sleep staging in any
//! clinical sense: a wrong call costs at most a slightly less pleasant
//! wake-up, because the hard deadline fires regardless.

use crate::constants::classifier::{
    ANALYSIS_WINDOW, BASELINE_WINDOW, DEEP_MEAN_DROP_BPM, MIN_ANALYSIS_ENTRIES, REM_STDDEV_BPM,
    RISING_TREND_BPM, STEADY_STDDEV_BPM,
};
use crate::hrlog::{HrEntry, HrHistory};

/// Sleep phase assigned by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SleepPhase {
    /// Not enough data to classify
    #[default]
    Unknown = 0,
    /// Light sleep, the preferred moment to wake
    Light = 1,
    /// Deep sleep
    Deep = 2,
    /// Rapid eye movement sleep
    Rem = 3,
}

impl SleepPhase {
    /// Short label for display surfaces.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SleepPhase::Unknown => "unknown",
            SleepPhase::Light => "light",
            SleepPhase::Deep => "deep",
            SleepPhase::Rem => "rem",
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SleepPhase {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.as_str());
    }
}

/// Mean, spread, and short-horizon trend of a run of samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HrStats {
    /// Mean BPM
    pub mean: f32,
    /// Population standard deviation in BPM
    pub stddev: f32,
    /// Second-half mean minus first-half mean, in BPM
    pub trend: f32,
}

impl HrStats {
    /// Compute statistics over samples in chronological order.
    pub fn from_entries(entries: &[HrEntry]) -> Self {
        let count = entries.len();
        if count == 0 {
            return Self {
                mean: 0.0,
                stddev: 0.0,
                trend: 0.0,
            };
        }

        let sum: u32 = entries.iter().map(|e| u32::from(e.bpm)).sum();
        let mean = sum as f32 / count as f32;

        let variance = entries
            .iter()
            .map(|e| {
                let diff = f32::from(e.bpm) - mean;
                diff * diff
            })
            .sum::<f32>()
            / count as f32;
        // libm keeps this usable without the standard library
        let stddev = libm::sqrtf(variance);

        let half = count / 2;
        let trend = if half == 0 {
            0.0
        } else {
            let first: u32 = entries[..half].iter().map(|e| u32::from(e.bpm)).sum();
            let second: u32 = entries[half..].iter().map(|e| u32::from(e.bpm)).sum();
            second as f32 / (count - half) as f32 - first as f32 / half as f32
        };

        Self {
            mean,
            stddev,
            trend,
        }
    }
}

/// Classify the current sleep phase from the newest log entries.
///
/// Returns [`SleepPhase::Unknown`] when fewer than
/// [`MIN_ANALYSIS_ENTRIES`] samples are available. The baseline is the
/// window mean unless the log holds more history than the analysis
/// window, in which case up to [`BASELINE_WINDOW`] entries are averaged
/// instead.
pub fn analyze_sleep_phase<H: HrHistory>(history: &mut H) -> SleepPhase {
    let window = history.recent::<ANALYSIS_WINDOW>();
    if window.len() < MIN_ANALYSIS_ENTRIES {
        return SleepPhase::Unknown;
    }

    let stats = HrStats::from_entries(&window);

    let mut baseline = stats.mean;
    if usize::from(history.entry_count()) > ANALYSIS_WINDOW {
        let lookback = history.recent::<BASELINE_WINDOW>();
        if lookback.len() > ANALYSIS_WINDOW {
            let sum: u32 = lookback.iter().map(|e| u32::from(e.bpm)).sum();
            baseline = sum as f32 / lookback.len() as f32;
        }
    }

    classify(&stats, baseline)
}

fn classify(stats: &HrStats, baseline: f32) -> SleepPhase {
    // Deep sleep: heart rate well below baseline and very steady.
    if stats.mean < baseline - DEEP_MEAN_DROP_BPM && stats.stddev < STEADY_STDDEV_BPM {
        return SleepPhase::Deep;
    }

    // REM: high variability, rate may be elevated.
    if stats.stddev > REM_STDDEV_BPM {
        return SleepPhase::Rem;
    }

    // Light sleep: moderate variability near baseline.
    if stats.stddev >= STEADY_STDDEV_BPM && stats.stddev <= REM_STDDEV_BPM {
        return SleepPhase::Light;
    }

    // Rate climbing back toward baseline at the end of a cycle.
    if stats.trend > RISING_TREND_BPM && stats.mean > baseline - DEEP_MEAN_DROP_BPM {
        return SleepPhase::Light;
    }

    // Steady but not far below baseline.
    if stats.stddev < STEADY_STDDEV_BPM && stats.mean >= baseline - DEEP_MEAN_DROP_BPM {
        return SleepPhase::Light;
    }

    SleepPhase::Deep
}
