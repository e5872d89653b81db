//! Sleep-Phase Classifier Constants
//!
//! Analysis window sizes and the BPM thresholds separating the sleep
//! phases. All thresholds are in beats per minute and compare against
//! statistics over the most recent logged samples.

// ===== ANALYSIS WINDOWS =====

/// Number of recent samples classified on each phase check.
///
/// At the armed one-minute sampling cadence this spans roughly ten
/// minutes, long enough to smooth sensor noise but short enough to catch
/// a phase transition within a couple of checks.
pub const ANALYSIS_WINDOW: usize = 10;

/// Minimum samples required before classification is attempted.
///
/// Below this the statistics are dominated by noise; the classifier
/// reports an unknown phase instead.
pub const MIN_ANALYSIS_ENTRIES: usize = 5;

/// Maximum samples used to estimate the sleeper's baseline heart rate.
///
/// Up to an hour of history at the armed cadence. The baseline replaces
/// the window mean only when the log actually holds more data than the
/// analysis window.
pub const BASELINE_WINDOW: usize = 60;

// ===== PHASE THRESHOLDS =====

/// How far the mean must sit below baseline to indicate deep sleep (BPM).
pub const DEEP_MEAN_DROP_BPM: f32 = 6.0;

/// Standard deviation below which the heart rate counts as steady (BPM).
pub const STEADY_STDDEV_BPM: f32 = 3.0;

/// Standard deviation above which variability indicates REM sleep (BPM).
pub const REM_STDDEV_BPM: f32 = 7.0;

/// Rising trend (second half mean minus first half mean) that signals a
/// climb out of deep sleep (BPM).
pub const RISING_TREND_BPM: f32 = 2.0;
