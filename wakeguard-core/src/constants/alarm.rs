//! Alarm Scheduling Constants
//!
//! Geometry of the wake window, the cadences the controller runs at
//! while armed, and the thresholds that decide an early wake.

// ===== TIME UNIT CONVERSIONS =====

/// Seconds per minute.
pub const SECONDS_PER_MINUTE: u32 = 60;

/// Seconds per day, used to roll an already-passed alarm time over to
/// tomorrow.
pub const SECONDS_PER_DAY: u32 = 24 * 60 * SECONDS_PER_MINUTE;

// ===== WAKE WINDOW =====

/// How long before the configured alarm time the wake window opens
/// (minutes).
///
/// Thirty minutes covers the tail of a typical 90-minute sleep cycle, so
/// a light phase is likely to occur inside the window without moving the
/// wake-up noticeably earlier than the user asked for.
pub const WAKE_WINDOW_MINUTES: u32 = 30;

/// Seconds between sleep-phase classifications while inside the wake
/// window.
///
/// Matches the forced background heart-rate cadence: checking more often
/// would re-read the same samples.
pub const PHASE_CHECK_PERIOD_SECS: u32 = 60;

/// Consecutive light-sleep classifications required for a sustained-light
/// early wake.
///
/// Two checks (two minutes) filter out a single noisy classification
/// without eating much of the window.
pub const REQUIRED_LIGHT_CHECKS: u8 = 2;

/// Background heart-rate sampling interval forced while the alarm is
/// armed (seconds).
///
/// One sample per minute keeps the classifier fed while staying within
/// the sensor's power budget for a full night.
pub const ARMED_HR_INTERVAL_SECS: u16 = 60;

// ===== TIMER IDENTITIES =====

/// Name of the one-shot timer that opens the wake window.
pub const WINDOW_TIMER_NAME: &str = "smart-window";

/// Name of the one-shot timer that enforces the hard deadline.
pub const DEADLINE_TIMER_NAME: &str = "smart-deadline";

/// Name of the periodic timer that drives phase classification.
pub const PHASE_TIMER_NAME: &str = "smart-phase";
