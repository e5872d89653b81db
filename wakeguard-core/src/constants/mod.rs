//! Constants for WakeGuard Core
//!
//! This module centralizes every tunable used by the smart-alarm
//! subsystem. All numeric values are defined here with an explanation of
//! their purpose so no magic numbers leak into the control flow.
//!
//! ## Organization
//!
//! Constants are grouped by domain:
//! - **Alarm**: wake-window geometry, timer cadences, wake thresholds
//! - **Classifier**: sleep-phase analysis windows and BPM thresholds
//! - **Storage**: ring capacity, record widths, on-flash paths

/// Wake-window geometry, timer cadences, and wake decision thresholds.
pub mod alarm;

/// Sleep-phase classifier windows and heart-rate thresholds.
pub mod classifier;

/// Ring-log capacity, record widths, and persisted file paths.
pub mod storage;

// Re-export commonly used constants for convenience
pub use alarm::{
    ARMED_HR_INTERVAL_SECS, PHASE_CHECK_PERIOD_SECS, REQUIRED_LIGHT_CHECKS, WAKE_WINDOW_MINUTES,
};

pub use classifier::{ANALYSIS_WINDOW, BASELINE_WINDOW, MIN_ANALYSIS_ENTRIES};

pub use storage::{LOG_CAPACITY, LOG_THROTTLE_SECS};
