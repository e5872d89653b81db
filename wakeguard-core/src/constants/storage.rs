//! Persistence Constants
//!
//! Capacities, record widths, and the fixed paths of the two files the
//! subsystem keeps on flash. All multi-byte fields in both files are
//! little-endian with explicit widths, so the layout is stable across
//! builds and architectures.

// ===== HEART-RATE RING =====

/// Number of slots in the heart-rate ring.
///
/// 480 samples at the armed one-minute cadence is eight hours, a full
/// night of sleep, in under 2.5 KiB of flash.
pub const LOG_CAPACITY: u16 = 480;

/// Minimum seconds between accepted samples.
///
/// The sensor can push readings far faster than the log needs them;
/// throttling keeps flash wear bounded regardless of the feed rate.
pub const LOG_THROTTLE_SECS: u32 = 30;

/// Serialized ring header width: version (u8), write index (u16),
/// count (u16).
pub const HEADER_LEN: usize = 5;

/// Serialized ring entry width: timestamp (u32), BPM (u8).
pub const ENTRY_LEN: usize = 5;

/// Ring file format version accepted by this build.
pub const LOG_FORMAT_VERSION: u8 = 1;

// ===== ALARM SETTINGS =====

/// Serialized alarm settings width: version, hours, minutes, reserved
/// padding, enabled flag (one byte each).
pub const SETTINGS_RECORD_LEN: usize = 5;

/// Alarm settings format version accepted by this build.
pub const SETTINGS_FORMAT_VERSION: u8 = 1;

// ===== PATHS =====

/// Directory holding the subsystem's persisted files.
pub const SYSTEM_DIR: &str = "/.system";

/// Backing file of the heart-rate ring.
pub const HR_LOG_PATH: &str = "/.system/hrlog.dat";

/// Backing file of the alarm settings record.
pub const ALARM_SETTINGS_PATH: &str = "/.system/smartalarm.dat";
