//! Wall-Clock Abstraction for Alarm Scheduling
//!
//! ## Overview
//!
//! The alarm controller needs three things from a clock: the current
//! epoch time, a conversion into local broken-down time (so "07:00" can
//! be anchored onto today's date), and the inverse conversion back into
//! an epoch. On the wearable these come from the RTC and the device's
//! timezone configuration; on a host they come from the system clock.
//!
//! ## DST handling
//!
//! Daylight-saving resolution belongs to the clock, not to the alarm
//! logic. [`Clock::from_civil`] receives a wall time with no UTC offset
//! attached and must decide what instant it maps to:
//!
//! - An unambiguous wall time maps to its single instant.
//! - A repeated wall time (fall-back) maps to the earliest occurrence.
//! - A nonexistent wall time (spring-forward gap) slides forward one
//!   hour, the same normalization `mktime` applies.
//!
//! [`SystemClock`] implements exactly that policy through the host
//! timezone database. [`FixedClock`] sidesteps the question by living in
//! UTC, which keeps scheduling tests deterministic.
//!
//! ## Timestamp format
//!
//! Epoch seconds as `u32`, matching the width of the timestamps stored
//! in the heart-rate ring. That holds until 2106, comfortably past the
//! service life of the device.

use core::cell::Cell;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

#[cfg(feature = "std")]
use chrono::{Local, TimeZone};

/// Seconds since the Unix epoch.
pub type EpochSeconds = u32;

/// A broken-down local wall time.
///
/// Carries no UTC offset; [`Clock::from_civil`] resolves it against the
/// clock's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilTime {
    /// Calendar year
    pub year: i32,
    /// Month, 1-12
    pub month: u8,
    /// Day of month, 1-31
    pub day: u8,
    /// Hour, 0-23
    pub hour: u8,
    /// Minute, 0-59
    pub minute: u8,
    /// Second, 0-59
    pub second: u8,
}

/// Source of wall-clock time and local-time conversions.
pub trait Clock {
    /// Current time in epoch seconds.
    fn now(&self) -> EpochSeconds;

    /// Convert an epoch into local broken-down time.
    fn to_civil(&self, epoch: EpochSeconds) -> CivilTime;

    /// Resolve a local wall time back into an epoch.
    ///
    /// Returns `None` when the wall time cannot be represented at all
    /// (for example a date outside the epoch range).
    fn from_civil(&self, civil: &CivilTime) -> Option<EpochSeconds>;
}

impl<C: Clock> Clock for &C {
    fn now(&self) -> EpochSeconds {
        (**self).now()
    }

    fn to_civil(&self, epoch: EpochSeconds) -> CivilTime {
        (**self).to_civil(epoch)
    }

    fn from_civil(&self, civil: &CivilTime) -> Option<EpochSeconds> {
        (**self).from_civil(civil)
    }
}

fn civil_from_naive(naive: NaiveDateTime) -> CivilTime {
    CivilTime {
        year: naive.year(),
        month: naive.month() as u8,
        day: naive.day() as u8,
        hour: naive.hour() as u8,
        minute: naive.minute() as u8,
        second: naive.second() as u8,
    }
}

fn naive_from_civil(civil: &CivilTime) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(civil.year, civil.month as u32, civil.day as u32)?.and_hms_opt(
        civil.hour as u32,
        civil.minute as u32,
        civil.second as u32,
    )
}

/// Settable clock for tests and simulation.
///
/// Lives in UTC so civil conversions are pure arithmetic. Time never
/// moves on its own; call [`set`](FixedClock::set) or
/// [`advance`](FixedClock::advance) to drive it. The setters take
/// `&self` so a single instance can be shared by reference between the
/// log and the controller on one task.
#[derive(Debug, Default)]
pub struct FixedClock {
    now: Cell<EpochSeconds>,
}

impl FixedClock {
    /// Create a clock frozen at the given epoch.
    pub const fn new(epoch: EpochSeconds) -> Self {
        Self {
            now: Cell::new(epoch),
        }
    }

    /// Jump to an absolute epoch.
    pub fn set(&self, epoch: EpochSeconds) {
        self.now.set(epoch);
    }

    /// Move forward by the given number of seconds.
    pub fn advance(&self, seconds: u32) {
        self.now.set(self.now.get().wrapping_add(seconds));
    }
}

impl Clock for FixedClock {
    fn now(&self) -> EpochSeconds {
        self.now.get()
    }

    fn to_civil(&self, epoch: EpochSeconds) -> CivilTime {
        let utc = DateTime::from_timestamp(epoch as i64, 0).unwrap_or_default();
        civil_from_naive(utc.naive_utc())
    }

    fn from_civil(&self, civil: &CivilTime) -> Option<EpochSeconds> {
        let epoch = naive_from_civil(civil)?.and_utc().timestamp();
        EpochSeconds::try_from(epoch).ok()
    }
}

/// Host clock using the system timezone (std only).
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now(&self) -> EpochSeconds {
        Local::now().timestamp().max(0) as EpochSeconds
    }

    fn to_civil(&self, epoch: EpochSeconds) -> CivilTime {
        let utc = DateTime::from_timestamp(epoch as i64, 0).unwrap_or_default();
        civil_from_naive(utc.with_timezone(&Local).naive_local())
    }

    fn from_civil(&self, civil: &CivilTime) -> Option<EpochSeconds> {
        let naive = naive_from_civil(civil)?;
        let resolved = match Local.from_local_datetime(&naive) {
            chrono::LocalResult::Single(instant) => Some(instant),
            chrono::LocalResult::Ambiguous(earliest, _) => Some(earliest),
            // Spring-forward gap: the wall time does not exist locally.
            // Slide forward one hour, matching mktime normalization.
            chrono::LocalResult::None => Local
                .from_local_datetime(&(naive + chrono::Duration::hours(1)))
                .earliest(),
        }?;
        EpochSeconds::try_from(resolved.timestamp()).ok()
    }
}
