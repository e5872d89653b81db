//! WakeGuard Core - Smart-Alarm Subsystem for Wrist-Worn Devices
//!
//! ## Overview
//!
//! WakeGuard Core implements the two tightly coupled components of a
//! smart alarm: a persistent ring log of heart-rate samples, and a
//! timer-driven controller that wakes the sleeper near a configured
//! time, preferring a moment of light sleep detected from that log.
//!
//! ## Architecture
//!
//! ```text
//!  sensor feed ──► HrLog ◄────────┐ recent samples
//!                   │             │
//!                   │ flash file  │
//!                   ▼             │
//!              Filesystem    SmartAlarmController ──► MessageBus
//!                   ▲             │        │
//!                   │ flash file  │        │ cadence override
//!                   └─────────────┘   SettingsStore
//!                                          │
//!                        Clock ◄───────────┘ timer deltas
//!                        TimerService ◄── three timers
//! ```
//!
//! Everything the subsystem touches in the outside world sits behind a
//! trait seam: the flash filesystem, the wall clock, the scheduled-timer
//! facility, the device settings store, and the system task bus. On the
//! device those are thin wrappers over the firmware services; in tests
//! they are virtual implementations driven by a simulated clock.
//!
//! ## Design principles
//!
//! ### 1. The hard deadline is sacred
//! Every failure path (lost samples, corrupt files, starved classifier)
//! degrades only the early wake. The deadline timer is armed from the
//! wall clock alone and always fires.
//!
//! ### 2. Fixed memory
//! Sample snapshots use fixed-capacity vectors, records serialize into
//! stack arrays, and the ring never grows. There is no allocator
//! requirement outside the optional std helpers.
//!
//! ### 3. Errors stop here
//! Persistence errors are logged and absorbed at the component boundary.
//! The UI observes the subsystem only through state accessors; there is
//! no error type in the public API of either component.
//!
//! ## Usage
//!
//! ```no_run
//! use wakeguard_core::alarm::SmartAlarmController;
//! use wakeguard_core::hrlog::HrLog;
//! use wakeguard_core::storage::MemoryFs;
//! use wakeguard_core::time::FixedClock;
//! # use wakeguard_core::messages::{MessageBus, SystemMessage};
//! # use wakeguard_core::settings::SettingsStore;
//! # use wakeguard_core::timer::{TimerHandle, TimerMode, TimerService};
//! # struct NoTimers;
//! # impl TimerService for NoTimers {
//! #     fn create(&mut self, _: &'static str, _: TimerMode, _: u32) -> TimerHandle {
//! #         TimerHandle::new(0)
//! #     }
//! #     fn start(&mut self, _: TimerHandle) {}
//! #     fn restart(&mut self, _: TimerHandle, _: u32) {}
//! #     fn stop(&mut self, _: TimerHandle) {}
//! # }
//! # struct NoSettings;
//! # impl SettingsStore for NoSettings {
//! #     fn hr_background_interval(&self) -> Option<u16> { None }
//! #     fn set_hr_background_interval(&mut self, _: Option<u16>) {}
//! # }
//! # struct NoBus;
//! # impl MessageBus for NoBus {
//! #     fn push(&mut self, _: SystemMessage) {}
//! # }
//!
//! let fs = MemoryFs::new();
//! let clock = FixedClock::new(1_700_000_000);
//!
//! // The log and the controller share the clock and the volume.
//! let mut hr_log = HrLog::new(fs.clone(), &clock);
//! hr_log.init();
//!
//! let mut alarm = SmartAlarmController::new(fs.clone(), &clock, NoTimers, NoSettings, NoBus);
//! alarm.init();
//!
//! alarm.set_alarm_time(7, 0);
//! alarm.schedule_alarm();
//!
//! // Sensor feed and timer expirations arrive on the same task:
//! hr_log.add_measurement(58);
//! alarm.check_sleep_phase(&mut hr_log);
//! ```
//!
//! ## Feature flags
//!
//! - `std` (default): host clock in the local timezone, the in-memory
//!   and directory-backed filesystems.
//! - `defmt`: `defmt::Format` implementations for the public enums.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod alarm;
pub mod constants;
pub mod errors;
pub mod hrlog;
pub mod messages;
pub mod phase;
pub mod settings;
pub mod storage;
pub mod time;
pub mod timer;

// Public API
pub use alarm::SmartAlarmController;
pub use errors::{FsError, StorageError};
pub use hrlog::{HrEntry, HrHistory, HrLog};
pub use messages::{MessageBus, SystemMessage};
pub use phase::SleepPhase;
pub use settings::{AlarmSettings, SettingsStore};
pub use storage::{Filesystem, OpenMode};
pub use time::{CivilTime, Clock};
pub use timer::{TimerHandle, TimerMode, TimerService};

/// WakeGuard Core library version
///
/// Useful for runtime version checks and telemetry
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
