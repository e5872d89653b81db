//! Smart-Alarm Controller
//!
//! ## Overview
//!
//! Owns the one-shot smart alarm: a hard deadline at the configured
//! time, preceded by a thirty-minute wake window in which the sleeper is
//! woken early if the heart-rate log shows light sleep. The controller
//! is a state machine driven entirely by three host timers and a handful
//! of UI calls, all serialized on one task.
//!
//! ## States
//!
//! The state is implicit in three flags:
//!
//! ```text
//!               schedule_alarm()
//!   ┌──────────┐ ───────────────► ┌──────────────┐
//!   │ disabled │                  │ armed,       │  window timer
//!   │          │ ◄─────────────── │ pre-window   │ ─────────────┐
//!   └──────────┘  disable_alarm() └──────────────┘              ▼
//!        ▲                                            ┌──────────────┐
//!        │ stop_alerting()                            │ armed,       │
//!        │                                            │ in-window    │
//!   ┌──────────┐  deadline timer, or light sleep      └──────────────┘
//!   │ alerting │ ◄───────────────────────────────────────────┘
//!   └──────────┘      (phase checks every 60 s)
//! ```
//!
//! - **disabled**: no timers pending, background heart rate untouched.
//! - **armed, pre-window**: deadline and window timers pending,
//!   background heart rate forced to the armed cadence.
//! - **armed, in-window**: phase checks run every minute; two sustained
//!   light classifications, or a transition into light from deep or REM,
//!   wake early.
//! - **alerting**: all timers stopped, background cadence restored,
//!   waiting for the user to acknowledge.
//!
//! Firing consumes the arm: acknowledging the alert disables the alarm
//! (one-shot semantics).
//!
//! ## Scheduling
//!
//! `schedule_alarm` anchors `HH:MM` onto today's local date; if that
//! instant has already passed it rolls to tomorrow. The deadline timer
//! is armed for the exact remaining seconds, the window timer for
//! thirty minutes less. When the target is already inside the window
//! the window opens synchronously before the call returns.
//!
//! ## Failure posture
//!
//! Settings-file errors never escape: a failed load keeps defaults, a
//! failed save logs a warning and stays dirty for the next attempt. A
//! starved or corrupt heart-rate log only suppresses the early wake;
//! the hard deadline is the backstop and fires regardless.

use crate::constants::alarm::{
    ARMED_HR_INTERVAL_SECS, DEADLINE_TIMER_NAME, PHASE_CHECK_PERIOD_SECS, PHASE_TIMER_NAME,
    REQUIRED_LIGHT_CHECKS, SECONDS_PER_DAY, SECONDS_PER_MINUTE, WAKE_WINDOW_MINUTES,
    WINDOW_TIMER_NAME,
};
use crate::constants::storage::{ALARM_SETTINGS_PATH, SETTINGS_RECORD_LEN, SYSTEM_DIR};
use crate::errors::{FsError, StorageError};
use crate::hrlog::HrHistory;
use crate::messages::{MessageBus, SystemMessage};
use crate::phase::{analyze_sleep_phase, SleepPhase};
use crate::settings::{AlarmSettings, SettingsStore};
use crate::storage::{Filesystem, OpenMode};
use crate::time::Clock;
use crate::timer::{TimerHandle, TimerMode, TimerService};

/// One-shot smart alarm with light-sleep early wake.
///
/// Generic over the five host seams: settings file storage, wall clock,
/// scheduled timers, the device settings store, and the system task bus.
/// All methods take `&mut self`; the host serializes calls on its timer
/// task.
pub struct SmartAlarmController<F, C, T, S, B>
where
    F: Filesystem,
    C: Clock,
    T: TimerService,
    S: SettingsStore,
    B: MessageBus,
{
    fs: F,
    clock: C,
    timers: T,
    settings_store: S,
    bus: B,

    alarm_settings: AlarmSettings,
    settings_changed: bool,
    alerting: bool,
    in_window: bool,
    current_phase: SleepPhase,
    previous_phase: SleepPhase,
    consecutive_light_checks: u8,
    /// Background interval captured when arming. `None` means nothing
    /// to restore; `Some(None)` means the store held no override.
    saved_background_interval: Option<Option<u16>>,

    window_start_timer: Option<TimerHandle>,
    alarm_deadline_timer: Option<TimerHandle>,
    phase_check_timer: Option<TimerHandle>,
}

impl<F, C, T, S, B> SmartAlarmController<F, C, T, S, B>
where
    F: Filesystem,
    C: Clock,
    T: TimerService,
    S: SettingsStore,
    B: MessageBus,
{
    /// Create an uninitialized controller. Call [`init`](Self::init)
    /// once the host runtime is up.
    pub fn new(fs: F, clock: C, timers: T, settings_store: S, bus: B) -> Self {
        Self {
            fs,
            clock,
            timers,
            settings_store,
            bus,
            alarm_settings: AlarmSettings::default(),
            settings_changed: false,
            alerting: false,
            in_window: false,
            current_phase: SleepPhase::Unknown,
            previous_phase: SleepPhase::Unknown,
            consecutive_light_checks: 0,
            saved_background_interval: None,
            window_start_timer: None,
            alarm_deadline_timer: None,
            phase_check_timer: None,
        }
    }

    /// Register the three timers, load persisted settings, and re-arm
    /// if the alarm was enabled when the device powered down.
    pub fn init(&mut self) {
        self.window_start_timer =
            Some(self.timers.create(WINDOW_TIMER_NAME, TimerMode::OneShot, 1));
        self.alarm_deadline_timer =
            Some(self.timers.create(DEADLINE_TIMER_NAME, TimerMode::OneShot, 1));
        self.phase_check_timer = Some(self.timers.create(
            PHASE_TIMER_NAME,
            TimerMode::Periodic,
            PHASE_CHECK_PERIOD_SECS,
        ));

        self.load_settings();
        if self.alarm_settings.enabled {
            log::info!("enabled alarm restored from storage, arming");
            self.schedule_alarm();
        }
    }

    /// Update the target time in RAM. Does not re-arm; call
    /// [`schedule_alarm`](Self::schedule_alarm) to apply.
    pub fn set_alarm_time(&mut self, hours: u8, minutes: u8) {
        if self.alarm_settings.hours != hours || self.alarm_settings.minutes != minutes {
            self.alarm_settings.hours = hours;
            self.alarm_settings.minutes = minutes;
            self.settings_changed = true;
        }
    }

    /// Update the enabled flag in RAM. Does not arm or disarm; call
    /// [`schedule_alarm`](Self::schedule_alarm) or
    /// [`disable_alarm`](Self::disable_alarm) to apply.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.alarm_settings.enabled != enabled {
            self.alarm_settings.enabled = enabled;
            self.settings_changed = true;
        }
    }

    /// Arm the alarm for the next occurrence of the configured time.
    ///
    /// Replaces any previous scheduling, forces the enabled flag, and
    /// switches background heart-rate sampling to the armed cadence so
    /// the classifier has data once the window opens. If the target is
    /// already inside the wake window, the window opens before this
    /// call returns.
    pub fn schedule_alarm(&mut self) {
        self.stop_timers();
        self.in_window = false;
        self.reset_phase_tracking();

        let now = self.clock.now();
        let mut civil = self.clock.to_civil(now);
        civil.hour = self.alarm_settings.hours;
        civil.minute = self.alarm_settings.minutes;
        civil.second = 0;

        let mut alarm_epoch = self.clock.from_civil(&civil).unwrap_or(now);
        if alarm_epoch <= now {
            alarm_epoch = alarm_epoch.wrapping_add(SECONDS_PER_DAY);
        }

        let seconds_to_alarm = alarm_epoch.wrapping_sub(now);
        let seconds_to_window =
            seconds_to_alarm.saturating_sub(WAKE_WINDOW_MINUTES * SECONDS_PER_MINUTE);

        if seconds_to_alarm > 0 {
            if let Some(handle) = self.alarm_deadline_timer {
                self.timers.restart(handle, seconds_to_alarm);
            }
        }

        if seconds_to_window > 0 {
            if let Some(handle) = self.window_start_timer {
                self.timers.restart(handle, seconds_to_window);
            }
        } else {
            // Already inside the window.
            self.on_window_start();
        }

        if !self.alarm_settings.enabled {
            self.alarm_settings.enabled = true;
            self.settings_changed = true;
        }

        self.enable_background_hr();

        log::info!(
            "smart alarm armed: deadline in {}s, window in {}s",
            seconds_to_alarm,
            seconds_to_window
        );
    }

    /// Disarm: stop all timers, restore the background heart-rate
    /// cadence, and clear the enabled flag.
    pub fn disable_alarm(&mut self) {
        self.stop_timers();
        self.restore_background_hr();
        self.in_window = false;
        self.reset_phase_tracking();

        if self.alarm_settings.enabled {
            self.alarm_settings.enabled = false;
            self.settings_changed = true;
        }
    }

    /// Window timer expiry: enter the wake window and start periodic
    /// phase checks. A redundant delivery while already in-window is
    /// ignored so an in-flight tick cannot reset the phase streak.
    pub fn on_window_start(&mut self) {
        if self.in_window {
            return;
        }
        log::info!("wake window open, phase tracking started");
        self.in_window = true;
        self.reset_phase_tracking();

        // Heart rate is already sampling at the armed cadence.
        if let Some(handle) = self.phase_check_timer {
            self.timers.start(handle);
        }
    }

    /// Deadline timer expiry: the configured time arrived without an
    /// early wake. Fire now.
    pub fn on_alarm_deadline(&mut self) {
        log::info!("alarm deadline reached");
        if let Some(handle) = self.phase_check_timer {
            self.timers.stop(handle);
        }
        self.in_window = false;

        if !self.alerting {
            self.trigger_wake();
        }
    }

    /// Phase timer expiry: classify the current sleep phase and wake
    /// early on a transition into light sleep or a sustained light
    /// streak. Safe to call after disarm; a stale tick does nothing.
    pub fn check_sleep_phase<H: HrHistory>(&mut self, history: &mut H) {
        if self.alerting || !self.in_window {
            return;
        }

        self.previous_phase = self.current_phase;
        self.current_phase = analyze_sleep_phase(history);

        log::debug!(
            "phase check: {} (prev {}), light streak {}",
            self.current_phase.as_str(),
            self.previous_phase.as_str(),
            self.consecutive_light_checks
        );

        if self.current_phase == SleepPhase::Light {
            self.consecutive_light_checks = self.consecutive_light_checks.saturating_add(1);

            // End of a cycle shows up as deep or REM giving way to
            // light; a steady light streak is just as good a moment.
            let transition_to_light =
                matches!(self.previous_phase, SleepPhase::Deep | SleepPhase::Rem);
            let sustained_light = self.consecutive_light_checks >= REQUIRED_LIGHT_CHECKS;

            if transition_to_light || sustained_light {
                log::info!("light sleep detected, waking ahead of the deadline");
                if let Some(handle) = self.phase_check_timer {
                    self.timers.stop(handle);
                }
                if let Some(handle) = self.alarm_deadline_timer {
                    self.timers.stop(handle);
                }
                self.in_window = false;
                self.trigger_wake();
            }
        } else {
            self.consecutive_light_checks = 0;
        }
    }

    /// User acknowledged the alert. Clears the alert state and disables
    /// the alarm (firing consumes the arm). Calling this while not
    /// alerting is a no-op.
    pub fn stop_alerting(&mut self) {
        if !self.alerting {
            return;
        }
        self.alerting = false;
        self.in_window = false;
        self.reset_phase_tracking();

        if self.alarm_settings.enabled {
            self.alarm_settings.enabled = false;
            self.settings_changed = true;
        }
    }

    /// Persist the settings record if it changed since the last save.
    /// On failure the record stays dirty and the next call retries.
    pub fn save_settings(&mut self) {
        if !self.settings_changed {
            return;
        }
        match self.persist_settings() {
            Ok(()) => self.settings_changed = false,
            Err(err) => log::warn!("alarm settings not saved: {}", err),
        }
    }

    /// Configured hour, 0-23.
    pub fn hours(&self) -> u8 {
        self.alarm_settings.hours
    }

    /// Configured minute, 0-59.
    pub fn minutes(&self) -> u8 {
        self.alarm_settings.minutes
    }

    /// Whether the alarm is armed.
    pub fn is_enabled(&self) -> bool {
        self.alarm_settings.enabled
    }

    /// Whether the wake is currently signalling.
    pub fn is_alerting(&self) -> bool {
        self.alerting
    }

    /// Whether the wake window is open.
    pub fn is_in_window(&self) -> bool {
        self.in_window
    }

    /// Most recent sleep-phase classification.
    pub fn current_phase(&self) -> SleepPhase {
        self.current_phase
    }

    fn reset_phase_tracking(&mut self) {
        self.current_phase = SleepPhase::Unknown;
        self.previous_phase = SleepPhase::Unknown;
        self.consecutive_light_checks = 0;
    }

    fn stop_timers(&mut self) {
        if let Some(handle) = self.window_start_timer {
            self.timers.stop(handle);
        }
        if let Some(handle) = self.alarm_deadline_timer {
            self.timers.stop(handle);
        }
        if let Some(handle) = self.phase_check_timer {
            self.timers.stop(handle);
        }
    }

    fn trigger_wake(&mut self) {
        self.alerting = true;
        self.restore_background_hr();
        self.bus.push(SystemMessage::SmartAlarmFired);
    }

    /// Force the armed sampling cadence, capturing whatever the store
    /// held the first time this arm cycle touches it.
    fn enable_background_hr(&mut self) {
        if self.saved_background_interval.is_none() {
            self.saved_background_interval = Some(self.settings_store.hr_background_interval());
        }
        self.settings_store
            .set_hr_background_interval(Some(ARMED_HR_INTERVAL_SECS));
    }

    /// Put back the interval captured at arm time, including "no
    /// override". Nothing happens if there is nothing to restore.
    fn restore_background_hr(&mut self) {
        if let Some(previous) = self.saved_background_interval.take() {
            self.settings_store.set_hr_background_interval(previous);
        }
    }

    fn load_settings(&mut self) {
        let mut file = match self.fs.open(ALARM_SETTINGS_PATH, OpenMode::Read) {
            Ok(file) => file,
            Err(_) => return,
        };
        let mut raw = [0u8; SETTINGS_RECORD_LEN];
        let read = self.fs.read(&mut file, &mut raw);
        let _ = self.fs.close(file);

        if let Ok(n) = read {
            if n == SETTINGS_RECORD_LEN {
                if let Ok(settings) = AlarmSettings::decode(&raw) {
                    self.alarm_settings = settings;
                }
            }
        }
    }

    fn persist_settings(&mut self) -> Result<(), StorageError> {
        if !self.fs.dir_exists(SYSTEM_DIR).unwrap_or(false) {
            self.fs.create_dir(SYSTEM_DIR)?;
        }

        let mut file = self.fs.open(ALARM_SETTINGS_PATH, OpenMode::WriteCreate)?;
        let written = self.fs.write(&mut file, &self.alarm_settings.encode());
        let closed = self.fs.close(file);

        match written {
            Ok(n) if n == SETTINGS_RECORD_LEN => {}
            Ok(_) => return Err(StorageError::Fs(FsError::Io)),
            Err(err) => return Err(err.into()),
        }
        closed?;
        Ok(())
    }
}
