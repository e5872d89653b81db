//! Scheduled-Timer Seam
//!
//! The wearable runtime owns a process-wide timer facility; the alarm
//! controller only needs to register three timers against it and arm or
//! cancel them. This trait captures that contract without exposing any
//! callback machinery: when a timer expires, the host dispatches to the
//! matching public handler on the controller
//! ([`on_window_start`](crate::alarm::SmartAlarmController::on_window_start),
//! [`on_alarm_deadline`](crate::alarm::SmartAlarmController::on_alarm_deadline),
//! [`check_sleep_phase`](crate::alarm::SmartAlarmController::check_sleep_phase)).
//!
//! Tests substitute a virtual implementation that records absolute
//! expiry times and replays them against a simulated clock.

/// Identifies a timer registered with a [`TimerService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u32);

impl TimerHandle {
    /// Wrap a raw slot index assigned by the service.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw slot index.
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Expiry behavior of a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Fires once per arming.
    OneShot,
    /// Fires every period until stopped.
    Periodic,
}

/// A host-provided scheduled-timer facility.
///
/// Timers are created stopped. `start` arms a timer with the period it
/// was created with; `restart` re-arms it with a new delay, replacing
/// any pending expiry. Stopping a timer that is not running is a no-op.
pub trait TimerService {
    /// Register a named timer. The name identifies the timer to the
    /// host's dispatch loop and in diagnostics.
    fn create(&mut self, name: &'static str, mode: TimerMode, period_secs: u32) -> TimerHandle;

    /// Arm the timer with its configured period.
    fn start(&mut self, handle: TimerHandle);

    /// Re-arm the timer with a new delay, replacing any pending expiry.
    /// For periodic timers the new delay becomes the period.
    fn restart(&mut self, handle: TimerHandle, delay_secs: u32);

    /// Cancel any pending expiry.
    fn stop(&mut self, handle: TimerHandle);
}
