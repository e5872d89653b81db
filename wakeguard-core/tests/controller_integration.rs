//! End-to-end alarm scenarios: deadline backstop, early wake on a light
//! transition, sustained light, background cadence save/restore, and
//! one-shot semantics across a simulated power cycle.

mod common;

use common::{epoch, Rig};
use wakeguard_core::constants::alarm::{
    ARMED_HR_INTERVAL_SECS, DEADLINE_TIMER_NAME, PHASE_TIMER_NAME, WINDOW_TIMER_NAME,
};
use wakeguard_core::constants::storage::ALARM_SETTINGS_PATH;
use wakeguard_core::phase::SleepPhase;

#[test]
fn deadline_fires_once_with_an_empty_log() {
    // Alarm five minutes out: already inside the wake window.
    let start = epoch(2024, 6, 15, 10, 0, 0);
    let rig = Rig::new(start);
    let mut controller = rig.controller();
    let mut hr_log = rig.hr_log();

    controller.set_alarm_time(10, 5);
    controller.schedule_alarm();

    // The window opened synchronously; the deadline is armed for the
    // exact remaining seconds.
    assert!(controller.is_in_window());
    assert!(controller.is_enabled());
    assert!(!controller.is_alerting());
    assert_eq!(rig.timers.due_at(DEADLINE_TIMER_NAME), Some(start + 300));
    assert!(!rig.timers.is_running(WINDOW_TIMER_NAME));
    assert!(rig.timers.is_running(PHASE_TIMER_NAME));

    rig.run_until(&mut controller, &mut hr_log, start + 300);

    // Phase checks against the empty log stayed unknown; the deadline
    // fired exactly once.
    assert_eq!(controller.current_phase(), SleepPhase::Unknown);
    assert!(controller.is_alerting());
    assert!(!controller.is_in_window());
    assert_eq!(rig.bus.fired_count(), 1);

    // No stragglers: nothing else fires afterwards.
    rig.run_until(&mut controller, &mut hr_log, start + 3600);
    assert_eq!(rig.bus.fired_count(), 1);
}

#[test]
fn early_wake_on_transition_out_of_deep_sleep() {
    let start = epoch(2024, 6, 15, 6, 0, 0);
    let deadline_epoch = start + 3600;
    let window_epoch = deadline_epoch - 1800;

    let rig = Rig::new(start);
    let mut controller = rig.controller();
    let mut hr_log = rig.hr_log();

    // Overnight baseline near 60 BPM, ending before arming.
    let mut t = start - 55 * 30;
    for _ in 0..55 {
        rig.clock.set(t);
        hr_log.add_measurement(60);
        t += 30;
    }
    rig.clock.set(start);

    controller.set_alarm_time(7, 0);
    controller.schedule_alarm();

    assert!(!controller.is_in_window());
    assert_eq!(rig.timers.due_at(WINDOW_TIMER_NAME), Some(window_epoch));
    assert_eq!(rig.timers.due_at(DEADLINE_TIMER_NAME), Some(deadline_epoch));

    // Steady low heart rate approaching the window: deep sleep.
    let mut t = window_epoch - 10 * 30;
    for _ in 0..10 {
        rig.clock.set(t);
        hr_log.add_measurement(52);
        t += 30;
    }

    // Window opens; the first check classifies deep sleep.
    rig.run_until(&mut controller, &mut hr_log, window_epoch + 60);
    assert!(controller.is_in_window());
    assert_eq!(controller.current_phase(), SleepPhase::Deep);
    assert_eq!(rig.bus.fired_count(), 0);

    // Heart rate turns upward before the next check.
    rig.clock.set(window_epoch + 70);
    hr_log.add_measurement(58);
    rig.clock.set(window_epoch + 100);
    hr_log.add_measurement(58);

    rig.run_until(&mut controller, &mut hr_log, window_epoch + 120);

    // Deep gave way to light: woken well before the deadline, and never
    // before the window opened.
    assert!(controller.is_alerting());
    assert_eq!(controller.current_phase(), SleepPhase::Light);
    assert_eq!(rig.bus.fired_count(), 1);
    assert!(rig.clock.get() < deadline_epoch);
    assert!(rig.clock.get() >= window_epoch);
    assert!(!rig.timers.is_running(DEADLINE_TIMER_NAME));
    assert!(!rig.timers.is_running(PHASE_TIMER_NAME));

    // The stopped deadline never fires.
    rig.run_until(&mut controller, &mut hr_log, deadline_epoch + 60);
    assert_eq!(rig.bus.fired_count(), 1);
}

#[test]
fn early_wake_on_sustained_light_sleep() {
    let start = epoch(2024, 6, 15, 22, 0, 0);
    let window_epoch = start + 2700 - 1800; // alarm 22:45

    let rig = Rig::new(start);
    let mut controller = rig.controller();
    let mut hr_log = rig.hr_log();

    // Moderate variability: alternating 55/62 sits in the light band.
    let mut t = start + 60;
    for i in 0..10u8 {
        rig.clock.set(t);
        hr_log.add_measurement(if i % 2 == 0 { 55 } else { 62 });
        t += 30;
    }
    rig.clock.set(start + 500);

    controller.set_alarm_time(22, 45);
    controller.schedule_alarm();

    // First check: light, but a single check is not sustained and
    // unknown-to-light is no transition.
    rig.run_until(&mut controller, &mut hr_log, window_epoch + 60);
    assert_eq!(controller.current_phase(), SleepPhase::Light);
    assert!(!controller.is_alerting());
    assert_eq!(rig.bus.fired_count(), 0);

    // Second consecutive light check wakes.
    rig.run_until(&mut controller, &mut hr_log, window_epoch + 120);
    assert!(controller.is_alerting());
    assert_eq!(rig.bus.fired_count(), 1);
}

#[test]
fn window_start_redelivery_keeps_the_light_streak() {
    let start = epoch(2024, 6, 15, 22, 0, 0);
    let window_epoch = start + 2700 - 1800;

    let rig = Rig::new(start);
    let mut controller = rig.controller();
    let mut hr_log = rig.hr_log();

    let mut t = start + 60;
    for i in 0..10u8 {
        rig.clock.set(t);
        hr_log.add_measurement(if i % 2 == 0 { 55 } else { 62 });
        t += 30;
    }
    rig.clock.set(start + 500);

    controller.set_alarm_time(22, 45);
    controller.schedule_alarm();

    // One light check on the books.
    rig.run_until(&mut controller, &mut hr_log, window_epoch + 60);
    assert_eq!(controller.current_phase(), SleepPhase::Light);
    assert!(!controller.is_alerting());

    // A stale window-start tick must not reset the streak.
    controller.on_window_start();

    rig.run_until(&mut controller, &mut hr_log, window_epoch + 120);
    assert!(controller.is_alerting());
    assert_eq!(rig.bus.fired_count(), 1);
}

#[test]
fn background_cadence_is_forced_and_restored() {
    let start = epoch(2024, 6, 15, 21, 0, 0);

    // No override stored: arming forces the armed cadence, disarming
    // clears it again.
    let rig = Rig::new(start);
    let mut controller = rig.controller();
    assert_eq!(rig.settings.interval(), None);

    controller.set_alarm_time(23, 0);
    controller.schedule_alarm();
    assert_eq!(rig.settings.interval(), Some(ARMED_HR_INTERVAL_SECS));

    controller.disable_alarm();
    assert_eq!(rig.settings.interval(), None);

    // A user-configured interval is captured once and put back on wake,
    // even across a re-arm.
    let rig = Rig::new(start);
    rig.settings.set(Some(300));
    let mut controller = rig.controller();
    let mut hr_log = rig.hr_log();

    controller.set_alarm_time(23, 0);
    controller.schedule_alarm();
    assert_eq!(rig.settings.interval(), Some(ARMED_HR_INTERVAL_SECS));

    controller.schedule_alarm(); // re-arm keeps the original capture
    assert_eq!(rig.settings.interval(), Some(ARMED_HR_INTERVAL_SECS));

    rig.run_until(&mut controller, &mut hr_log, start + 3 * 3600);
    assert!(controller.is_alerting());
    assert_eq!(rig.settings.interval(), Some(300));
}

#[test]
fn firing_consumes_the_arm() {
    let start = epoch(2024, 6, 15, 10, 0, 0);
    let rig = Rig::new(start);
    let mut controller = rig.controller();
    let mut hr_log = rig.hr_log();

    controller.set_alarm_time(10, 5);
    controller.schedule_alarm();
    rig.run_until(&mut controller, &mut hr_log, start + 300);
    assert!(controller.is_alerting());

    controller.stop_alerting();
    assert!(!controller.is_alerting());
    assert!(!controller.is_enabled());
    assert!(!controller.is_in_window());
    assert_eq!(controller.current_phase(), SleepPhase::Unknown);

    // Across a power cycle the alarm stays off.
    controller.save_settings();
    let rebooted = rig.reboot(start + 4000);
    let controller = rebooted.controller();
    assert!(!controller.is_enabled());
    assert!(!rebooted.timers.is_running(DEADLINE_TIMER_NAME));
}

#[test]
fn stop_alerting_while_idle_changes_nothing() {
    let start = epoch(2024, 6, 15, 10, 0, 0);
    let rig = Rig::new(start);
    let mut controller = rig.controller();

    controller.set_alarm_time(11, 0);
    controller.schedule_alarm();
    assert!(controller.is_enabled());

    // Not alerting: acknowledged out of turn, nothing moves.
    controller.stop_alerting();
    assert!(controller.is_enabled());
    assert!(rig.timers.is_running(DEADLINE_TIMER_NAME));
}

#[test]
fn disable_cancels_all_scheduling() {
    let start = epoch(2024, 6, 15, 10, 0, 0);
    let rig = Rig::new(start);
    let mut controller = rig.controller();
    let mut hr_log = rig.hr_log();

    controller.set_alarm_time(11, 0);
    controller.schedule_alarm();
    controller.disable_alarm();

    assert!(!controller.is_enabled());
    assert!(!rig.timers.is_running(DEADLINE_TIMER_NAME));
    assert!(!rig.timers.is_running(WINDOW_TIMER_NAME));
    assert!(!rig.timers.is_running(PHASE_TIMER_NAME));

    // Nothing fires, ever.
    rig.run_until(&mut controller, &mut hr_log, start + 2 * 86_400);
    assert_eq!(rig.bus.fired_count(), 0);
}

#[test]
fn enabled_alarm_rearms_after_a_power_cycle() {
    let start = epoch(2024, 6, 15, 21, 30, 0);
    let rig = Rig::new(start);
    let mut controller = rig.controller();

    controller.set_alarm_time(6, 30);
    controller.schedule_alarm();
    controller.save_settings();
    assert!(rig.fs.contains(ALARM_SETTINGS_PATH));

    // Power cycle mid-evening: settings survive, init re-arms.
    let rebooted = rig.reboot(epoch(2024, 6, 15, 22, 0, 0));
    let controller = rebooted.controller();

    assert_eq!(controller.hours(), 6);
    assert_eq!(controller.minutes(), 30);
    assert!(controller.is_enabled());
    assert_eq!(
        rebooted.timers.due_at(DEADLINE_TIMER_NAME),
        Some(epoch(2024, 6, 16, 6, 30, 0))
    );
}

#[test]
fn alarm_time_already_passed_rolls_to_tomorrow() {
    let start = epoch(2024, 6, 15, 10, 0, 0);
    let rig = Rig::new(start);
    let mut controller = rig.controller();

    controller.set_alarm_time(9, 0);
    controller.schedule_alarm();

    assert_eq!(
        rig.timers.due_at(DEADLINE_TIMER_NAME),
        Some(epoch(2024, 6, 16, 9, 0, 0))
    );
    assert!(!controller.is_in_window());
}

#[test]
fn unchanged_settings_are_not_rewritten() {
    let start = epoch(2024, 6, 15, 10, 0, 0);
    let rig = Rig::new(start);
    let mut controller = rig.controller();

    // Defaults written back unchanged: nothing is dirty, no file
    // appears.
    controller.set_alarm_time(7, 0);
    controller.set_enabled(false);
    controller.save_settings();
    assert!(!rig.fs.contains(ALARM_SETTINGS_PATH));

    controller.set_alarm_time(6, 30);
    controller.save_settings();
    assert!(rig.fs.contains(ALARM_SETTINGS_PATH));
}
