//! Common fixtures for the integration suite
//!
//! Provides:
//! - A shared, manually driven wall clock
//! - A virtual timer service that replays expirations in order
//! - In-RAM settings store and a recording message bus
//! - A `Rig` bundling the five seams the way the firmware wires them
//!
//! Everything shares state through cheap clones, mirroring how the
//! device hangs all collaborators off one timer task.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wakeguard_core::alarm::SmartAlarmController;
use wakeguard_core::constants::alarm::{
    DEADLINE_TIMER_NAME, PHASE_TIMER_NAME, WINDOW_TIMER_NAME,
};
use wakeguard_core::hrlog::HrLog;
use wakeguard_core::messages::{MessageBus, SystemMessage};
use wakeguard_core::settings::SettingsStore;
use wakeguard_core::storage::MemoryFs;
use wakeguard_core::time::{CivilTime, Clock, FixedClock};
use wakeguard_core::timer::{TimerHandle, TimerMode, TimerService};

/// Manually driven wall clock; clones share the current time.
///
/// Lives in UTC like [`FixedClock`], to which it delegates the civil
/// conversions.
#[derive(Debug, Clone, Default)]
pub struct TestClock {
    now: Rc<Cell<u32>>,
}

impl TestClock {
    pub fn new(epoch: u32) -> Self {
        Self {
            now: Rc::new(Cell::new(epoch)),
        }
    }

    pub fn set(&self, epoch: u32) {
        self.now.set(epoch);
    }

    pub fn advance(&self, seconds: u32) {
        self.now.set(self.now.get() + seconds);
    }

    pub fn get(&self) -> u32 {
        self.now.get()
    }
}

impl Clock for TestClock {
    fn now(&self) -> u32 {
        self.now.get()
    }

    fn to_civil(&self, epoch: u32) -> CivilTime {
        FixedClock::new(0).to_civil(epoch)
    }

    fn from_civil(&self, civil: &CivilTime) -> Option<u32> {
        FixedClock::new(0).from_civil(civil)
    }
}

/// Epoch seconds of a UTC wall time; panics on invalid dates.
pub fn epoch(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> u32 {
    FixedClock::new(0)
        .from_civil(&CivilTime {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
        .expect("valid civil time")
}

/// A timer expiry observed by [`VirtualTimers::pop_due`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub name: &'static str,
    pub at: u32,
}

#[derive(Debug)]
struct TimerSlot {
    name: &'static str,
    mode: TimerMode,
    period_secs: u32,
    due: Option<u32>,
}

/// Timer service recording absolute expiry times against the shared
/// clock; clones share the slot table.
#[derive(Clone)]
pub struct VirtualTimers {
    clock: TestClock,
    slots: Rc<RefCell<Vec<TimerSlot>>>,
}

impl VirtualTimers {
    pub fn new(clock: TestClock) -> Self {
        Self {
            clock,
            slots: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.slots
            .borrow()
            .iter()
            .any(|slot| slot.name == name && slot.due.is_some())
    }

    pub fn due_at(&self, name: &str) -> Option<u32> {
        self.slots
            .borrow()
            .iter()
            .find(|slot| slot.name == name)
            .and_then(|slot| slot.due)
    }

    /// Retire and return the earliest timer due at or before `until`,
    /// advancing the shared clock to the fire time. Periodic timers
    /// re-arm themselves. Ties fire in creation order.
    pub fn pop_due(&self, until: u32) -> Option<FiredTimer> {
        let mut slots = self.slots.borrow_mut();
        let mut best: Option<(usize, u32)> = None;
        for (index, slot) in slots.iter().enumerate() {
            if let Some(due) = slot.due {
                if due <= until && best.map_or(true, |(_, earliest)| due < earliest) {
                    best = Some((index, due));
                }
            }
        }
        let (index, at) = best?;
        let fired = FiredTimer {
            name: slots[index].name,
            at,
        };
        match slots[index].mode {
            TimerMode::OneShot => slots[index].due = None,
            TimerMode::Periodic => slots[index].due = Some(at + slots[index].period_secs),
        }
        drop(slots);

        if self.clock.get() < at {
            self.clock.set(at);
        }
        Some(fired)
    }
}

impl TimerService for VirtualTimers {
    fn create(&mut self, name: &'static str, mode: TimerMode, period_secs: u32) -> TimerHandle {
        let mut slots = self.slots.borrow_mut();
        slots.push(TimerSlot {
            name,
            mode,
            period_secs,
            due: None,
        });
        TimerHandle::new((slots.len() - 1) as u32)
    }

    fn start(&mut self, handle: TimerHandle) {
        let mut slots = self.slots.borrow_mut();
        let slot = &mut slots[handle.raw() as usize];
        slot.due = Some(self.clock.get() + slot.period_secs);
    }

    fn restart(&mut self, handle: TimerHandle, delay_secs: u32) {
        let mut slots = self.slots.borrow_mut();
        let slot = &mut slots[handle.raw() as usize];
        slot.period_secs = delay_secs;
        slot.due = Some(self.clock.get() + delay_secs);
    }

    fn stop(&mut self, handle: TimerHandle) {
        self.slots.borrow_mut()[handle.raw() as usize].due = None;
    }
}

/// In-RAM settings store; clones share the stored interval.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    interval: Rc<Cell<Option<u16>>>,
}

impl MemorySettings {
    pub fn interval(&self) -> Option<u16> {
        self.interval.get()
    }

    pub fn set(&self, interval: Option<u16>) {
        self.interval.set(interval);
    }
}

impl SettingsStore for MemorySettings {
    fn hr_background_interval(&self) -> Option<u16> {
        self.interval.get()
    }

    fn set_hr_background_interval(&mut self, interval: Option<u16>) {
        self.interval.set(interval);
    }
}

/// Recording message bus; clones share the record.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Rc<RefCell<Vec<SystemMessage>>>,
}

impl MessageLog {
    pub fn fired_count(&self) -> usize {
        self.messages
            .borrow()
            .iter()
            .filter(|message| **message == SystemMessage::SmartAlarmFired)
            .count()
    }
}

impl MessageBus for MessageLog {
    fn push(&mut self, message: SystemMessage) {
        self.messages.borrow_mut().push(message);
    }
}

pub type TestController =
    SmartAlarmController<MemoryFs, TestClock, VirtualTimers, MemorySettings, MessageLog>;
pub type TestLog = HrLog<MemoryFs, TestClock>;

/// The five seams wired the way the firmware wires them.
pub struct Rig {
    pub fs: MemoryFs,
    pub clock: TestClock,
    pub timers: VirtualTimers,
    pub settings: MemorySettings,
    pub bus: MessageLog,
}

impl Rig {
    pub fn new(start: u32) -> Self {
        let clock = TestClock::new(start);
        Self {
            fs: MemoryFs::new(),
            timers: VirtualTimers::new(clock.clone()),
            settings: MemorySettings::default(),
            bus: MessageLog::default(),
            clock,
        }
    }

    /// Simulate a power cycle at `at`: the filesystem and the settings
    /// store survive, timers and pending messages do not.
    pub fn reboot(&self, at: u32) -> Self {
        let clock = TestClock::new(at);
        Self {
            fs: self.fs.clone(),
            timers: VirtualTimers::new(clock.clone()),
            settings: self.settings.clone(),
            bus: MessageLog::default(),
            clock,
        }
    }

    /// A controller wired to this rig, already initialized.
    pub fn controller(&self) -> TestController {
        let mut controller = SmartAlarmController::new(
            self.fs.clone(),
            self.clock.clone(),
            self.timers.clone(),
            self.settings.clone(),
            self.bus.clone(),
        );
        controller.init();
        controller
    }

    /// A heart-rate log over this rig's volume, already initialized.
    pub fn hr_log(&self) -> TestLog {
        let mut log = HrLog::new(self.fs.clone(), self.clock.clone());
        log.init();
        log
    }

    /// Fire every timer due up to `until` in order, dispatching each to
    /// the controller, then settle the clock at `until`.
    pub fn run_until(&self, controller: &mut TestController, hr_log: &mut TestLog, until: u32) {
        while let Some(fired) = self.timers.pop_due(until) {
            self.dispatch(controller, hr_log, fired.name);
        }
        if self.clock.get() < until {
            self.clock.set(until);
        }
    }

    /// Route a timer expiry to the matching controller handler.
    pub fn dispatch(&self, controller: &mut TestController, hr_log: &mut TestLog, name: &str) {
        match name {
            WINDOW_TIMER_NAME => controller.on_window_start(),
            DEADLINE_TIMER_NAME => controller.on_alarm_deadline(),
            PHASE_TIMER_NAME => controller.check_sleep_phase(hr_log),
            other => panic!("unexpected timer {other}"),
        }
    }
}
