//! System Task Bus Seam
//!
//! The only message the subsystem produces: a discrete notification that
//! the smart alarm went off, consumed by the system task to light the
//! screen and start the vibration pattern.

/// Messages posted on the system task bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemMessage {
    /// The smart alarm fired; the UI should begin alerting the user.
    SmartAlarmFired = 0,
}

#[cfg(feature = "defmt")]
impl defmt::Format for SystemMessage {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::SmartAlarmFired => defmt::write!(fmt, "smart alarm fired"),
        }
    }
}

/// Sink for messages to the system task.
pub trait MessageBus {
    /// Post a message. Delivery is fire-and-forget.
    fn push(&mut self, message: SystemMessage);
}
