//! Alarm Settings Record and the Settings-Store Seam
//!
//! The alarm's one-shot configuration (`hours`, `minutes`, `enabled`)
//! persists as a 5-byte record on flash so it survives reboots. The
//! record is versioned; a load that finds an unknown version keeps the
//! defaults rather than guessing at the layout.
//!
//! The device-wide settings store also holds the background heart-rate
//! sampling interval, which the controller temporarily overrides while
//! the alarm is armed. Only that one key is consumed here, so the seam
//! is exactly two methods.

use crate::constants::storage::{SETTINGS_FORMAT_VERSION, SETTINGS_RECORD_LEN};
use crate::errors::StorageError;

/// One-shot alarm configuration, shadowed in RAM by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmSettings {
    /// Target hour, 0-23
    pub hours: u8,
    /// Target minute, 0-59
    pub minutes: u8,
    /// Whether the alarm is armed
    pub enabled: bool,
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            hours: 7,
            minutes: 0,
            enabled: false,
        }
    }
}

impl AlarmSettings {
    /// Serialize to the on-flash record layout: version, hours, minutes,
    /// reserved padding, enabled.
    pub fn encode(&self) -> [u8; SETTINGS_RECORD_LEN] {
        [
            SETTINGS_FORMAT_VERSION,
            self.hours,
            self.minutes,
            0,
            self.enabled as u8,
        ]
    }

    /// Parse an on-flash record. The version byte gates forward
    /// compatibility: unknown versions are rejected and the caller keeps
    /// its defaults.
    pub fn decode(raw: &[u8]) -> Result<Self, StorageError> {
        if raw.len() < SETTINGS_RECORD_LEN {
            return Err(StorageError::Truncated {
                expected: SETTINGS_RECORD_LEN,
                read: raw.len(),
            });
        }
        if raw[0] != SETTINGS_FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion { found: raw[0] });
        }
        Ok(Self {
            hours: raw[1],
            minutes: raw[2],
            enabled: raw[4] != 0,
        })
    }
}

/// The one key of the device settings store the alarm touches.
///
/// `None` means "no override stored, use the firmware default".
pub trait SettingsStore {
    /// Current background heart-rate sampling interval in seconds.
    fn hr_background_interval(&self) -> Option<u16>;

    /// Replace the background heart-rate sampling interval. Passing
    /// `None` clears the override.
    fn set_hr_background_interval(&mut self, interval: Option<u16>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_seven_oclock_disabled() {
        let settings = AlarmSettings::default();
        assert_eq!(settings.hours, 7);
        assert_eq!(settings.minutes, 0);
        assert!(!settings.enabled);
    }

    #[test]
    fn encode_decode_round_trip() {
        let settings = AlarmSettings {
            hours: 6,
            minutes: 45,
            enabled: true,
        };
        assert_eq!(AlarmSettings::decode(&settings.encode()), Ok(settings));
    }

    #[test]
    fn padding_byte_is_zero() {
        let raw = AlarmSettings::default().encode();
        assert_eq!(raw[3], 0);
    }

    #[test]
    fn unknown_version_rejected() {
        let mut raw = AlarmSettings::default().encode();
        raw[0] = 2;
        assert_eq!(
            AlarmSettings::decode(&raw),
            Err(StorageError::UnsupportedVersion { found: 2 })
        );
    }

    #[test]
    fn short_record_rejected() {
        let raw = [SETTINGS_FORMAT_VERSION, 7, 0];
        assert_eq!(
            AlarmSettings::decode(&raw),
            Err(StorageError::Truncated {
                expected: SETTINGS_RECORD_LEN,
                read: 3
            })
        );
    }
}
