//! Persistent Heart-Rate Ring Log
//!
//! ## Overview
//!
//! A bounded, durable ring of timestamped BPM samples. The sensor feed
//! appends at most one sample per throttle interval; the alarm
//! controller reads back the newest samples in chronological order to
//! classify the current sleep phase. The ring survives reboots: both
//! the slot contents and the write position live in one backing file.
//!
//! ## On-flash layout
//!
//! ```text
//! /.system/hrlog.dat
//! ┌─────────────────────┬─────────┬─────────┬────┬───────────────┐
//! │ header (5 bytes)    │ slot 0  │ slot 1  │ …  │ slot CAP-1    │
//! │ ver u8              │ ts u32  │         │    │               │
//! │ write_index u16 LE  │ bpm u8  │         │    │               │
//! │ count u16 LE        │         │         │    │               │
//! └─────────────────────┴─────────┴─────────┴────┴───────────────┘
//! ```
//!
//! Slots are rewritten in place; unwritten slots may hold any bytes.
//! `write_index` names the slot the next append lands in, which is
//! simultaneously the oldest valid entry once the ring is full:
//!
//! ```text
//! count < CAP:   valid entries are slots 0 … count-1, oldest first
//! count == CAP:  oldest entry is at write_index, wrapping modulo CAP
//! ```
//!
//! ## Failure behavior
//!
//! Every filesystem error is absorbed here. A failed header load starts
//! the ring empty; a failed entry write drops that one sample without
//! advancing the ring; a failed read returns no entries. The caller
//! never sees an error, matching the alarm's fail-safe posture: losing
//! telemetry degrades the early wake, never the hard deadline.

use heapless::Vec;

use crate::constants::storage::{
    ENTRY_LEN, HEADER_LEN, HR_LOG_PATH, LOG_CAPACITY, LOG_FORMAT_VERSION, LOG_THROTTLE_SECS,
    SYSTEM_DIR,
};
use crate::errors::{FsError, StorageError};
use crate::storage::{Filesystem, OpenMode};
use crate::time::Clock;

/// One logged heart-rate sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HrEntry {
    /// When the sample was taken, epoch seconds
    pub timestamp: u32,
    /// Heart rate in beats per minute
    pub bpm: u8,
}

impl HrEntry {
    fn encode(&self) -> [u8; ENTRY_LEN] {
        let ts = self.timestamp.to_le_bytes();
        [ts[0], ts[1], ts[2], ts[3], self.bpm]
    }

    fn decode(raw: &[u8; ENTRY_LEN]) -> Self {
        Self {
            timestamp: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            bpm: raw[4],
        }
    }
}

/// In-RAM shadow of the ring file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LogHeader {
    version: u8,
    write_index: u16,
    count: u16,
}

impl Default for LogHeader {
    fn default() -> Self {
        Self {
            version: LOG_FORMAT_VERSION,
            write_index: 0,
            count: 0,
        }
    }
}

impl LogHeader {
    fn encode(&self) -> [u8; HEADER_LEN] {
        let index = self.write_index.to_le_bytes();
        let count = self.count.to_le_bytes();
        [self.version, index[0], index[1], count[0], count[1]]
    }

    fn decode(raw: &[u8; HEADER_LEN]) -> Result<Self, StorageError> {
        let header = Self {
            version: raw[0],
            write_index: u16::from_le_bytes([raw[1], raw[2]]),
            count: u16::from_le_bytes([raw[3], raw[4]]),
        };
        if header.version != LOG_FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                found: header.version,
            });
        }
        if header.write_index >= LOG_CAPACITY || header.count > LOG_CAPACITY {
            return Err(StorageError::CorruptHeader);
        }
        Ok(header)
    }
}

/// Chronological read access to recent heart-rate samples.
///
/// Separated from [`HrLog`] so the sleep-phase classifier can be tested
/// against a scripted history.
pub trait HrHistory {
    /// The newest entries, at most `N`, oldest first.
    fn recent<const N: usize>(&mut self) -> Vec<HrEntry, N>;

    /// Number of valid entries in the ring.
    fn entry_count(&self) -> u16;
}

/// Bounded, persistent ring of heart-rate samples.
///
/// Owns its backing file and the in-RAM header shadow. The throttle
/// state is deliberately not persisted: after a reboot the first sample
/// is always accepted.
pub struct HrLog<F: Filesystem, C: Clock> {
    fs: F,
    clock: C,
    header: LogHeader,
    last_log_timestamp: u32,
}

impl<F: Filesystem, C: Clock> HrLog<F, C> {
    /// Create a log over the given filesystem and clock. Call
    /// [`init`](Self::init) before use.
    pub fn new(fs: F, clock: C) -> Self {
        Self {
            fs,
            clock,
            header: LogHeader::default(),
            last_log_timestamp: 0,
        }
    }

    /// Load the persisted header. A missing, unreadable, or corrupt
    /// header leaves the ring empty; this never fails.
    pub fn init(&mut self) {
        if let Some(header) = self.load_header() {
            self.header = header;
        }
    }

    /// Append a sample taken now.
    ///
    /// Zero BPM readings are sensor noise and are dropped. Accepted
    /// samples are throttled to one per [`LOG_THROTTLE_SECS`]; the
    /// throttle window also consumes samples whose entry write fails.
    pub fn add_measurement(&mut self, bpm: u8) {
        if bpm == 0 {
            return;
        }

        let now = self.clock.now();
        if self.last_log_timestamp != 0
            && now.wrapping_sub(self.last_log_timestamp) < LOG_THROTTLE_SECS
        {
            return;
        }
        self.last_log_timestamp = now;

        let entry = HrEntry {
            timestamp: now,
            bpm,
        };
        if let Err(err) = self.write_entry(self.header.write_index, &entry) {
            log::warn!("heart-rate sample dropped: {}", err);
            return;
        }

        self.header.write_index = (self.header.write_index + 1) % LOG_CAPACITY;
        if self.header.count < LOG_CAPACITY {
            self.header.count += 1;
        }
        if let Err(err) = self.save_header() {
            log::warn!("ring header not persisted: {}", err);
        }
    }

    /// Whether the ring holds no entries.
    pub fn is_empty(&self) -> bool {
        self.header.count == 0
    }

    /// Total slots in the ring.
    pub const fn capacity(&self) -> u16 {
        LOG_CAPACITY
    }

    /// Empty the ring: reset the header and throttle state and delete
    /// the backing file, leaving a fresh empty header behind.
    pub fn clear(&mut self) {
        self.header = LogHeader::default();
        self.last_log_timestamp = 0;
        if let Err(err) = self.fs.remove(HR_LOG_PATH) {
            if err != FsError::NotFound {
                log::warn!("ring file not deleted: {}", err);
            }
        }
        if let Err(err) = self.save_header() {
            log::warn!("ring header not persisted: {}", err);
        }
    }

    fn load_header(&mut self) -> Option<LogHeader> {
        let mut file = self.fs.open(HR_LOG_PATH, OpenMode::Read).ok()?;
        let mut raw = [0u8; HEADER_LEN];
        let read = self.fs.read(&mut file, &mut raw);
        let _ = self.fs.close(file);
        match read {
            Ok(n) if n == HEADER_LEN => LogHeader::decode(&raw).ok(),
            _ => None,
        }
    }

    fn save_header(&mut self) -> Result<(), StorageError> {
        self.fs.create_dir(SYSTEM_DIR)?;
        let mut file = self.fs.open(HR_LOG_PATH, OpenMode::ReadWrite)?;
        let written = Self::write_record(&mut self.fs, &mut file, 0, &self.header.encode());
        let closed = self.fs.close(file);
        written?;
        closed?;
        Ok(())
    }

    fn write_entry(&mut self, index: u16, entry: &HrEntry) -> Result<(), StorageError> {
        self.fs.create_dir(SYSTEM_DIR)?;
        let mut file = self.fs.open(HR_LOG_PATH, OpenMode::ReadWrite)?;
        let written =
            Self::write_record(&mut self.fs, &mut file, Self::slot_offset(index), &entry.encode());
        let closed = self.fs.close(file);
        written?;
        closed?;
        Ok(())
    }

    fn write_record(
        fs: &mut F,
        file: &mut F::File,
        offset: u32,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        fs.seek(file, offset)?;
        let written = fs.write(file, bytes)?;
        if written != bytes.len() {
            return Err(StorageError::Fs(FsError::Io));
        }
        Ok(())
    }

    fn read_entry(fs: &mut F, file: &mut F::File, index: u16) -> Result<HrEntry, StorageError> {
        fs.seek(file, Self::slot_offset(index))?;
        let mut raw = [0u8; ENTRY_LEN];
        let read = fs.read(file, &mut raw)?;
        if read != ENTRY_LEN {
            return Err(StorageError::Truncated {
                expected: ENTRY_LEN,
                read,
            });
        }
        Ok(HrEntry::decode(&raw))
    }

    const fn slot_offset(index: u16) -> u32 {
        HEADER_LEN as u32 + index as u32 * ENTRY_LEN as u32
    }
}

impl<F: Filesystem, C: Clock> HrHistory for HrLog<F, C> {
    fn recent<const N: usize>(&mut self) -> Vec<HrEntry, N> {
        let mut out = Vec::new();
        if self.header.count == 0 || N == 0 {
            return out;
        }
        let to_read = self
            .header
            .count
            .min(u16::try_from(N).unwrap_or(u16::MAX));

        // Oldest of the entries we return. Before the ring wraps the
        // valid slots are 0..count; afterwards the oldest valid entry
        // sits at write_index and indices wrap modulo capacity.
        let start = if self.header.count < LOG_CAPACITY {
            self.header.count - to_read
        } else {
            (self.header.write_index + LOG_CAPACITY - to_read) % LOG_CAPACITY
        };

        let mut file = match self.fs.open(HR_LOG_PATH, OpenMode::Read) {
            Ok(file) => file,
            Err(_) => return out,
        };
        let mut failed = false;
        for i in 0..to_read {
            let index = (start + i) % LOG_CAPACITY;
            match Self::read_entry(&mut self.fs, &mut file, index) {
                Ok(entry) => {
                    let _ = out.push(entry);
                }
                Err(_) => {
                    failed = true;
                    break;
                }
            }
        }
        let _ = self.fs.close(file);

        if failed {
            return Vec::new();
        }
        out
    }

    fn entry_count(&self) -> u16 {
        self.header.count
    }
}
