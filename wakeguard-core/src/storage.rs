//! Byte-Oriented Filesystem Seam
//!
//! ## Overview
//!
//! The wearable persists its files through a small flash filesystem
//! (open/read/write/seek/close plus directory primitives). This module
//! captures exactly that surface as a trait so the ring log and the
//! alarm controller can be exercised on a host without flash hardware.
//!
//! Two host implementations ship behind the `std` feature:
//!
//! - [`MemoryFs`]: a shared in-RAM volume. Cloning shares the backing
//!   store, which makes persistence round-trips trivial to test: write
//!   through one clone, reopen through another.
//! - [`StdFs`]: maps the device's absolute paths into a root directory
//!   on the host filesystem.
//!
//! ## Mutability
//!
//! Read operations take `&mut self` on purpose: flash filesystems
//! advance per-handle read state, and a read-only borrow would misstate
//! the contract. Callers that need concurrent readers serialize at the
//! call site, the same way the device serializes on its timer task.
//!
//! ## Durability
//!
//! Writes must be durable once `close` returns. [`StdFs`] syncs the file
//! on close; [`MemoryFs`] is volatile by definition and "durable" for
//! the lifetime of its backing store.

use crate::errors::{FsError, FsResult};

/// Open disposition for [`Filesystem::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file, read only.
    Read,
    /// Read and write, created if missing. Does not truncate.
    ReadWrite,
    /// Write only, created if missing. Does not truncate.
    WriteCreate,
}

/// Minimal byte-oriented filesystem with seek and directory primitives.
pub trait Filesystem {
    /// Per-open handle carrying position state.
    type File;

    /// Open a file at an absolute path.
    fn open(&mut self, path: &str, mode: OpenMode) -> FsResult<Self::File>;

    /// Read up to `buf.len()` bytes at the current position. Returns the
    /// number of bytes read; fewer than requested means end of file.
    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> FsResult<usize>;

    /// Write the bytes at the current position, extending the file as
    /// needed. Returns the number of bytes written.
    fn write(&mut self, file: &mut Self::File, data: &[u8]) -> FsResult<usize>;

    /// Move the position to an absolute byte offset. Seeking past the
    /// end is allowed; the gap reads as zeroes after a later write.
    fn seek(&mut self, file: &mut Self::File, offset: u32) -> FsResult<()>;

    /// Close the handle, making prior writes durable.
    fn close(&mut self, file: Self::File) -> FsResult<()>;

    /// Create a directory. Succeeds if it already exists.
    fn create_dir(&mut self, path: &str) -> FsResult<()>;

    /// Whether a directory exists at the path.
    fn dir_exists(&mut self, path: &str) -> FsResult<bool>;

    /// Delete a file.
    fn remove(&mut self, path: &str) -> FsResult<()>;
}

#[cfg(feature = "std")]
mod host {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::rc::Rc;

    use super::{Filesystem, OpenMode};
    use crate::errors::{FsError, FsResult};

    #[derive(Debug, Default)]
    struct MemoryState {
        files: HashMap<String, Vec<u8>>,
        dirs: HashSet<String>,
    }

    impl MemoryState {
        fn parent_exists(&self, path: &str) -> bool {
            match path.rsplit_once('/') {
                Some(("", _)) | None => true,
                Some((parent, _)) => self.dirs.contains(parent),
            }
        }
    }

    /// In-RAM filesystem. Clones share the backing store.
    #[derive(Debug, Clone, Default)]
    pub struct MemoryFs {
        state: Rc<RefCell<MemoryState>>,
    }

    /// Open-file handle of [`MemoryFs`].
    #[derive(Debug)]
    pub struct MemoryFile {
        path: String,
        pos: usize,
        mode: OpenMode,
    }

    impl MemoryFs {
        /// Create an empty volume.
        pub fn new() -> Self {
            Self::default()
        }

        /// Install raw file contents, creating the parent directory.
        /// Test convenience for pre-seeding corrupt or legacy files.
        pub fn put(&self, path: &str, bytes: &[u8]) {
            let mut state = self.state.borrow_mut();
            if let Some((parent, _)) = path.rsplit_once('/') {
                if !parent.is_empty() {
                    state.dirs.insert(parent.to_owned());
                }
            }
            state.files.insert(path.to_owned(), bytes.to_vec());
        }

        /// Raw file contents, if the file exists. Test convenience.
        pub fn get(&self, path: &str) -> Option<Vec<u8>> {
            self.state.borrow().files.get(path).cloned()
        }

        /// Whether a file exists at the path.
        pub fn contains(&self, path: &str) -> bool {
            self.state.borrow().files.contains_key(path)
        }
    }

    impl Filesystem for MemoryFs {
        type File = MemoryFile;

        fn open(&mut self, path: &str, mode: OpenMode) -> FsResult<MemoryFile> {
            let mut state = self.state.borrow_mut();
            if !state.files.contains_key(path) {
                if mode == OpenMode::Read {
                    return Err(FsError::NotFound);
                }
                if !state.parent_exists(path) {
                    return Err(FsError::NotFound);
                }
                state.files.insert(path.to_owned(), Vec::new());
            }
            Ok(MemoryFile {
                path: path.to_owned(),
                pos: 0,
                mode,
            })
        }

        fn read(&mut self, file: &mut MemoryFile, buf: &mut [u8]) -> FsResult<usize> {
            if file.mode == OpenMode::WriteCreate {
                return Err(FsError::InvalidHandle);
            }
            let state = self.state.borrow();
            let data = state.files.get(&file.path).ok_or(FsError::NotFound)?;
            let available = data.len().saturating_sub(file.pos);
            let n = buf.len().min(available);
            buf[..n].copy_from_slice(&data[file.pos..file.pos + n]);
            file.pos += n;
            Ok(n)
        }

        fn write(&mut self, file: &mut MemoryFile, data: &[u8]) -> FsResult<usize> {
            if file.mode == OpenMode::Read {
                return Err(FsError::InvalidHandle);
            }
            let mut state = self.state.borrow_mut();
            let contents = state.files.get_mut(&file.path).ok_or(FsError::NotFound)?;
            let end = file.pos + data.len();
            if contents.len() < end {
                contents.resize(end, 0);
            }
            contents[file.pos..end].copy_from_slice(data);
            file.pos = end;
            Ok(data.len())
        }

        fn seek(&mut self, file: &mut MemoryFile, offset: u32) -> FsResult<()> {
            file.pos = offset as usize;
            Ok(())
        }

        fn close(&mut self, _file: MemoryFile) -> FsResult<()> {
            Ok(())
        }

        fn create_dir(&mut self, path: &str) -> FsResult<()> {
            self.state.borrow_mut().dirs.insert(path.to_owned());
            Ok(())
        }

        fn dir_exists(&mut self, path: &str) -> FsResult<bool> {
            Ok(path == "/" || self.state.borrow().dirs.contains(path))
        }

        fn remove(&mut self, path: &str) -> FsResult<()> {
            self.state
                .borrow_mut()
                .files
                .remove(path)
                .map(|_| ())
                .ok_or(FsError::NotFound)
        }
    }

    /// Filesystem rooted at a host directory, for running the subsystem
    /// against real files.
    #[derive(Debug, Clone)]
    pub struct StdFs {
        root: std::path::PathBuf,
    }

    impl StdFs {
        /// Map device-absolute paths under the given host directory.
        pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
            Self { root: root.into() }
        }

        fn resolve(&self, path: &str) -> std::path::PathBuf {
            self.root.join(path.trim_start_matches('/'))
        }

        fn map_err(err: std::io::Error) -> FsError {
            match err.kind() {
                std::io::ErrorKind::NotFound => FsError::NotFound,
                _ => FsError::Io,
            }
        }
    }

    impl Filesystem for StdFs {
        type File = std::fs::File;

        fn open(&mut self, path: &str, mode: OpenMode) -> FsResult<std::fs::File> {
            let target = self.resolve(path);
            let result = match mode {
                OpenMode::Read => std::fs::File::open(target),
                OpenMode::ReadWrite => std::fs::OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .open(target),
                OpenMode::WriteCreate => std::fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .open(target),
            };
            result.map_err(Self::map_err)
        }

        fn read(&mut self, file: &mut std::fs::File, buf: &mut [u8]) -> FsResult<usize> {
            use std::io::Read;

            let mut total = 0;
            while total < buf.len() {
                match file.read(&mut buf[total..]) {
                    Ok(0) => break,
                    Ok(n) => total += n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(Self::map_err(e)),
                }
            }
            Ok(total)
        }

        fn write(&mut self, file: &mut std::fs::File, data: &[u8]) -> FsResult<usize> {
            use std::io::Write;

            file.write_all(data).map_err(Self::map_err)?;
            Ok(data.len())
        }

        fn seek(&mut self, file: &mut std::fs::File, offset: u32) -> FsResult<()> {
            use std::io::Seek;

            file.seek(std::io::SeekFrom::Start(offset as u64))
                .map(|_| ())
                .map_err(Self::map_err)
        }

        fn close(&mut self, file: std::fs::File) -> FsResult<()> {
            file.sync_all().map_err(Self::map_err)
        }

        fn create_dir(&mut self, path: &str) -> FsResult<()> {
            std::fs::create_dir_all(self.resolve(path)).map_err(Self::map_err)
        }

        fn dir_exists(&mut self, path: &str) -> FsResult<bool> {
            Ok(self.resolve(path).is_dir())
        }

        fn remove(&mut self, path: &str) -> FsResult<()> {
            std::fs::remove_file(self.resolve(path)).map_err(Self::map_err)
        }
    }
}

#[cfg(feature = "std")]
pub use host::{MemoryFile, MemoryFs, StdFs};
