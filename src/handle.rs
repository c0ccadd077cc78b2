//! Opening and identifying the active log file.
//!
//! The file identity check (detecting rotation performed by another
//! process) compares `std::os::unix::fs::MetadataExt::{dev, ino}` on Unix
//! and `std::os::windows::fs::MetadataExt::file_index` on Windows, both
//! stable std with no extra crate needed.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, WriterError};

/// A cheap, platform-specific fingerprint of an open file's identity,
/// independent of its path. Used to notice that `path` now refers to a
/// different inode/file than the one this handle has open, which means some
/// other process rotated it already.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct FileIdentity(Identity);

#[cfg(unix)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Identity {
    dev: u64,
    ino: u64,
}

#[cfg(windows)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Identity {
    file_index: u64,
}

#[cfg(not(any(unix, windows)))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct Identity;

impl FileIdentity {
    #[cfg(unix)]
    fn of(file: &File) -> std::io::Result<Self> {
        use std::os::unix::fs::MetadataExt;
        let md = file.metadata()?;
        Ok(Self(Identity { dev: md.dev(), ino: md.ino() }))
    }

    #[cfg(windows)]
    fn of(file: &File) -> std::io::Result<Self> {
        use std::os::windows::fs::MetadataExt;
        let md = file.metadata()?;
        Ok(Self(Identity {
            file_index: md.file_index().unwrap_or(0),
        }))
    }

    #[cfg(not(any(unix, windows)))]
    fn of(_file: &File) -> std::io::Result<Self> {
        Ok(Self(Identity))
    }
}

/// The open writable handle to the active log file plus the identity it had
/// when opened.
pub(crate) struct Handle {
    writer: HandleWriter,
    identity: FileIdentity,
}

enum HandleWriter {
    Plain(File),
    Buffered(BufWriter<File>),
}

impl Handle {
    /// Opens (or creates) `path` for appending, applying `buffer_capacity`
    /// if given.
    pub(crate) fn open(path: &Path, append: bool, buffer_capacity: Option<usize>) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .map_err(WriterError::Io)?;
        let identity = FileIdentity::of(&file).map_err(WriterError::Io)?;
        let writer = match buffer_capacity {
            Some(cap) => HandleWriter::Buffered(BufWriter::with_capacity(cap, file)),
            None => HandleWriter::Plain(file),
        };
        Ok(Self { writer, identity })
    }

    /// True if `path`'s current on-disk identity no longer matches the one
    /// this handle was opened with, meaning another process already rotated
    /// it out from under us.
    pub(crate) fn is_stale(&self, path: &Path) -> bool {
        match std::fs::metadata(path).and_then(|_| File::open(path)).and_then(|f| FileIdentity::of(&f)) {
            Ok(current) => current != self.identity,
            Err(_) => true,
        }
    }

    pub(crate) fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match &mut self.writer {
            HandleWriter::Plain(f) => f.write_all(buf),
            HandleWriter::Buffered(w) => w.write_all(buf),
        }
    }

    pub(crate) fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.writer {
            HandleWriter::Plain(f) => f.flush(),
            HandleWriter::Buffered(w) => w.flush(),
        }
    }

}

pub(crate) fn print_opened_message(path: &Path) {
    println!("Log is written to {}", path.display());
}
