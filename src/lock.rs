//! The inter-process sentinel lock.
//!
//! `fs4` only exposes whole-file advisory locking (POSIX `flock`) /
//! mandatory locking (Windows `LockFileEx`), not byte-range `fcntl` locks;
//! since the sentinel file never holds any data of its own, locking it in
//! its entirety is behaviourally identical to locking a single designated
//! byte range within it.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::FileExt;

use crate::diagnostics::{eprint_err, ErrorCode};
use crate::error::{Result, WriterError};

/// The `.lock` sentinel file paired with the active log file. Normally held
/// open for the process lifetime, reopened across a fork (see below); under
/// `keep_file_open=false` it is instead dropped at the end of every emit and
/// reopened fresh at the start of the next one, same as the active handle.
pub(crate) struct Sentinel {
    path: PathBuf,
    file: File,
    pid_at_open: u32,
}

impl Sentinel {
    /// Opens (creating if necessary) the sentinel file for `log_path`, in
    /// `lock_dir` if given, else alongside the log file itself.
    pub(crate) fn open(log_path: &Path, lock_dir: Option<&Path>) -> Result<Self> {
        let path = sentinel_path(log_path, lock_dir);
        let file = open_sentinel_file(&path)?;
        Ok(Self {
            path,
            file,
            pid_at_open: std::process::id(),
        })
    }

    /// Blocking acquisition of the exclusive lock. Reopens the sentinel
    /// handle first if the observed PID no longer matches the one recorded
    /// at construction, i.e. this process image is living on past a `fork()`
    /// that did not `exec`: a flock held by the parent would otherwise be
    /// silently inherited as already-held by the child on Linux.
    pub(crate) fn lock_exclusive(&mut self) -> Result<()> {
        self.reopen_if_forked()?;
        self.file.lock_exclusive().map_err(WriterError::Io)
    }

    /// Releases the lock. Failures are swallowed (reported via
    /// [`crate::diagnostics`]) rather than propagated: a release failure
    /// must never cause an already-written record to be reported as lost.
    pub(crate) fn unlock(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            eprint_err(ErrorCode::LockRelease, "failed to release sentinel lock", &e);
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn reopen_if_forked(&mut self) -> Result<()> {
        let current_pid = std::process::id();
        if current_pid != self.pid_at_open {
            self.file = open_sentinel_file(&self.path)?;
            self.pid_at_open = current_pid;
        }
        Ok(())
    }
}

/// RAII guard releasing the lock on drop, mirroring `FileLockGuard`.
pub(crate) struct SentinelGuard<'a> {
    sentinel: &'a mut Sentinel,
}

impl<'a> SentinelGuard<'a> {
    pub(crate) fn acquire(sentinel: &'a mut Sentinel) -> Result<Self> {
        sentinel.lock_exclusive()?;
        Ok(Self { sentinel })
    }
}

impl Drop for SentinelGuard<'_> {
    fn drop(&mut self) {
        self.sentinel.unlock();
    }
}

/// Builds the sentinel path `.__<basename>.lock`, per the dotfile-prefix,
/// double-underscore naming convention.
fn sentinel_path(log_path: &Path, lock_dir: Option<&Path>) -> PathBuf {
    let file_name = log_path
        .file_name()
        .map(|n| {
            let mut s = std::ffi::OsString::from(".__");
            s.push(n);
            s.push(".lock");
            s
        })
        .unwrap_or_else(|| ".__app.lock".into());
    match lock_dir {
        Some(dir) => dir.join(file_name),
        None => log_path.with_file_name(file_name),
    }
}

/// Opens (creating if absent) the sentinel file with permissions allowing
/// group read/write for multi-user setups. Its mode is not subject to the
/// process umask narrowing that applies to the log data file itself.
fn open_sentinel_file(path: &Path) -> Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(WriterError::Io)?;
    apply_sentinel_permissions(&file)?;
    Ok(file)
}

#[cfg(unix)]
fn apply_sentinel_permissions(file: &File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perm = file.metadata().map_err(WriterError::Io)?.permissions();
    perm.set_mode(0o664);
    file.set_permissions(perm).map_err(WriterError::Io)
}

#[cfg(not(unix))]
fn apply_sentinel_permissions(_file: &File) -> Result<()> {
    Ok(())
}
