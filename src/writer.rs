//! The emitter: the public entry point orchestrating
//! lock → validate → maybe-rotate → write → flush → release.
//!
//! The in-process critical section is a `parking_lot::ReentrantMutex`
//! wrapping a `RefCell<Option<State>>`: a same-thread reentrant call finds
//! the state already taken and falls back to a direct append, still
//! serialized against other processes by the outer call's held lock.

use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::ReentrantMutex;

use crate::config::{Config, OpenMode};
use crate::encoding;
use crate::error::{Result, WriterError};
use crate::handle::{self, Handle};
use crate::lock::{Sentinel, SentinelGuard};
use crate::rotation::{self, Policy, SizeRotator, TimeRotator};

struct State {
    sentinel: Option<Sentinel>,
    handle: Option<Handle>,
    policy: Option<Policy>,
    first_open_done: bool,
}

/// A multi-process-safe rotating log file writer.
///
/// Construct with [`crate::ConcurrentFileWriterBuilder`]. One instance is
/// owned per process; instances are never shared across a process boundary
/// by serialization. Cross-process coordination happens exclusively through
/// the on-disk lock sentinel and the log file's own state.
pub struct ConcurrentFileWriter {
    config: Arc<Config>,
    core: ReentrantMutex<RefCell<Option<State>>>,
}

impl ConcurrentFileWriter {
    pub(crate) fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let sentinel = Sentinel::open(&config.path, config.lock_file_directory.as_deref())?;
        let policy = build_policy(&config);

        let mut state = State {
            sentinel: Some(sentinel),
            handle: None,
            policy,
            first_open_done: false,
        };

        if !config.delay {
            open_active_handle(&mut state, &config)?;
        }

        Ok(Self {
            config,
            core: ReentrantMutex::new(RefCell::new(Some(state))),
        })
    }

    /// Emits one already-formatted record, appending the configured
    /// terminator. Returns the number of bytes written, including the
    /// terminator.
    pub fn write_record(&self, record: &[u8]) -> Result<usize> {
        let guard = self.core.lock();
        let mut borrowed = guard.borrow_mut();
        match borrowed.take() {
            Some(mut state) => {
                drop(borrowed);
                let result = emit(&mut state, &self.config, record);
                *guard.borrow_mut() = Some(state);
                result
            }
            None => {
                // Same-thread reentry: the outer call already owns `state`.
                // The outer call's sentinel lock is still held for the
                // duration of its own emit, so a direct append here is
                // still serialized against every other process; it just
                // can't participate in this outer call's rotation decision.
                drop(borrowed);
                emit_reentrant(&self.config, record)
            }
        }
    }

    /// Encodes `record` using the configured encoding and
    /// [`UnicodeErrorPolicy`], then emits it the same way as
    /// [`Self::write_record`].
    pub fn write_str(&self, record: &str) -> Result<usize> {
        let bytes = encoding::encode(record, self.config.encoding, self.config.unicode_error_policy)
            .map_err(|_| WriterError::Encoding)?;
        self.write_record(&bytes)
    }
}

impl io::Write for ConcurrentFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_record(buf).map_err(io_err)
    }

    fn flush(&mut self) -> io::Result<()> {
        // Every `write_record` already flushes the handle before releasing
        // the lock; nothing buffered survives between calls.
        Ok(())
    }
}

fn io_err(e: WriterError) -> io::Error {
    match e {
        WriterError::Io(e) => e,
        other => io::Error::other(other),
    }
}

fn build_policy(config: &Config) -> Option<Policy> {
    let baseline = std::fs::metadata(&config.path)
        .ok()
        .and_then(|m| m.modified().ok())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(Utc::now);

    match (&config.time_spec, config.max_bytes) {
        (None, 0) => None,
        (None, max_bytes) => Some(Policy::Size(SizeRotator::new(max_bytes))),
        (Some(ts), 0) => Some(Policy::Time(TimeRotator::new(ts.when, ts.interval, ts.utc, ts.at_time, baseline))),
        (Some(ts), max_bytes) => Some(Policy::TimeOrSize(
            TimeRotator::new(ts.when, ts.interval, ts.utc, ts.at_time, baseline),
            SizeRotator::new(max_bytes),
        )),
    }
}

/// Opens/reopens the active handle if absent or stale, applying
/// owner/chmod/umask to a freshly created file and the configured append
/// semantics (truncating only on the very first-ever open in `Write` mode).
fn open_active_handle(state: &mut State, config: &Config) -> Result<()> {
    if let Some(handle) = &state.handle {
        if !handle.is_stale(&config.path) {
            return Ok(());
        }
        state.handle = None;
    }

    let append = state.first_open_done || config.mode == OpenMode::Append;
    let file_existed = config.path.exists();

    #[cfg(unix)]
    let _umask_guard = config.umask.map(UmaskGuard::apply);

    let opened = Handle::open(&config.path, append, config.buffer_capacity)?;

    if !file_existed {
        apply_new_file_permissions(config)?;
        if config.print_message {
            handle::print_opened_message(&config.path);
        }
    }

    state.handle = Some(opened);
    state.first_open_done = true;
    Ok(())
}

#[cfg(unix)]
fn apply_new_file_permissions(config: &Config) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(mode) = config.chmod {
        let perm = std::fs::Permissions::from_mode(mode);
        std::fs::set_permissions(&config.path, perm).map_err(WriterError::Io)?;
    }
    if let Some((uid, gid)) = config.owner {
        nix::unistd::chown(&config.path, Some(nix::unistd::Uid::from_raw(uid)), Some(nix::unistd::Gid::from_raw(gid)))
            .map_err(|e| WriterError::Configuration(format!("chown failed: {e}")))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_new_file_permissions(_config: &Config) -> Result<()> {
    Ok(())
}

#[cfg(unix)]
struct UmaskGuard {
    previous: nix::sys::stat::Mode,
}

#[cfg(unix)]
impl UmaskGuard {
    fn apply(mask: u32) -> Self {
        let mode = nix::sys::stat::Mode::from_bits_truncate(mask);
        let previous = nix::sys::stat::umask(mode);
        Self { previous }
    }
}

#[cfg(unix)]
impl Drop for UmaskGuard {
    fn drop(&mut self) {
        nix::sys::stat::umask(self.previous);
    }
}

/// Acquires the sentinel lock (reopening it first if `keep_file_open=false`
/// already closed it after the previous emit), runs the critical section,
/// then closes it again under the same condition, mirroring the active file
/// handle's own open/close lifecycle.
fn emit(state: &mut State, config: &Config, record: &[u8]) -> Result<usize> {
    let mut sentinel = match state.sentinel.take() {
        Some(s) => s,
        None => Sentinel::open(&config.path, config.lock_file_directory.as_deref())?,
    };

    let result = emit_locked(&mut sentinel, state, config, record);

    if config.keep_file_open {
        state.sentinel = Some(sentinel);
    }

    result
}

fn emit_locked(sentinel: &mut Sentinel, state: &mut State, config: &Config, record: &[u8]) -> Result<usize> {
    let _lock_guard = SentinelGuard::acquire(sentinel)?;

    open_active_handle(state, config)?;

    let mut full = Vec::with_capacity(record.len() + config.terminator.len());
    full.extend_from_slice(record);
    full.extend_from_slice(&config.terminator);

    if let Some(policy) = state.policy.as_mut() {
        let now = Utc::now();
        if policy.should_rollover(&config.path, full.len() as u64, now)? {
            state.handle = None;
            rotation::execute(&config.path, config.backup_count, config.use_gzip, config.namer.as_ref())?;
            policy.on_rotated(now);
            open_active_handle(state, config)?;
        }
    }

    let handle = state.handle.as_mut().expect("open_active_handle guarantees Some");
    handle.write_all(&full).map_err(WriterError::Io)?;
    handle.flush().map_err(WriterError::Io)?;

    if !config.keep_file_open {
        state.handle = None;
    }

    Ok(full.len())
}

/// Fallback path for a same-thread reentrant call: the outer call already
/// owns the shared `State`, so this writes directly without its own
/// rotation check. The outer call's already-held sentinel lock still
/// serializes this against every other process.
fn emit_reentrant(config: &Config, record: &[u8]) -> Result<usize> {
    let mut full = Vec::with_capacity(record.len() + config.terminator.len());
    full.extend_from_slice(record);
    full.extend_from_slice(&config.terminator);

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .append(true)
        .open(&config.path)
        .map_err(WriterError::Io)?;
    use std::io::Write as _;
    file.write_all(&full).map_err(WriterError::Io)?;
    file.flush().map_err(WriterError::Io)?;
    Ok(full.len())
}
