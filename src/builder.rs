//! Builder for [`crate::ConcurrentFileWriter`].

use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use encoding_rs::Encoding;

use crate::config::{Config, OpenMode, TimeSpec};
use crate::encoding::UnicodeErrorPolicy;
use crate::error::{Result, WriterError};
use crate::naming::Namer;
use crate::rotation::When;
use crate::writer::ConcurrentFileWriter;

/// Builds a [`ConcurrentFileWriter`]. Validation errors (a parent directory
/// that doesn't exist and can't be created) surface only from
/// [`Self::try_build`]; no I/O happens before that call.
pub struct ConcurrentFileWriterBuilder {
    path: PathBuf,
    mode: OpenMode,
    max_bytes: u64,
    backup_count: u32,
    encoding: &'static Encoding,
    unicode_error_policy: UnicodeErrorPolicy,
    use_gzip: bool,
    #[cfg(unix)]
    owner: Option<(u32, u32)>,
    #[cfg(unix)]
    chmod: Option<u32>,
    #[cfg(unix)]
    umask: Option<u32>,
    delay: bool,
    terminator: Vec<u8>,
    namer: Option<Namer>,
    lock_file_directory: Option<PathBuf>,
    keep_file_open: bool,
    time_spec: Option<TimeSpec>,
    buffer_capacity: Option<usize>,
    print_message: bool,
}

impl ConcurrentFileWriterBuilder {
    /// Starts a builder for the log file at `path`, in append mode, with no
    /// rotation configured.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            mode: OpenMode::Append,
            max_bytes: 0,
            backup_count: 0,
            encoding: encoding_rs::UTF_8,
            unicode_error_policy: UnicodeErrorPolicy::default(),
            use_gzip: false,
            #[cfg(unix)]
            owner: None,
            #[cfg(unix)]
            chmod: None,
            #[cfg(unix)]
            umask: None,
            delay: false,
            terminator: Config::default_terminator(),
            namer: None,
            lock_file_directory: None,
            keep_file_open: true,
            time_spec: None,
            buffer_capacity: None,
            print_message: false,
        }
    }

    /// `Append` (default) preserves existing content across process
    /// restarts; `Write` truncates on the very first open only.
    #[must_use]
    pub fn mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enables size-triggered rotation: rollover is due once the next write
    /// would push the file past `max_bytes`. `0` (the default) disables it.
    #[must_use]
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Number of historical files to retain. `0` (the default) discards
    /// rotated content instead of keeping it.
    #[must_use]
    pub fn backup_count(mut self, backup_count: u32) -> Self {
        self.backup_count = backup_count;
        self
    }

    /// Enables time-triggered rotation on `when`, firing every `interval`
    /// units (ignored by `Weekday`/`Midnight`, which anchor to the wall
    /// clock instead), in UTC if `utc` is true, at `at_time` of day if the
    /// unit anchors to a day boundary.
    #[must_use]
    pub fn rotate_on(mut self, when: When, interval: u32, utc: bool, at_time: Option<NaiveTime>) -> Self {
        self.time_spec = Some(TimeSpec { when, interval, utc, at_time });
        self
    }

    /// Compresses rotated backups (other than the just-rotated intermediate)
    /// with gzip.
    #[must_use]
    pub fn use_gzip(mut self, use_gzip: bool) -> Self {
        self.use_gzip = use_gzip;
        self
    }

    /// Text encoding used when encoding records; defaults to UTF-8.
    #[must_use]
    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// How to handle characters unrepresentable in `encoding`; defaults to
    /// [`UnicodeErrorPolicy::Ignore`].
    #[must_use]
    pub fn unicode_error_policy(mut self, policy: UnicodeErrorPolicy) -> Self {
        self.unicode_error_policy = policy;
        self
    }

    /// Applies `chown(uid, gid)` to newly created files, POSIX only.
    #[cfg(unix)]
    #[must_use]
    pub fn owner(mut self, uid: u32, gid: u32) -> Self {
        self.owner = Some((uid, gid));
        self
    }

    /// Applies this file mode to newly created files, POSIX only.
    #[cfg(unix)]
    #[must_use]
    pub fn chmod(mut self, mode: u32) -> Self {
        self.chmod = Some(mode);
        self
    }

    /// Overrides the process umask during file creation, POSIX only.
    #[cfg(unix)]
    #[must_use]
    pub fn umask(mut self, mask: u32) -> Self {
        self.umask = Some(mask);
        self
    }

    /// Defers the first open until the first emitted record, instead of at
    /// construction time.
    #[must_use]
    pub fn delay(mut self, delay: bool) -> Self {
        self.delay = delay;
        self
    }

    /// Overrides the default terminator (`\n` on POSIX, `\r\n` on Windows)
    /// appended after every record.
    #[must_use]
    pub fn terminator(mut self, terminator: impl Into<Vec<u8>>) -> Self {
        self.terminator = terminator.into();
        self
    }

    /// Rewrites the default backup name (`path.N`/`path.N.gz`) to a custom
    /// one. Must be pure and deterministic: the rotation engine may invoke
    /// it more than once for the same rank while shifting backups.
    #[must_use]
    pub fn namer(mut self, namer: Namer) -> Self {
        self.namer = Some(namer);
        self
    }

    /// Places the lock sentinel in a directory distinct from the log file's
    /// own directory.
    #[must_use]
    pub fn lock_file_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lock_file_directory = Some(dir.into());
        self
    }

    /// If `false`, both the file handle and the lock handle are closed at
    /// the end of every emit and reopened on the next one; the default
    /// (`true`) keeps them open between emits.
    #[must_use]
    pub fn keep_file_open(mut self, keep_file_open: bool) -> Self {
        self.keep_file_open = keep_file_open;
        self
    }

    /// Wraps the active handle in a `BufWriter` of this capacity.
    #[must_use]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    /// Prints an informational line to stdout whenever a fresh file is
    /// opened.
    #[must_use]
    pub fn print_message(mut self, print_message: bool) -> Self {
        self.print_message = print_message;
        self
    }

    /// Validates the configuration and constructs the writer. This is the
    /// only point at which a [`WriterError::Configuration`] can be raised;
    /// everything else is reported from later `write`/`flush` calls.
    pub fn try_build(self) -> Result<ConcurrentFileWriter> {
        validate_parent_dir(&self.path)?;
        if let Some(dir) = &self.lock_file_directory {
            validate_parent_dir(&dir.join("placeholder"))?;
        }

        let config = Config {
            path: self.path,
            mode: self.mode,
            max_bytes: self.max_bytes,
            backup_count: self.backup_count,
            encoding: self.encoding,
            unicode_error_policy: self.unicode_error_policy,
            use_gzip: self.use_gzip,
            #[cfg(unix)]
            owner: self.owner,
            #[cfg(unix)]
            chmod: self.chmod,
            #[cfg(unix)]
            umask: self.umask,
            delay: self.delay,
            terminator: self.terminator,
            namer: self.namer,
            lock_file_directory: self.lock_file_directory,
            keep_file_open: self.keep_file_open,
            time_spec: self.time_spec,
            buffer_capacity: self.buffer_capacity,
            print_message: self.print_message,
        };
        ConcurrentFileWriter::new(config)
    }
}

fn validate_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            if parent.is_dir() {
                return Ok(());
            }
            std::fs::create_dir_all(parent).map_err(|e| {
                WriterError::Configuration(format!("parent directory {} does not exist and could not be created: {e}", parent.display()))
            })
        }
        _ => Ok(()),
    }
}
