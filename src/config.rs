//! Immutable writer configuration.

use std::path::PathBuf;

use chrono::NaiveTime;
use encoding_rs::Encoding;

use crate::encoding::UnicodeErrorPolicy;
use crate::naming::Namer;
use crate::rotation::When;

/// Whether the first-ever open of `path` truncates or appends. Every
/// subsequent reopen (after rotation, or after detecting a stale handle)
/// always appends.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OpenMode {
    /// Preserve existing content across process restarts (the default).
    Append,
    /// Truncate on the very first open of the process lifetime only; every
    /// later reopen (after rotation, or after a stale-handle detection)
    /// always appends.
    Write,
}

impl Default for OpenMode {
    fn default() -> Self {
        Self::Append
    }
}

/// The `when`/`interval`/`utc`/`at_time` group, present only when time-based
/// rotation is configured.
#[derive(Clone, Debug)]
pub(crate) struct TimeSpec {
    pub(crate) when: When,
    pub(crate) interval: u32,
    pub(crate) utc: bool,
    pub(crate) at_time: Option<NaiveTime>,
}

#[derive(Clone)]
pub struct Config {
    pub(crate) path: PathBuf,
    pub(crate) mode: OpenMode,
    pub(crate) max_bytes: u64,
    pub(crate) backup_count: u32,
    pub(crate) encoding: &'static Encoding,
    pub(crate) unicode_error_policy: UnicodeErrorPolicy,
    pub(crate) use_gzip: bool,
    #[cfg(unix)]
    pub(crate) owner: Option<(u32, u32)>,
    #[cfg(unix)]
    pub(crate) chmod: Option<u32>,
    #[cfg(unix)]
    pub(crate) umask: Option<u32>,
    pub(crate) delay: bool,
    pub(crate) terminator: Vec<u8>,
    pub(crate) namer: Option<Namer>,
    pub(crate) lock_file_directory: Option<PathBuf>,
    pub(crate) keep_file_open: bool,
    pub(crate) time_spec: Option<TimeSpec>,
    pub(crate) buffer_capacity: Option<usize>,
    pub(crate) print_message: bool,
}

impl Config {
    pub(crate) fn default_terminator() -> Vec<u8> {
        if cfg!(windows) {
            b"\r\n".to_vec()
        } else {
            b"\n".to_vec()
        }
    }
}
