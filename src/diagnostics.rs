//! Internal error reporting for failures the emitter must swallow. The sink
//! is always stderr; there is no logger tree here to redirect it through.

use std::fmt;

#[derive(Copy, Clone, Debug)]
pub(crate) enum ErrorCode {
    LockRelease,
    Compress,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::LockRelease => "lock_release",
            Self::Compress => "compress",
        };
        f.write_str(s)
    }
}

/// Report and swallow an error: print it to stderr and move on.
///
/// Used where a failure must never be allowed to cascade into a lost record:
/// releasing the sentinel lock, and compressing a rotated backup.
pub(crate) fn eprint_err(code: ErrorCode, msg: &str, err: &dyn std::error::Error) {
    eprintln!("[concurrent_log_writer][{code}] {msg}, caused by {err}");
}
