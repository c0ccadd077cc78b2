use thiserror::Error;

/// Errors raised by [`crate::ConcurrentFileWriter`] and its builder.
///
/// Per the error-handling policy: only [`WriterError::Configuration`]-shaped
/// failures are ever raised synchronously at construction time. Everything
/// else is returned from [`std::io::Write::write`]/`flush` calls during
/// emit; lock-release failures and gzip-compression failures are never
/// returned here. They are reported internally (see [`crate::diagnostics`])
/// and otherwise swallowed, so that a bug in cleanup never loses an
/// already-written record.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WriterError {
    /// Raised at construction time: a parent directory does not exist and
    /// could not be created, or (POSIX only) applying the configured owner
    /// to a newly created file failed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A read/write/stat/rename failed; the underlying OS error is preserved.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be represented in the configured encoding, and the
    /// configured [`crate::encoding::UnicodeErrorPolicy`] is `Strict`.
    #[error("record is not representable in the configured encoding")]
    Encoding,

    /// Rotation failed partway through (after at least one rename already
    /// committed). The handler is left in a recoverable state: handles are
    /// closed and will be reopened on the next emit.
    #[error("rotation failed: {0}")]
    Rotation(#[source] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WriterError>;
