//! A multi-process-safe rotating log file writer.
//!
//! Writers on the same host, or on distinct hosts sharing a networked
//! filesystem, can append records to a single log file with no
//! interleaving, coordinated size- or time-based rotation, and no record
//! loss even if a writer crashes mid-rotation.
//!
//! This crate implements the core protocol only: the inter-process lock,
//! the handle-identity check that detects externally-caused rotation, the
//! rotation engine, and the size/time rotation policies. It does not
//! implement a logger tree, level filtering, background-queue offload, or
//! configuration-file parsing; those remain the caller's concern.
//!
//! ```no_run
//! use concurrent_log_writer::ConcurrentFileWriterBuilder;
//!
//! let writer = ConcurrentFileWriterBuilder::new("/var/log/app.log")
//!     .max_bytes(10 * 1024 * 1024)
//!     .backup_count(5)
//!     .use_gzip(true)
//!     .try_build()
//!     .unwrap();
//!
//! writer.write_record(b"hello, world").unwrap();
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]

mod builder;
mod config;
mod diagnostics;
mod encoding;
mod error;
mod handle;
mod lock;
mod naming;
mod rotation;
mod writer;

pub use builder::ConcurrentFileWriterBuilder;
pub use config::OpenMode;
pub use encoding::UnicodeErrorPolicy;
pub use error::{Result, WriterError};
pub use naming::{default_backup_name, Namer};
pub use rotation::When;
pub use writer::ConcurrentFileWriter;

pub use encoding_rs::Encoding;
