//! The rotation engine: shifting backups, promoting the active file, and
//! compressing.

pub(crate) mod size;
pub(crate) mod time;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::diagnostics::{eprint_err, ErrorCode};
use crate::error::{Result, WriterError};
use crate::naming::{backup_path, Namer};
pub(crate) use size::SizeRotator;
pub(crate) use time::{TimeRotator, When};

/// Which policy decides rollover. `TimeOrSize` combines both, as allowed by
/// a non-zero `max_bytes` alongside `when`.
pub(crate) enum Policy {
    Size(SizeRotator),
    Time(TimeRotator),
    TimeOrSize(TimeRotator, SizeRotator),
}

impl Policy {
    /// Re-stats `path` (size policies) and resyncs with its modification
    /// time (time policies) before deciding, so the decision reflects
    /// reality under the lock rather than a possibly-stale in-memory value.
    pub(crate) fn should_rollover(&mut self, path: &Path, record_bytes: u64, now: DateTime<Utc>) -> Result<bool> {
        let current_size = current_file_size(path)?;
        match self {
            Policy::Size(s) => Ok(s.should_rollover(current_size, record_bytes)),
            Policy::Time(t) => {
                resync_time_rotator(t, path)?;
                Ok(t.should_rollover(now))
            }
            Policy::TimeOrSize(t, s) => {
                resync_time_rotator(t, path)?;
                Ok(t.should_rollover(now) || s.should_rollover(current_size, record_bytes))
            }
        }
    }

    pub(crate) fn on_rotated(&mut self, now: DateTime<Utc>) {
        match self {
            Policy::Size(_) => {}
            Policy::Time(t) | Policy::TimeOrSize(t, _) => t.on_rotated(now),
        }
    }
}

fn resync_time_rotator(t: &mut TimeRotator, path: &Path) -> Result<()> {
    if let Ok(md) = std::fs::metadata(path) {
        if let Ok(modified) = md.modified() {
            t.sync_with_file_mtime(DateTime::<Utc>::from(modified));
        }
    }
    Ok(())
}

fn current_file_size(path: &Path) -> Result<u64> {
    match std::fs::metadata(path) {
        Ok(md) => Ok(md.len()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(WriterError::Io(e)),
    }
}

/// Runs the shift/promote/compress cascade against `path`. The caller must
/// have already closed any open handle to `path` before calling this, and
/// is responsible for reopening a fresh handle afterward.
///
/// Returns `Ok(())` on success; partial progress (e.g. shift succeeded but
/// compression failed) is left on disk as-is, matching the "renames commit
/// immediately, compression is best-effort" policy.
pub(crate) fn execute(path: &Path, backup_count: u32, use_gzip: bool, namer: Option<&Namer>) -> Result<()> {
    if backup_count == 0 {
        if path.exists() {
            std::fs::remove_file(path).map_err(WriterError::Rotation)?;
        }
        return Ok(());
    }

    // Step 3: delete the file at the retention boundary, then shift the
    // rest up by one index, oldest first.
    let boundary = backup_path(path, backup_count, use_gzip, namer);
    if boundary.exists() {
        std::fs::remove_file(&boundary).map_err(WriterError::Rotation)?;
    }
    for rank in (1..backup_count).rev() {
        let from = backup_path(path, rank, use_gzip, namer);
        let to = backup_path(path, rank + 1, use_gzip, namer);
        if from.exists() {
            std::fs::rename(&from, &to).map_err(WriterError::Rotation)?;
        }
    }

    // Step 4: promote the (now-closed) active file to rank 1, uncompressed.
    let promoted = backup_path(path, 1, false, namer);
    if path.exists() {
        std::fs::rename(path, &promoted).map_err(WriterError::Rotation)?;
    } else {
        // Another writer already rotated and hasn't recreated `path` yet;
        // nothing to promote.
        return Ok(());
    }

    // Step 5: compress in place. Failure here is swallowed: the
    // uncompressed backup remains as evidence.
    if use_gzip {
        if let Err(e) = compress_in_place(&promoted, path, namer) {
            eprint_err(ErrorCode::Compress, "failed to compress rotated backup", &e);
        }
    }

    Ok(())
}

fn compress_in_place(uncompressed: &Path, active_path: &Path, namer: Option<&Namer>) -> io::Result<()> {
    let compressed = backup_path(active_path, 1, true, namer);
    {
        let input = BufReader::new(File::open(uncompressed)?);
        let output = File::create(&compressed)?;
        let mut encoder = GzEncoder::new(BufWriter::new(output), Compression::fast());
        let mut input = input;
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?;
    }
    std::fs::remove_file(uncompressed)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;
    use temp_dir::TempDir;

    #[test]
    fn backup_count_zero_deletes_instead_of_renaming() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, b"hello").unwrap();
        execute(&path, 0, false, None).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn shifts_backups_and_promotes_active_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, b"active").unwrap();
        std::fs::write(dir.path().join("app.log.1"), b"old-1").unwrap();
        std::fs::write(dir.path().join("app.log.2"), b"old-2").unwrap();

        execute(&path, 3, false, None).unwrap();

        assert!(!path.exists());
        assert_eq!(std::fs::read(dir.path().join("app.log.1")).unwrap(), b"active");
        assert_eq!(std::fs::read(dir.path().join("app.log.2")).unwrap(), b"old-1");
        assert_eq!(std::fs::read(dir.path().join("app.log.3")).unwrap(), b"old-2");
    }

    #[test]
    fn overflow_beyond_backup_count_is_deleted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, b"active").unwrap();
        std::fs::write(dir.path().join("app.log.1"), b"old-1").unwrap();
        std::fs::write(dir.path().join("app.log.2"), b"old-2").unwrap();

        execute(&path, 2, false, None).unwrap();

        assert!(!dir.path().join("app.log.3").exists());
        assert_eq!(std::fs::read(dir.path().join("app.log.1")).unwrap(), b"active");
        assert_eq!(std::fs::read(dir.path().join("app.log.2")).unwrap(), b"old-1");
    }

    #[test]
    fn compresses_the_newly_promoted_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, b"active content").unwrap();

        execute(&path, 2, true, None).unwrap();

        assert!(!path.exists());
        assert!(!dir.path().join("app.log.1").exists());
        assert!(dir.path().join("app.log.1.gz").exists());
    }

    #[test]
    fn missing_active_file_is_a_no_op_not_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        // Simulate a race: another writer already rotated `path` away.
        execute(&path, 2, false, None).unwrap();
    }

    #[test]
    fn size_rotator_policy_combines_with_bytes_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"0123456789").unwrap();
        drop(f);

        let mut policy = Policy::Size(SizeRotator::new(15));
        assert!(!policy.should_rollover(&path, 1, Utc::now()).unwrap());
        assert!(policy.should_rollover(&path, 10, Utc::now()).unwrap());
    }
}
