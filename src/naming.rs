//! Backup file naming: the `path.<N>` / `path.<N>.gz` scheme and the
//! optional `namer` override.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A pure, deterministic function mapping a default-computed backup name to
/// an actual one. Implementers must keep it side-effect free: the rotation
/// engine may call it more than once for the same rank while shifting.
pub type Namer = Arc<dyn Fn(&Path) -> PathBuf + Send + Sync>;

/// Computes the default name for backup rank `n` (1 = most recently rotated)
/// of the active log file at `path`, optionally with a `.gz` suffix.
///
/// Rank 0 is the active file itself (`path`, unchanged).
#[must_use]
pub fn default_backup_name(path: &Path, rank: u32, compressed: bool) -> PathBuf {
    debug_assert!(rank >= 1, "rank 0 is the active file, not a backup");
    let mut os_name = path.as_os_str().to_os_string();
    os_name.push(format!(".{rank}"));
    if compressed {
        os_name.push(".gz");
    }
    PathBuf::from(os_name)
}

/// Resolves the on-disk name for backup rank `n`, applying the configured
/// `namer` if one was set.
pub(crate) fn backup_path(path: &Path, rank: u32, compressed: bool, namer: Option<&Namer>) -> PathBuf {
    let default_name = default_backup_name(path, rank, compressed);
    match namer {
        Some(f) => f(&default_name),
        None => default_name,
    }
}
