//! Per-branch write lock and atomic file replacement

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs4::fs_std::FileExt;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::constants::defaults::LOCK_POLL_MS;
use crate::constants::format::LOCK_SUFFIX;

/// Lock file guarding a history file (`<history>.lock`)
pub(super) fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(LOCK_SUFFIX);
    PathBuf::from(name)
}

/// Take the exclusive lock on `lock_path`, waiting up to `timeout`
///
/// Returns a scope guard that unlocks on drop, so the lock is released on
/// every exit path of the caller, including `?` returns. `Ok(None)` means the
/// timeout elapsed; a locking error other than contention is returned at once.
pub(super) fn acquire(lock_path: &Path, timeout: Duration) -> io::Result<Option<impl Drop>> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(lock_path)?;

    if !poll_until(timeout, || FileExt::try_lock_exclusive(&file))? {
        return Ok(None);
    }

    debug!(lock = %lock_path.display(), "history lock acquired");
    let lock_path = lock_path.to_path_buf();
    Ok(Some(scopeguard::guard(file, move |file: File| {
        let _ = FileExt::unlock(&file);
        debug!(lock = %lock_path.display(), "history lock released");
    })))
}

/// Retry `try_lock` until it reports `true` or `timeout` elapses
///
/// `Ok(false)` is contention and is retried; an error is not.
fn poll_until(
    timeout: Duration,
    mut try_lock: impl FnMut() -> io::Result<bool>,
) -> io::Result<bool> {
    let start = Instant::now();
    loop {
        if try_lock()? {
            return Ok(true);
        }
        if start.elapsed() >= timeout {
            return Ok(false);
        }
        std::thread::sleep(Duration::from_millis(LOCK_POLL_MS));
    }
}

/// Replace `path` with `bytes` atomically
///
/// Writes a sibling temporary file, syncs it, then renames it over `path`.
/// Readers observe either the old or the new content, never a partial write;
/// if anything fails the temporary file is removed and `path` is untouched.
pub(super) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        let mode = std::fs::metadata(path)
            .map(|meta| meta.permissions().mode())
            .unwrap_or(0o644);
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(mode))?;
    }

    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}
