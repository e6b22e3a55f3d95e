//! Advisory lock around a store file's read-modify-write cycle.
//!
//! The lock is a directory next to the store file, created atomically with
//! `create_dir`:
//!
//! ```text
//! jane_eod_data_2024-03-01.json.lock/
//! └── meta.json    # { pid, created }
//! ```
//!
//! A lock is taken over when its holder is no longer running, when its
//! metadata cannot be read (after a short grace period for a holder that is
//! still writing it), or when it is older than [`STALE_LOCK_SECS`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fs_err as fs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShiftError};

/// Locks older than this are abandoned regardless of their holder.
pub const STALE_LOCK_SECS: u64 = 30;

/// A lock directory without readable metadata is left alone this long.
const UNREADABLE_GRACE_SECS: u64 = 2;

const RETRY_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockMeta {
    pid: u32,
    /// Unix seconds.
    created: u64,
}

/// Held lock; released when dropped.
#[derive(Debug)]
pub struct StoreLock {
    dir: PathBuf,
}

impl StoreLock {
    /// Blocks until the lock for `store_path` is held or `timeout` elapses.
    pub fn acquire(store_path: &Path, timeout: Duration) -> Result<StoreLock> {
        let dir = lock_dir_for(store_path);
        if let Some(parent) = dir.parent() {
            fs::create_dir_all(parent).map_err(|e| ShiftError::Io {
                context: format!("creating {}", parent.display()),
                source: e,
            })?;
        }

        let started = std::time::Instant::now();
        loop {
            match fs::create_dir(&dir) {
                Ok(()) => {
                    if let Err(e) = write_meta(&dir) {
                        let _ = fs::remove_dir_all(&dir);
                        return Err(e);
                    }
                    tracing::trace!(lock = %dir.display(), "Store lock acquired");
                    return Ok(StoreLock { dir });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if is_stale(&dir) {
                        tracing::warn!(lock = %dir.display(), "Taking over stale store lock");
                        let _ = fs::remove_dir_all(&dir);
                        continue;
                    }
                }
                Err(e) => {
                    return Err(ShiftError::Io {
                        context: format!("creating lock {}", dir.display()),
                        source: e,
                    })
                }
            }

            if started.elapsed() >= timeout {
                return Err(ShiftError::LockTimeout(dir));
            }
            thread::sleep(RETRY_INTERVAL);
        }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.dir) {
            tracing::warn!(lock = %self.dir.display(), error = %e, "Failed to release store lock");
        }
    }
}

/// `/dir/name.json` → `/dir/name.json.lock`
pub fn lock_dir_for(store_path: &Path) -> PathBuf {
    let mut name = store_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    store_path.with_file_name(name)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn write_meta(dir: &Path) -> Result<()> {
    let meta = LockMeta {
        pid: std::process::id(),
        created: unix_now(),
    };
    let content = serde_json::to_string(&meta).map_err(|e| ShiftError::Json {
        context: "serializing lock metadata".to_string(),
        source: e,
    })?;
    fs::write(dir.join("meta.json"), content).map_err(|e| ShiftError::Io {
        context: format!("writing lock metadata in {}", dir.display()),
        source: e,
    })
}

fn read_meta(dir: &Path) -> Option<LockMeta> {
    let content = fs::read_to_string(dir.join("meta.json")).ok()?;
    serde_json::from_str(&content).ok()
}

fn dir_age_secs(dir: &Path) -> Option<u64> {
    let modified = fs::metadata(dir).ok()?.modified().ok()?;
    SystemTime::now()
        .duration_since(modified)
        .ok()
        .map(|d| d.as_secs())
}

fn is_stale(dir: &Path) -> bool {
    match read_meta(dir) {
        Some(meta) => {
            unix_now().saturating_sub(meta.created) > STALE_LOCK_SECS || !is_pid_alive(meta.pid)
        }
        None => dir_age_secs(dir).map_or(true, |age| age >= UNREADABLE_GRACE_SECS),
    }
}

fn is_pid_alive(pid: u32) -> bool {
    #[cfg(unix)]
    {
        // SAFETY: kill(pid, 0) only checks for existence; no signal is delivered.
        #[allow(unsafe_code)]
        unsafe {
            libc::kill(pid as i32, 0) == 0
        }
    }
    #[cfg(not(unix))]
    {
        let _ = pid;
        true
    }
}
