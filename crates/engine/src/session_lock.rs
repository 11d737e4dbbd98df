//! Process-exclusive lock per logical agent session id.
//!
//! An `fs2` advisory exclusive lock on a per-session file. The OS
//! releases the lock the instant the holding process exits or crashes,
//! so a stale lock is detected and retaken for free, without hand-
//! rolling a pid liveness probe.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LockFile {
    pid: u32,
    #[serde(rename = "sessionId")]
    session_id: String,
    #[serde(rename = "createdAt")]
    created_at: u64,
}

/// Held for the lifetime of the watcher process. Dropping it releases
/// the advisory lock and removes the lock file.
pub struct SessionLockGuard {
    _file: File,
    path: PathBuf,
}

impl Drop for SessionLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

pub struct SingleSessionLock {
    dir: PathBuf,
}

impl SingleSessionLock {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn system() -> Self {
        Self::new(std::env::temp_dir().join("linear-agent-locks"))
    }

    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.lock"))
    }

    /// Attempt to acquire the lock for `session_id`. Returns `None` when
    /// another live process already holds it.
    pub fn acquire(&self, session_id: &str) -> Option<SessionLockGuard> {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            tracing::warn!(error = %e, "failed to create session lock directory");
            return None;
        }

        let path = self.path_for(session_id);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .read(true)
            .open(&path)
            .ok()?;

        file.try_lock_exclusive().ok()?;

        let contents = LockFile {
            pid: std::process::id(),
            session_id: session_id.to_string(),
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        };
        if let Ok(json) = serde_json::to_vec(&contents) {
            let mut f = &file;
            let _ = f.set_len(0);
            let _ = f.write_all(&json);
            let _ = f.flush();
        }

        tracing::info!(session_id, pid = contents.pid, "session lock acquired");
        Some(SessionLockGuard { _file: file, path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquires_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let lock = SingleSessionLock::new(dir.path());
        let path = lock.path_for("s1");

        let guard = lock.acquire("s1").expect("should acquire");
        assert!(path.exists());

        drop(guard);
        assert!(!path.exists());
    }

    #[test]
    fn second_acquire_blocked_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let lock = SingleSessionLock::new(dir.path());
        let _guard = lock.acquire("s1").unwrap();

        assert!(lock.acquire("s1").is_none());
    }

    #[test]
    fn releasing_allows_reacquire() {
        let dir = tempfile::tempdir().unwrap();
        let lock = SingleSessionLock::new(dir.path());
        let guard = lock.acquire("s1").unwrap();
        drop(guard);

        assert!(lock.acquire("s1").is_some());
    }

    #[test]
    fn different_sessions_do_not_contend() {
        let dir = tempfile::tempdir().unwrap();
        let lock = SingleSessionLock::new(dir.path());
        let _g1 = lock.acquire("s1").unwrap();
        let _g2 = lock.acquire("s2").unwrap();
    }
}
