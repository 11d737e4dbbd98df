//! The watcher orchestrator: the single cooperative event loop that ties
//! the locator, tailers, successor scanner, projector, and cursor store
//! together. Everything here runs on one task; no internal locking is
//! needed around the pending-tool-use map, plan reducer, or rate
//! limiter because nothing else ever touches them concurrently.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ab_domain::config::PollConfig;
use ab_domain::record::JournalRecord;
use ab_domain::{Error, Result};
use ab_tracker::TrackerClient;
use serde_json::Value;

use crate::cursor_store::CursorStore;
use crate::locator::{find_session_file, SuccessorScanner};
use crate::projector::RecordProjector;
use crate::rate_limiter::RateLimiter;
use crate::tailer::FileTailer;

struct TailedFile {
    tailer: FileTailer,
    unsaved_lines: u64,
}

pub struct Watcher {
    tracker: Arc<dyn TrackerClient>,
    rate_limiter: Arc<RateLimiter>,
    cursor_store: CursorStore,
    poll: PollConfig,
    projector: RecordProjector,
    known_sessions: HashSet<String>,
    scanner: SuccessorScanner,
    dir: PathBuf,
    files: Vec<TailedFile>,
    last_flush: Instant,
}

impl Watcher {
    /// Locate the session's journal file and seed the watcher's state
    /// from any cursor persisted by a previous run. Returns `Ok(None)`
    /// when the session hasn't produced a journal file yet, so the
    /// caller can retry or exit cleanly rather than treating it as an
    /// error.
    pub fn start(
        session_id: impl Into<String>,
        journal_root: &Path,
        tracker: Arc<dyn TrackerClient>,
        rate_limiter: Arc<RateLimiter>,
        cursor_store: CursorStore,
        poll: PollConfig,
    ) -> Result<Option<Self>> {
        let session_id = session_id.into();
        let Some(initial) = find_session_file(journal_root, &session_id) else {
            return Ok(None);
        };
        let dir = initial
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::Other("session file has no parent directory".into()))?;

        let tailer = match cursor_store.load(&initial) {
            Some(cursor) => FileTailer::resume(&initial, &cursor),
            None => FileTailer::new(&initial),
        };

        let mut known_sessions = HashSet::new();
        known_sessions.insert(session_id.clone());

        let projector = RecordProjector::new(session_id, tracker.clone(), rate_limiter.clone());
        let mut scanner = SuccessorScanner::new(Duration::from_millis(poll.successor_scan_interval_ms));
        // The initial file is itself uuid-named and already linked to a
        // known session id; without this it would be "discovered" as its
        // own successor on the first scan and re-tailed from offset 0.
        scanner.mark_checked(initial.clone());

        tracing::info!(path = %initial.display(), "session file located");

        Ok(Some(Self {
            tracker,
            rate_limiter,
            cursor_store,
            poll,
            projector,
            known_sessions,
            scanner,
            dir,
            files: vec![TailedFile {
                tailer,
                unsaved_lines: 0,
            }],
            last_flush: Instant::now(),
        }))
    }

    /// One iteration of the main loop: read new lines from every tailed
    /// file, adopt any newly-discovered successors, and flush cursors on
    /// schedule. Returns the number of bytes consumed this iteration.
    async fn step(&mut self) -> Result<u64> {
        let mut total_bytes = 0u64;

        for file in &mut self.files {
            let before = file.tailer.read_position();
            let lines = file.tailer.poll().await?;
            for line in &lines {
                if let Ok(raw) = serde_json::from_str::<Value>(&line.text) {
                    if let Some(sid) = raw.get("sessionId").and_then(Value::as_str) {
                        self.known_sessions.insert(sid.to_string());
                    }
                    file.tailer
                        .note_record_uuid(raw.get("uuid").and_then(Value::as_str));
                    match serde_json::from_value::<JournalRecord>(raw) {
                        Ok(record) => self.projector.process(&record).await,
                        Err(e) => tracing::warn!(error = %e, "failed to decode journal record"),
                    }
                } else {
                    tracing::warn!(line = %line.text, "dropping unparseable journal line");
                }
                file.unsaved_lines += 1;
            }
            let after = file.tailer.read_position();
            total_bytes += after - before;
        }

        let adopted = self.scanner.scan(&self.dir, &self.known_sessions);
        for path in adopted {
            tracing::info!(path = %path.display(), "adopting successor journal file");
            let tailer = match self.cursor_store.load(&path) {
                Some(cursor) => FileTailer::resume(&path, &cursor),
                None => FileTailer::new(&path),
            };
            self.files.push(TailedFile {
                tailer,
                unsaved_lines: 0,
            });
        }

        self.maybe_flush_cursors();

        Ok(total_bytes)
    }

    fn maybe_flush_cursors(&mut self) {
        let due_by_time = self.last_flush.elapsed() >= Duration::from_secs(self.poll.cursor_flush_interval_secs);
        let due_by_lines = self
            .files
            .iter()
            .any(|f| f.unsaved_lines >= self.poll.cursor_flush_line_threshold);

        if !due_by_time && !due_by_lines {
            return;
        }
        self.flush_cursors();
    }

    fn flush_cursors(&mut self) {
        for file in &mut self.files {
            self.cursor_store.save(file.tailer.path(), &file.tailer.cursor());
            file.unsaved_lines = 0;
        }
        self.last_flush = Instant::now();
    }

    /// Run until `stopping` is set, then drain every tailed file one
    /// final time and persist cursors before returning.
    pub async fn run(mut self, stopping: Arc<AtomicBool>) -> Result<()> {
        loop {
            if stopping.load(Ordering::Relaxed) {
                break;
            }
            let bytes = self.step().await?;
            if bytes == 0 {
                tokio::time::sleep(Duration::from_millis(self.poll.idle_poll_ms)).await;
            }
        }

        self.step().await?;
        self.flush_cursors();
        tracing::info!(files = self.files.len(), "watcher shutting down");
        Ok(())
    }
}

/// Installs `ctrl_c` and (on unix) `SIGTERM` handlers that flip the
/// returned flag. Idempotent: repeated signals just re-set the flag.
pub fn install_shutdown_signal() -> Arc<AtomicBool> {
    let stopping = Arc::new(AtomicBool::new(false));

    let flag = stopping.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            flag.store(true, Ordering::Relaxed);
        }
    });

    #[cfg(unix)]
    {
        let flag = stopping.clone();
        tokio::spawn(async move {
            if let Ok(mut term) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                term.recv().await;
                flag.store(true, Ordering::Relaxed);
            }
        });
    }

    stopping
}

#[cfg(test)]
mod tests {
    use super::*;
    use ab_tracker::RecordingTrackerClient;
    use std::fs;
    use std::io::Write;

    fn poll_config() -> PollConfig {
        PollConfig {
            idle_poll_ms: 1,
            successor_scan_interval_ms: 0,
            cursor_flush_interval_secs: 0,
            cursor_flush_line_threshold: 1,
        }
    }

    #[tokio::test]
    async fn start_returns_none_when_session_file_absent() {
        let root = tempfile::tempdir().unwrap();
        let cursor_dir = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("proj")).unwrap();

        let watcher = Watcher::start(
            "missing-session",
            root.path(),
            Arc::new(RecordingTrackerClient::new()),
            Arc::new(RateLimiter::new(100.0, 10)),
            CursorStore::new(cursor_dir.path()),
            poll_config(),
        )
        .unwrap();

        assert!(watcher.is_none());
    }

    #[tokio::test]
    async fn step_processes_lines_and_flushes_cursor() {
        let root = tempfile::tempdir().unwrap();
        let cursor_dir = tempfile::tempdir().unwrap();
        let project_dir = root.path().join("proj");
        fs::create_dir(&project_dir).unwrap();

        let session_file = project_dir.join("sess-1.jsonl");
        let mut f = fs::File::create(&session_file).unwrap();
        writeln!(
            f,
            r#"{{"type":"assistant","sessionId":"sess-1","message":{{"content":[{{"type":"text","text":"hello"}}]}}}}"#
        )
        .unwrap();
        f.flush().unwrap();

        let tracker = Arc::new(RecordingTrackerClient::new());
        let mut watcher = Watcher::start(
            "sess-1",
            root.path(),
            tracker.clone(),
            Arc::new(RateLimiter::new(100.0, 10)),
            CursorStore::new(cursor_dir.path()),
            poll_config(),
        )
        .unwrap()
        .unwrap();

        let bytes = watcher.step().await.unwrap();
        assert!(bytes > 0);
        assert_eq!(tracker.activities().len(), 1);

        let cursor = CursorStore::new(cursor_dir.path()).load(&session_file);
        assert!(cursor.is_some());
    }

    #[tokio::test]
    async fn successor_file_is_adopted_mid_run() {
        let root = tempfile::tempdir().unwrap();
        let cursor_dir = tempfile::tempdir().unwrap();
        let project_dir = root.path().join("proj");
        fs::create_dir(&project_dir).unwrap();

        let session_file = project_dir.join("sess-1.jsonl");
        fs::write(
            &session_file,
            "{\"type\":\"system\",\"sessionId\":\"sess-1\"}\n",
        )
        .unwrap();

        let successor_name = "11111111-2222-3333-4444-555555555555.jsonl";
        fs::write(
            project_dir.join(successor_name),
            "{\"type\":\"system\",\"sessionId\":\"sess-1\"}\n",
        )
        .unwrap();

        let tracker = Arc::new(RecordingTrackerClient::new());
        let mut watcher = Watcher::start(
            "sess-1",
            root.path(),
            tracker,
            Arc::new(RateLimiter::new(100.0, 10)),
            CursorStore::new(cursor_dir.path()),
            poll_config(),
        )
        .unwrap()
        .unwrap();

        watcher.step().await.unwrap();
        assert_eq!(watcher.files.len(), 2);
    }

    #[tokio::test]
    async fn uuid_named_initial_file_is_not_adopted_as_its_own_successor() {
        let root = tempfile::tempdir().unwrap();
        let cursor_dir = tempfile::tempdir().unwrap();
        let project_dir = root.path().join("proj");
        fs::create_dir(&project_dir).unwrap();

        let session_id = "11111111-2222-3333-4444-555555555555";
        let session_file = project_dir.join(format!("{session_id}.jsonl"));
        fs::write(
            &session_file,
            format!("{{\"type\":\"system\",\"sessionId\":\"{session_id}\"}}\n"),
        )
        .unwrap();

        let mut watcher = Watcher::start(
            session_id,
            root.path(),
            Arc::new(RecordingTrackerClient::new()),
            Arc::new(RateLimiter::new(100.0, 10)),
            CursorStore::new(cursor_dir.path()),
            poll_config(),
        )
        .unwrap()
        .unwrap();

        watcher.step().await.unwrap();
        watcher.step().await.unwrap();
        assert_eq!(watcher.files.len(), 1);
    }

    #[tokio::test]
    async fn run_drains_and_stops_when_flag_is_set() {
        let root = tempfile::tempdir().unwrap();
        let cursor_dir = tempfile::tempdir().unwrap();
        let project_dir = root.path().join("proj");
        fs::create_dir(&project_dir).unwrap();
        let session_file = project_dir.join("sess-1.jsonl");
        fs::write(&session_file, "").unwrap();

        let watcher = Watcher::start(
            "sess-1",
            root.path(),
            Arc::new(RecordingTrackerClient::new()),
            Arc::new(RateLimiter::new(100.0, 10)),
            CursorStore::new(cursor_dir.path()),
            poll_config(),
        )
        .unwrap()
        .unwrap();

        let stopping = Arc::new(AtomicBool::new(true));
        watcher.run(stopping).await.unwrap();
    }
}
