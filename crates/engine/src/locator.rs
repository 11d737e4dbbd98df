//! Finds the journal file for a session and discovers successor files
//! that continue the same logical session under a new uuid-named file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use regex::Regex;

const SUCCESSOR_SCAN_PREFIX_BYTES: usize = 32 * 1024;
const SUCCESSOR_SCAN_LINES: usize = 5;

fn uuid_filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\.jsonl$",
        )
        .unwrap()
    })
}

/// Search `projects_root` (typically `$HOME/.claude/projects`) for a file
/// named `{session_id}.jsonl` in any immediate subdirectory. Returns the
/// first match, or `None` if the session hasn't started yet.
pub fn find_session_file(projects_root: &Path, session_id: &str) -> Option<PathBuf> {
    let target_name = format!("{session_id}.jsonl");
    let entries = std::fs::read_dir(projects_root).ok()?;
    for entry in entries.flatten() {
        let dir = entry.path();
        if !dir.is_dir() {
            continue;
        }
        let candidate = dir.join(&target_name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Throttled scanner for successor files that link to an already-known
/// session id. Checked files (matched or not) are permanently excluded
/// from re-examination, matching the fixed-once nature of the journal
/// format: a file's leading session id doesn't change after it's written.
pub struct SuccessorScanner {
    interval: Duration,
    last_scan: Option<Instant>,
    checked: HashSet<PathBuf>,
}

impl SuccessorScanner {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_scan: None,
            checked: HashSet::new(),
        }
    }

    /// Mark `path` as already accounted for without running a scan pass.
    /// Used to seed the initial session file so it is never "discovered"
    /// as its own successor — its session id is already known, and its
    /// uuid-shaped filename would otherwise match on the first scan.
    pub fn mark_checked(&mut self, path: PathBuf) {
        self.checked.insert(path);
    }

    fn due(&self) -> bool {
        match self.last_scan {
            None => true,
            Some(last) => last.elapsed() >= self.interval,
        }
    }

    /// Scan `dir` for sibling `*.jsonl` files not yet checked. Returns the
    /// paths of newly adopted files: those whose first few lines contain
    /// a `sessionId` present in `known_sessions`.
    pub fn scan(&mut self, dir: &Path, known_sessions: &HashSet<String>) -> Vec<PathBuf> {
        if !self.due() {
            return Vec::new();
        }
        self.last_scan = Some(Instant::now());

        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };

        let mut adopted = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !uuid_filename_re().is_match(name) {
                continue;
            }
            if self.checked.contains(&path) {
                continue;
            }
            self.checked.insert(path.clone());

            if file_links_known_session(&path, known_sessions) {
                adopted.push(path);
            }
        }
        adopted
    }
}

fn file_links_known_session(path: &Path, known_sessions: &HashSet<String>) -> bool {
    let Ok(bytes) = std::fs::read(path) else {
        return false;
    };
    let prefix = &bytes[..bytes.len().min(SUCCESSOR_SCAN_PREFIX_BYTES)];
    let text = String::from_utf8_lossy(prefix);

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .take(SUCCESSOR_SCAN_LINES)
        .any(|line| {
            serde_json::from_str::<serde_json::Value>(line)
                .ok()
                .and_then(|v| v.get("sessionId").and_then(|s| s.as_str()).map(str::to_string))
                .map(|sid| known_sessions.contains(&sid))
                .unwrap_or(false)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn finds_session_file_in_subdirectory() {
        let root = tempfile::tempdir().unwrap();
        let project_dir = root.path().join("proj-a");
        fs::create_dir(&project_dir).unwrap();
        let target = project_dir.join("abc-session.jsonl");
        fs::write(&target, "{}").unwrap();

        let found = find_session_file(root.path(), "abc-session");
        assert_eq!(found, Some(target));
    }

    #[test]
    fn returns_none_when_absent() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("proj-a")).unwrap();
        assert!(find_session_file(root.path(), "nope").is_none());
    }

    #[test]
    fn successor_scan_adopts_matching_uuid_file() {
        let dir = tempfile::tempdir().unwrap();
        let name = "11111111-2222-3333-4444-555555555555.jsonl";
        fs::write(
            dir.path().join(name),
            "{\"sessionId\":\"S\",\"type\":\"user\"}\n",
        )
        .unwrap();

        let mut scanner = SuccessorScanner::new(Duration::from_secs(0));
        let mut known = HashSet::new();
        known.insert("S".to_string());

        let adopted = scanner.scan(dir.path(), &known);
        assert_eq!(adopted, vec![dir.path().join(name)]);
    }

    #[test]
    fn non_uuid_filenames_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("notes.jsonl"),
            "{\"sessionId\":\"S\"}\n",
        )
        .unwrap();

        let mut scanner = SuccessorScanner::new(Duration::from_secs(0));
        let mut known = HashSet::new();
        known.insert("S".to_string());

        assert!(scanner.scan(dir.path(), &known).is_empty());
    }

    #[test]
    fn files_are_never_rechecked_once_scanned() {
        let dir = tempfile::tempdir().unwrap();
        let name = "11111111-2222-3333-4444-555555555555.jsonl";
        let path = dir.path().join(name);
        fs::write(&path, "{\"sessionId\":\"unrelated\"}\n").unwrap();

        let mut scanner = SuccessorScanner::new(Duration::from_secs(0));
        let mut known = HashSet::new();
        known.insert("unrelated".to_string());

        assert!(scanner.scan(dir.path(), &known).is_empty());

        // Even though the file would now match, it was already checked.
        assert!(scanner.scan(dir.path(), &known).is_empty());
    }

    #[test]
    fn throttle_blocks_scans_within_interval() {
        let dir = tempfile::tempdir().unwrap();
        let name = "11111111-2222-3333-4444-555555555555.jsonl";
        fs::write(dir.path().join(name), "{\"sessionId\":\"S\"}\n").unwrap();

        let mut scanner = SuccessorScanner::new(Duration::from_secs(3));
        let mut known = HashSet::new();
        known.insert("S".to_string());

        let first = scanner.scan(dir.path(), &known);
        assert_eq!(first.len(), 1);

        // Second scan is throttled regardless of new content.
        let second = scanner.scan(dir.path(), &known);
        assert!(second.is_empty());
    }
}
