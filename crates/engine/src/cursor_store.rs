//! Per-file cursor persistence: the minimal state needed to resume
//! tailing without replaying already-delivered lines.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CursorState {
    #[serde(rename = "byteOffset")]
    pub byte_offset: u64,
    #[serde(rename = "lineCount")]
    pub line_count: u64,
    #[serde(rename = "lastUuid")]
    pub last_uuid: Option<String>,
}

/// Best-effort JSON-file-per-key persistence. Keys are the first 16 hex
/// chars of the SHA-256 of the tailed file's absolute path, stored as
/// `/tmp/claude-linear-cursor-<hash>.json`.
#[derive(Clone)]
pub struct CursorStore {
    dir: PathBuf,
}

impl CursorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    fn path_for(&self, file_path: &Path) -> PathBuf {
        self.dir
            .join(format!("claude-linear-cursor-{}.json", file_key(file_path)))
    }

    /// Load the cursor for `file_path`. Missing or corrupt files are
    /// treated identically: no cursor, start from offset 0.
    pub fn load(&self, file_path: &Path) -> Option<CursorState> {
        let path = self.path_for(file_path);
        let raw = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding corrupt cursor file");
                None
            }
        }
    }

    /// Persist the cursor for `file_path`. Failures are logged and
    /// swallowed — cursor writes are never allowed to stall the tailer.
    pub fn save(&self, file_path: &Path, state: &CursorState) {
        let path = self.path_for(file_path);
        match serde_json::to_vec(state) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&path, bytes) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to persist cursor");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize cursor state"),
        }
    }
}

fn file_key(file_path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(file_path.to_string_lossy().as_bytes());
    hex::encode(hasher.finalize())[..16].to_string()
}
