use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session / journal location
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// Logical agent session id to watch. May also be passed via `--session`.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Overrides the well-known `$HOME/.claude/projects` root (used in tests).
    #[serde(default)]
    pub journal_root: Option<PathBuf>,
}
