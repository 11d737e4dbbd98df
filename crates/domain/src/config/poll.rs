use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tailer / watcher poll cadence
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Sleep between sweeps when no tailed file yielded new bytes.
    #[serde(default = "d_idle_poll_ms")]
    pub idle_poll_ms: u64,
    /// Minimum interval between successor-file scans.
    #[serde(default = "d_successor_scan_interval_ms")]
    pub successor_scan_interval_ms: u64,
    /// Wall-clock cadence for persisting cursors even if the line
    /// threshold below hasn't been hit.
    #[serde(default = "d_cursor_flush_interval_secs")]
    pub cursor_flush_interval_secs: u64,
    /// Persist a file's cursor once it has this many unsaved lines.
    #[serde(default = "d_cursor_flush_line_threshold")]
    pub cursor_flush_line_threshold: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            idle_poll_ms: d_idle_poll_ms(),
            successor_scan_interval_ms: d_successor_scan_interval_ms(),
            cursor_flush_interval_secs: d_cursor_flush_interval_secs(),
            cursor_flush_line_threshold: d_cursor_flush_line_threshold(),
        }
    }
}

fn d_idle_poll_ms() -> u64 {
    500
}
fn d_successor_scan_interval_ms() -> u64 {
    3_000
}
fn d_cursor_flush_interval_secs() -> u64 {
    5
}
fn d_cursor_flush_line_threshold() -> u64 {
    10
}
