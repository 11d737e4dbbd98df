use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tracker connection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "d_base_url")]
    pub base_url: String,
    /// Environment variable holding the tracker bearer token.
    #[serde(default = "d_token_env")]
    pub api_token_env: String,
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            base_url: d_base_url(),
            api_token_env: d_token_env(),
            timeout_ms: d_timeout_ms(),
        }
    }
}

fn d_base_url() -> String {
    "https://api.linear.app/agent".into()
}
fn d_token_env() -> String {
    "AB_TRACKER_TOKEN".into()
}
fn d_timeout_ms() -> u64 {
    8_000
}
