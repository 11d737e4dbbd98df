mod poll;
mod rate_limit;
mod session;
mod tracker;

pub use poll::*;
pub use rate_limit::*;
pub use session::*;
pub use tracker::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub poll: PollConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.tracker.base_url.is_empty() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "tracker.base_url".into(),
                message: "base_url must not be empty".into(),
            });
        } else if !self.tracker.base_url.starts_with("http://")
            && !self.tracker.base_url.starts_with("https://")
        {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "tracker.base_url".into(),
                message: format!(
                    "base_url must start with http:// or https:// (got \"{}\")",
                    self.tracker.base_url
                ),
            });
        }

        if std::env::var(&self.tracker.api_token_env).is_err() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "tracker.api_token_env".into(),
                message: format!(
                    "{} is not set — tracker writes will be unauthenticated",
                    self.tracker.api_token_env
                ),
            });
        }

        if self.session.session_id.is_none() {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "session.session_id".into(),
                message: "no session id configured — must be supplied via --session".into(),
            });
        }

        if self.rate_limit.per_second <= 0.0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "rate_limit.per_second".into(),
                message: "per_second must be greater than 0".into(),
            });
        }
        if self.rate_limit.burst == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Error,
                field: "rate_limit.burst".into(),
                message: "burst must be greater than 0".into(),
            });
        }

        if self.poll.idle_poll_ms == 0 {
            issues.push(ConfigIssue {
                severity: ConfigSeverity::Warning,
                field: "poll.idle_poll_ms".into(),
                message: "idle_poll_ms of 0 will busy-loop on an idle journal".into(),
            });
        }

        issues
    }
}
