//! Output-side shapes: the structured "activity" records posted to the
//! tracker — a tagged enum carrying only the fields each variant needs,
//! serialized with `#[serde(tag = "type")]`.

use serde::Serialize;

/// One activity posted to the tracker for a given agent session.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Activity {
    #[serde(rename = "agentSessionId")]
    pub agent_session_id: String,
    pub content: ActivityContent,
    #[serde(skip_serializing_if = "is_false")]
    pub ephemeral: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Activity {
    pub fn new(agent_session_id: impl Into<String>, content: ActivityContent) -> Self {
        Self {
            agent_session_id: agent_session_id.into(),
            content,
            ephemeral: false,
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum ActivityContent {
    #[serde(rename = "thought")]
    Thought { body: String },
    #[serde(rename = "response")]
    Response { body: String },
    #[serde(rename = "action")]
    Action {
        action: String,
        parameter: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },
    #[serde(rename = "error")]
    Error { body: String },
    #[serde(rename = "prompt")]
    Prompt { body: String },
    #[serde(rename = "elicitation")]
    Elicitation { body: String },
}
