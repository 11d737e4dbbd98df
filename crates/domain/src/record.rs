//! Journal record types — the on-disk, line-delimited JSON shapes written
//! by the upstream coding agent into its session transcript.
//!
//! Parsing happens in two passes (see `ab_engine::tailer`): a raw
//! `serde_json::Value` is decoded first so the tailer can always recover
//! `uuid`/`sessionId` regardless of `type`, then the same value is
//! re-decoded into [`JournalRecord`] for dispatch. Unknown `type` values
//! fall through to `JournalRecord::Other` rather than failing to parse.

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum JournalRecord {
    #[serde(rename = "assistant")]
    Assistant(AssistantRecord),
    #[serde(rename = "user")]
    User(UserRecord),
    #[serde(rename = "summary")]
    Summary(SummaryRecord),
    #[serde(rename = "queue-operation")]
    QueueOperation(QueueOperationRecord),
    #[serde(rename = "progress")]
    Progress,
    #[serde(rename = "file-history-snapshot")]
    FileHistorySnapshot,
    #[serde(rename = "system")]
    System,
    #[serde(other)]
    Other,
}

// ── assistant ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantRecord {
    #[serde(rename = "isApiErrorMessage", default)]
    pub is_api_error_message: bool,
    pub message: AssistantMessage,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: Vec<AssistantContentBlock>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum AssistantContentBlock {
    #[serde(rename = "thinking")]
    Thinking { thinking: String },
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

// ── user ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "sourceToolAssistantUUID", default)]
    pub source_tool_assistant_uuid: Option<String>,
    pub message: UserMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserMessage {
    pub content: UserContent,
}

/// `message.content` is either a plain string (real user prompts carry the
/// prompt text this way, wrapped in `<prompt>...</prompt>`) or an array of
/// tagged content blocks (the synthetic tool-result carrier).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    Text(String),
    Blocks(Vec<UserContentBlock>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum UserContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: ToolResultContent,
        #[serde(default)]
        is_error: bool,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Parts(Vec<ToolResultPart>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolResultPart {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl ToolResultContent {
    /// Flatten to a single string: the text as-is, or each part's `.text`
    /// joined by newlines (parts without a `text` field contribute nothing).
    pub fn flatten(&self) -> String {
        match self {
            ToolResultContent::Text(s) => s.clone(),
            ToolResultContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

// ── summary ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SummaryRecord {
    pub summary: String,
}

// ── queue-operation ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct QueueOperationRecord {
    pub operation: String,
    #[serde(default)]
    pub content: Option<String>,
}

// ── tool input shapes consumed by the plan reducer ──────────────────

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskCreateInput {
    #[serde(default)]
    pub subject: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskUpdateInput {
    #[serde(rename = "taskId", default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TodoWriteInput {
    #[serde(default)]
    pub todos: Vec<TodoItem>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TodoItem {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: Option<String>,
}
