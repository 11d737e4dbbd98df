//! Dispatches journal records to tracker activities.
//!
//! Owns every piece of mutable state the single-threaded cooperative
//! model assigns to the projector: the pending tool-use registry, the
//! plan reducer, and the shared rate limiter gating every outbound
//! write. Driven from one task only (see `watcher.rs`), so no internal
//! locking is needed around any of it.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use ab_domain::activity::{Activity, ActivityContent};
use ab_domain::record::{
    AssistantContentBlock, AssistantRecord, JournalRecord, QueueOperationRecord, SummaryRecord,
    ToolResultContent, UserContentBlock, UserContent, UserRecord,
};
use ab_tracker::TrackerClient;

use crate::plan_reducer::PlanReducer;
use crate::rate_limiter::RateLimiter;
use crate::tool_map::map_tool;

struct PendingToolUse {
    name: String,
    input: Value,
}

pub struct RecordProjector {
    session_id: String,
    tracker: Arc<dyn TrackerClient>,
    rate_limiter: Arc<RateLimiter>,
    pending: HashMap<String, PendingToolUse>,
    plan: PlanReducer,
}

impl RecordProjector {
    pub fn new(
        session_id: impl Into<String>,
        tracker: Arc<dyn TrackerClient>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            tracker,
            rate_limiter,
            pending: HashMap::new(),
            plan: PlanReducer::new(),
        }
    }

    pub async fn process(&mut self, record: &JournalRecord) {
        match record {
            JournalRecord::Assistant(a) => self.process_assistant(a).await,
            JournalRecord::User(u) => self.process_user(u).await,
            JournalRecord::Summary(s) => self.process_summary(s).await,
            JournalRecord::QueueOperation(q) => self.process_queue_operation(q).await,
            _ => {}
        }
    }

    async fn process_assistant(&mut self, record: &AssistantRecord) {
        if record.is_api_error_message {
            let body = record
                .message
                .content
                .iter()
                .filter_map(|block| match block {
                    AssistantContentBlock::Text { text } => Some(text.as_str()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(" ");
            if !body.is_empty() {
                self.emit(ActivityContent::Error { body }, false).await;
            }
            return;
        }

        let Some(block) = record.message.content.first() else {
            return;
        };

        match block {
            AssistantContentBlock::Thinking { thinking } => {
                self.emit(
                    ActivityContent::Thought {
                        body: thinking.clone(),
                    },
                    true,
                )
                .await;
            }
            AssistantContentBlock::Text { text } => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    self.emit(
                        ActivityContent::Response {
                            body: trimmed.to_string(),
                        },
                        false,
                    )
                    .await;
                }
            }
            AssistantContentBlock::ToolUse { id, name, input } => {
                self.pending.insert(
                    id.clone(),
                    PendingToolUse {
                        name: name.clone(),
                        input: input.clone(),
                    },
                );
                if let Some(mapped) = map_tool(name, input, None) {
                    self.emit(
                        ActivityContent::Action {
                            action: mapped.action,
                            parameter: mapped.parameter,
                            result: None,
                        },
                        true,
                    )
                    .await;
                }
            }
            AssistantContentBlock::Other => {}
        }
    }

    async fn process_user(&mut self, record: &UserRecord) {
        if record.source_tool_assistant_uuid.is_none() {
            if let UserContent::Text(text) = &record.message.content {
                if let Some(captured) = extract_tag(text, "prompt") {
                    if !captured.is_empty() {
                        self.emit(
                            ActivityContent::Response {
                                body: format!("> **External prompt:** {captured}"),
                            },
                            false,
                        )
                        .await;
                    }
                }
            }
            return;
        }

        if let UserContent::Blocks(blocks) = &record.message.content {
            for block in blocks {
                if let UserContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } = block
                {
                    self.handle_tool_result(tool_use_id, content, *is_error).await;
                }
            }
        }
    }

    async fn handle_tool_result(&mut self, tool_use_id: &str, content: &ToolResultContent, is_error: bool) {
        let Some(pending) = self.pending.remove(tool_use_id) else {
            return;
        };
        let flattened = content.flatten();
        let mapped = map_tool(&pending.name, &pending.input, Some(&flattened));
        let parameter_suffix = |mapped: &Option<crate::tool_map::MappedAction>| {
            mapped
                .as_ref()
                .filter(|m| !m.parameter.is_empty())
                .map(|m| format!(" `{}`", m.parameter))
                .unwrap_or_default()
        };

        if flattened.contains("<tool_use_error>") {
            self.emit(
                ActivityContent::Error {
                    body: format!("**{}**{} failed", pending.name, parameter_suffix(&mapped)),
                },
                false,
            )
            .await;
            return;
        }
        if is_error {
            self.emit(
                ActivityContent::Error {
                    body: format!(
                        "**{}**{} failed:\n{flattened}",
                        pending.name,
                        parameter_suffix(&mapped)
                    ),
                },
                false,
            )
            .await;
            return;
        }

        match pending.name.as_str() {
            "TaskCreate" => self.plan.handle_task_create(&pending.input, &flattened),
            "TaskUpdate" => self.plan.handle_task_update(&pending.input),
            "TodoWrite" => self.plan.handle_todo_write(&pending.input),
            _ => {}
        }
        if self.plan.has_plan() {
            self.update_plan().await;
        }

        if let Some(mapped) = mapped {
            self.emit(
                ActivityContent::Action {
                    action: mapped.action,
                    parameter: mapped.parameter,
                    result: mapped.result,
                },
                false,
            )
            .await;
        }
    }

    async fn process_summary(&mut self, record: &SummaryRecord) {
        self.emit(
            ActivityContent::Thought {
                body: format!("Context: {}", record.summary),
            },
            false,
        )
        .await;
    }

    async fn process_queue_operation(&mut self, record: &QueueOperationRecord) {
        if record.operation != "enqueue" {
            return;
        }
        let Some(content) = &record.content else {
            return;
        };
        let Some(summary) = extract_tag(content, "summary") else {
            return;
        };
        let failed = extract_tag(content, "status").as_deref() == Some("failed");

        if failed {
            self.emit(ActivityContent::Error { body: summary }, false).await;
        } else {
            // The spec's dynamic `{type: "action", body}` shape doesn't
            // fit the typed `Action` variant (action/parameter/result);
            // a generic label keeps the activity an "action" card while
            // carrying the summary as its parameter. See DESIGN.md.
            self.emit(
                ActivityContent::Action {
                    action: "Background job update".into(),
                    parameter: summary,
                    result: None,
                },
                false,
            )
            .await;
        }
    }

    async fn emit(&self, content: ActivityContent, ephemeral: bool) {
        self.rate_limiter.acquire().await;
        let mut activity = Activity::new(self.session_id.clone(), content);
        if ephemeral {
            activity = activity.ephemeral();
        }
        if let Err(e) = self.tracker.create_activity(activity).await {
            tracing::warn!(error = %e, "failed to post activity to tracker");
        }
    }

    async fn update_plan(&self) {
        self.rate_limiter.acquire().await;
        if let Err(e) = self
            .tracker
            .update_session_plan(&self.session_id, self.plan.snapshot())
            .await
        {
            tracing::warn!(error = %e, "failed to update session plan");
        }
    }
}

fn extract_tag(text: &str, tag: &str) -> Option<String> {
    static CACHE: OnceLock<parking_lot::Mutex<HashMap<String, Regex>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| parking_lot::Mutex::new(HashMap::new()));
    let mut cache = cache.lock();
    let re = cache.entry(tag.to_string()).or_insert_with(|| {
        Regex::new(&format!(r"(?s)<{tag}>(.*?)</{tag}>")).expect("static tag regex is valid")
    });
    re.captures(text).map(|caps| caps[1].to_string())
}
