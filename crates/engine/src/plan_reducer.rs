//! Drives the insertion-ordered `Plan` from observed `TaskCreate` /
//! `TaskUpdate` / `TodoWrite` tool results.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use ab_domain::plan::{Plan, PlanItem, PlanSnapshotItem, TaskStatus};
use ab_domain::record::{TaskCreateInput, TaskUpdateInput, TodoWriteInput};

fn task_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Task #(\d+)").unwrap())
}

#[derive(Debug, Default)]
pub struct PlanReducer {
    plan: Plan,
}

impl PlanReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_plan(&self) -> bool {
        self.plan.has_plan()
    }

    pub fn snapshot(&self) -> Vec<PlanSnapshotItem> {
        self.plan.snapshot()
    }

    /// Parse `Task #(\d+)` out of the result text; on no match, ignore
    /// the create entirely (a fresh id could not be determined).
    pub fn handle_task_create(&mut self, input: &Value, result_text: &str) {
        let Some(caps) = task_id_re().captures(result_text) else {
            return;
        };
        let task_id = caps[1].to_string();
        let parsed: TaskCreateInput = serde_json::from_value(input.clone()).unwrap_or_default();
        self.plan.insert(
            task_id,
            PlanItem {
                content: parsed.subject,
                status: TaskStatus::Pending,
            },
        );
    }

    pub fn handle_task_update(&mut self, input: &Value) {
        let parsed: TaskUpdateInput = serde_json::from_value(input.clone()).unwrap_or_default();
        let Some(task_id) = parsed.task_id else {
            return;
        };
        if self.plan.get(&task_id).is_none() {
            return;
        }
        if parsed.status.as_deref() == Some("deleted") {
            self.plan.remove(&task_id);
            return;
        }
        self.plan.update(&task_id, |item| {
            if let Some(status) = parsed.status.as_deref().and_then(TaskStatus::parse) {
                item.status = status;
            }
            if let Some(subject) = parsed.subject {
                item.content = subject;
            }
        });
    }

    /// Replaces the entire plan. Absent `todos` clears it.
    pub fn handle_todo_write(&mut self, input: &Value) {
        self.plan.clear();
        let parsed: TodoWriteInput = serde_json::from_value(input.clone()).unwrap_or_default();
        for (idx, todo) in parsed.todos.into_iter().enumerate() {
            let status = todo
                .status
                .as_deref()
                .and_then(TaskStatus::parse)
                .unwrap_or(TaskStatus::Pending);
            self.plan.insert(
                idx.to_string(),
                PlanItem {
                    content: todo.content,
                    status,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plan_lifecycle_scenario() {
        let mut reducer = PlanReducer::new();
        reducer.handle_task_create(&json!({ "subject": "A" }), "Task #1 ok");
        reducer.handle_task_create(&json!({ "subject": "B" }), "Task #2 ok");
        reducer.handle_task_update(&json!({ "taskId": "1", "status": "completed" }));
        reducer.handle_task_update(&json!({ "taskId": "2", "status": "deleted" }));

        let snapshot = reducer.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].content, "A");
        assert_eq!(snapshot[0].status, "completed");
    }

    #[test]
    fn create_without_parseable_task_number_is_ignored() {
        let mut reducer = PlanReducer::new();
        reducer.handle_task_create(&json!({ "subject": "A" }), "created ok");
        assert!(!reducer.has_plan());
    }

    #[test]
    fn update_of_unknown_task_id_is_ignored() {
        let mut reducer = PlanReducer::new();
        reducer.handle_task_update(&json!({ "taskId": "99", "status": "completed" }));
        assert!(!reducer.has_plan());
    }

    #[test]
    fn todo_write_replaces_whole_plan_and_is_idempotent() {
        let mut reducer = PlanReducer::new();
        let todos = json!({ "todos": [
            { "content": "first", "status": "pending" },
            { "content": "second", "status": "in_progress" },
        ]});

        reducer.handle_todo_write(&todos);
        let first_snapshot = reducer.snapshot();

        reducer.handle_todo_write(&todos);
        let second_snapshot = reducer.snapshot();

        assert_eq!(first_snapshot, second_snapshot);
        assert_eq!(first_snapshot[1].status, "inProgress");
    }

    #[test]
    fn todo_write_with_absent_todos_clears_plan() {
        let mut reducer = PlanReducer::new();
        reducer.handle_todo_write(&json!({ "todos": [{ "content": "x", "status": "pending" }] }));
        assert!(reducer.has_plan());

        reducer.handle_todo_write(&json!({}));
        assert!(!reducer.has_plan());
    }

    #[test]
    fn insertion_order_survives_update() {
        let mut reducer = PlanReducer::new();
        reducer.handle_task_create(&json!({ "subject": "first" }), "Task #1 ok");
        reducer.handle_task_create(&json!({ "subject": "second" }), "Task #2 ok");
        reducer.handle_task_update(&json!({ "taskId": "1", "subject": "first renamed" }));

        let snapshot = reducer.snapshot();
        assert_eq!(snapshot[0].content, "first renamed");
        assert_eq!(snapshot[1].content, "second");
    }
}
