//! Plan state: an insertion-ordered map from task id to `{content, status}`,
//! mirrored onto the tracker as a flat, ordered list.
//!
//! The standard library has no ordered map, so this leans on `indexmap`
//! the way the rest of this corpus reaches for a purpose-built crate
//! rather than hand-rolling a `HashMap` + `Vec<key>` pair.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Deleted,
}

impl TaskStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "in_progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "deleted" => Some(TaskStatus::Deleted),
            _ => None,
        }
    }

    /// Translation table used when exporting to the tracker.
    pub fn tracker_status(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::Completed => "completed",
            TaskStatus::Deleted => "canceled",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanItem {
    pub content: String,
    pub status: TaskStatus,
}

/// Ordered `taskId -> PlanItem` map. Insertion order is presentation order;
/// updates mutate in place so that order survives status/content edits.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    items: IndexMap<String, PlanItem>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_plan(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn insert(&mut self, task_id: impl Into<String>, item: PlanItem) {
        self.items.insert(task_id.into(), item);
    }

    pub fn get(&self, task_id: &str) -> Option<&PlanItem> {
        self.items.get(task_id)
    }

    pub fn remove(&mut self, task_id: &str) -> Option<PlanItem> {
        self.items.shift_remove(task_id)
    }

    pub fn update(&mut self, task_id: &str, f: impl FnOnce(&mut PlanItem)) -> bool {
        match self.items.get_mut(task_id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Flattened, tracker-ready view: ordered list of `{content, status}`
    /// with status translated through [`TaskStatus::tracker_status`].
    pub fn snapshot(&self) -> Vec<PlanSnapshotItem> {
        self.items
            .values()
            .map(|item| PlanSnapshotItem {
                content: item.content.clone(),
                status: item.status.tracker_status().to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanSnapshotItem {
    pub content: String,
    pub status: String,
}
