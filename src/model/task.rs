use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::field::CustomFieldValue;

/// Stable numeric task identifier
pub type TaskId = u64;

/// Task priority, lowest to highest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    None,
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Sort order for priorities, used by the priority column comparator
pub const PRIORITY_ORDER: [Priority; 5] = [
    Priority::None,
    Priority::Low,
    Priority::Medium,
    Priority::High,
    Priority::Urgent,
];

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::None => "none",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Position in [`PRIORITY_ORDER`]
    pub fn rank(self) -> usize {
        PRIORITY_ORDER
            .iter()
            .position(|p| *p == self)
            .unwrap_or(0)
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::None => "None",
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PRIORITY_ORDER
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                format!("invalid priority '{s}' (expected none, low, medium, high, urgent)")
            })
    }
}

/// Task progress state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

/// Sort order for statuses, used by the status column comparator
pub const STATUS_ORDER: [Status; 3] = [Status::NotStarted, Status::InProgress, Status::Completed];

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::NotStarted => "not_started",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
        }
    }

    /// Position in [`STATUS_ORDER`]
    pub fn rank(self) -> usize {
        STATUS_ORDER.iter().position(|s| *s == self).unwrap_or(0)
    }

    /// Human label, e.g. `in_progress` → `In Progress`
    pub fn label(self) -> &'static str {
        match self {
            Status::NotStarted => "Not Started",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        STATUS_ORDER
            .iter()
            .copied()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| {
                format!("invalid status '{s}' (expected not_started, in_progress, completed)")
            })
    }
}

/// A task as stored in `tasks.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub priority: Priority,
    pub status: Status,
    /// One value per registered custom field, in registry order
    #[serde(default)]
    pub custom_fields: Vec<CustomFieldValue>,
}

impl Task {
    /// Look up a custom field value by name
    pub fn field(&self, name: &str) -> Option<&CustomFieldValue> {
        self.custom_fields.iter().find(|f| f.name == name)
    }

    /// Shallow merge: every field present in the patch overwrites; custom fields
    /// are replaced wholesale.
    pub fn merge(&mut self, patch: &TaskPatch) {
        if let Some(ref title) = patch.title {
            self.title = title.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(ref fields) = patch.custom_fields {
            self.custom_fields = fields.clone();
        }
    }
}

/// Everything needed to create a task except its id and custom fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }
}

/// Partial update for a task; `None` leaves the field untouched
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub custom_fields: Option<Vec<CustomFieldValue>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.custom_fields.is_none()
    }
}
