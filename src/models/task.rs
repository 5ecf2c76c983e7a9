use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed];

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Pending" => Ok(TaskStatus::Pending),
            "In Progress" => Ok(TaskStatus::InProgress),
            "Completed" => Ok(TaskStatus::Completed),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

// Declaration order is the priority order (Low < Medium < High)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Low" => Ok(Priority::Low),
            "Medium" => Ok(Priority::Medium),
            "High" => Ok(Priority::High),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(default)]
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub assigned_by: Option<String>,
    #[serde(default)]
    pub todo_checklist: Vec<TodoItem>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl Task {
    pub fn completed_todo_count(&self) -> usize {
        self.todo_checklist.iter().filter(|item| item.completed).count()
    }

    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assigned_to.iter().any(|id| id == user_id)
    }
}

/// Per-status counts over the caller's scope, as reported by the task store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub all: u64,
    pub pending_tasks: u64,
    pub in_progress_tasks: u64,
    pub completed_tasks: u64,
}

impl StatusSummary {
    pub fn count(&self, status: TaskStatus) -> u64 {
        match status {
            TaskStatus::Pending => self.pending_tasks,
            TaskStatus::InProgress => self.in_progress_tasks,
            TaskStatus::Completed => self.completed_tasks,
        }
    }

    pub fn record(&mut self, status: TaskStatus) {
        self.all += 1;
        match status {
            TaskStatus::Pending => self.pending_tasks += 1,
            TaskStatus::InProgress => self.in_progress_tasks += 1,
            TaskStatus::Completed => self.completed_tasks += 1,
        }
    }
}

/// Raw answer of the task store for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListing {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub status_summary: StatusSummary,
}
