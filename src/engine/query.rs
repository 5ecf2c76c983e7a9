use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;

use crate::error::CoreError;
use crate::models::session::CallerIdentity;
use crate::models::task::{Priority, StatusSummary, Task, TaskListing, TaskStatus, TodoItem};
use crate::store::TaskStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    CreatedAt,
    DueDate,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "createdAt",
            SortKey::DueDate => "dueDate",
        }
    }

    fn timestamp(&self, task: &Task) -> DateTime<Utc> {
        match self {
            SortKey::CreatedAt => task.created_at,
            SortKey::DueDate => task.due_date,
        }
    }
}

impl FromStr for SortKey {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "createdAt" => Ok(SortKey::CreatedAt),
            "dueDate" => Ok(SortKey::DueDate),
            other => Err(CoreError::validation(format!("unknown sort key: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

impl FromStr for SortDir {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "asc" => Ok(SortDir::Asc),
            "desc" => Ok(SortDir::Desc),
            other => Err(CoreError::validation(format!("unknown sort order: {}", other))),
        }
    }
}

/// Sort field plus direction. Defaults to newest created first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortOption {
    pub key: SortKey,
    pub dir: SortDir,
}

impl Default for SortOption {
    fn default() -> Self {
        Self { key: SortKey::CreatedAt, dir: SortDir::Desc }
    }
}

impl SortOption {
    pub fn new(key: SortKey, dir: SortDir) -> Self {
        Self { key, dir }
    }

    /// Builds from separate `sortBy` / `sortOrder` values, filling gaps from the default.
    pub fn from_parts(sort_by: Option<&str>, sort_order: Option<&str>) -> Result<Self, CoreError> {
        let default = Self::default();
        let key = match sort_by {
            Some(value) => value.parse::<SortKey>()?,
            None => default.key,
        };
        let dir = match sort_order {
            Some(value) => value.parse::<SortDir>()?,
            None => default.dir,
        };
        Ok(Self { key, dir })
    }

    /// Stable: equal timestamps keep their incoming order.
    pub fn sort(&self, tasks: &mut [Task]) {
        tasks.sort_by(|a, b| self.compare(a, b));
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let ordering = self.key.timestamp(a).cmp(&self.key.timestamp(b));
        match self.dir {
            SortDir::Asc => ordering,
            SortDir::Desc => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.key.as_str(), self.dir.as_str())
    }
}

// Combined form used by the sort dropdown, e.g. "dueDate_asc"
impl FromStr for SortOption {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (key, dir) = value
            .split_once('_')
            .ok_or_else(|| CoreError::validation(format!("invalid sort option: {}", value)))?;
        Ok(Self { key: key.parse()?, dir: dir.parse()? })
    }
}

/// `All` (or nothing) means no status filter.
pub fn parse_status_filter(value: Option<&str>) -> Result<Option<TaskStatus>, CoreError> {
    match value.map(str::trim) {
        None | Some("") | Some("All") => Ok(None),
        Some(label) => label.parse::<TaskStatus>().map(Some).map_err(CoreError::validation),
    }
}

/// The combinable filter state behind the task pages and sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub status: Option<TaskStatus>,
    pub user_id: Option<String>,
    pub sort: SortOption,
    pub search_term: Option<String>,
}

impl FilterSelection {
    /// Selecting the active status clears it, anything else replaces it.
    pub fn toggle_status(&mut self, status: TaskStatus) {
        self.status = match self.status {
            Some(active) if active == status => None,
            _ => Some(status),
        };
    }

    pub fn toggle_user(&mut self, user_id: &str) {
        self.user_id = match self.user_id.as_deref() {
            Some(active) if active == user_id => None,
            _ => Some(user_id.to_string()),
        };
    }

    pub fn set_sort(&mut self, sort: SortOption) {
        self.sort = sort;
    }

    pub fn set_search(&mut self, term: Option<&str>) {
        self.search_term = term.filter(|t| !t.trim().is_empty()).map(str::to_string);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Canonical store query. Non-admins only ever see their own tasks.
    pub fn to_query(&self, caller: &CallerIdentity) -> TaskQuery {
        let (assigned_to, visible_to) = if caller.is_admin() {
            (self.user_id.clone(), None)
        } else {
            (None, Some(caller.id.clone()))
        };

        TaskQuery {
            status: self.status,
            assigned_to,
            sort: self.sort,
            search: self.search_term.clone(),
            visible_to,
        }
    }
}

/// What the task store is asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<String>,
    pub sort: SortOption,
    pub search: Option<String>,
    pub visible_to: Option<String>,
}

impl TaskQuery {
    /// Every task, unfiltered. Used by the grouping and mailbox joins.
    pub fn everything() -> Self {
        Self::default()
    }

    /// Scope part of the query: everything except the status filter.
    pub fn in_scope(&self, task: &Task) -> bool {
        if let Some(user_id) = &self.visible_to {
            if !task.is_assigned_to(user_id) {
                return false;
            }
        }
        if let Some(user_id) = &self.assigned_to {
            if !task.is_assigned_to(user_id) {
                return false;
            }
        }
        match &self.search {
            Some(term) => matches_search(task, term),
            None => true,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.in_scope(task) && self.status.map_or(true, |status| task.status == status)
    }
}

/// Case-insensitive substring match on title and description.
pub fn matches_search(task: &Task, term: &str) -> bool {
    let needle = term.to_lowercase();
    task.title.to_lowercase().contains(&needle) || task.description.to_lowercase().contains(&needle)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tab {
    pub label: &'static str,
    pub count: u64,
}

/// Fixed All / Pending / In Progress / Completed tabs.
pub fn status_tabs(summary: &StatusSummary) -> Vec<Tab> {
    let mut tabs = vec![Tab { label: "All", count: summary.all }];
    tabs.extend(TaskStatus::ALL.iter().map(|status| Tab {
        label: status.label(),
        count: summary.count(*status),
    }));
    tabs
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCard {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub assigned_to: Vec<String>,
    pub assigned_by: Option<String>,
    pub attachment_count: usize,
    pub completed_todo_count: usize,
    pub todo_checklist: Vec<TodoItem>,
}

impl From<Task> for TaskCard {
    fn from(task: Task) -> Self {
        let completed_todo_count = task.completed_todo_count();
        Self {
            attachment_count: task.attachments.len(),
            completed_todo_count,
            id: task.id,
            title: task.title,
            description: task.description,
            priority: task.priority,
            status: task.status,
            progress: task.progress,
            created_at: task.created_at,
            due_date: task.due_date,
            assigned_to: task.assigned_to,
            assigned_by: task.assigned_by,
            todo_checklist: task.todo_checklist,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskBoard {
    pub tabs: Vec<Tab>,
    pub tasks: Vec<TaskCard>,
}

impl TaskBoard {
    pub fn empty() -> Self {
        Self {
            tabs: status_tabs(&StatusSummary::default()),
            tasks: Vec::new(),
        }
    }
}

pub fn build_board(listing: TaskListing, sort: SortOption) -> TaskBoard {
    let TaskListing { mut tasks, status_summary } = listing;
    sort.sort(&mut tasks);
    TaskBoard {
        tabs: status_tabs(&status_summary),
        tasks: tasks.into_iter().map(TaskCard::from).collect(),
    }
}

/// Failed reads degrade to an empty board; the error is handed back for notification.
pub fn board_or_empty(result: Result<TaskListing, CoreError>, sort: SortOption) -> (TaskBoard, Option<CoreError>) {
    match result {
        Ok(listing) => (build_board(listing, sort), None),
        Err(err) => (TaskBoard::empty(), Some(err)),
    }
}

pub async fn load_board(
    store: &dyn TaskStore,
    caller: &CallerIdentity,
    selection: &FilterSelection,
) -> (TaskBoard, Option<CoreError>) {
    let query = selection.to_query(caller);
    info!(
        "Loading tasks for {} (status: {:?}, assignee: {:?}, sort: {})",
        caller.id, query.status, query.assigned_to, query.sort
    );

    let result = store.list_tasks(&query).await.map_err(CoreError::from);
    match &result {
        Err(e) if e.is_fetch_failure() => error!("Failed to load tasks for {}: {}", caller.id, e),
        Err(e) => warn!("Task listing for {} rejected: {}", caller.id, e),
        Ok(_) => {}
    }
    board_or_empty(result, selection.sort)
}
