use serde::{Deserialize, Serialize};

use crate::engine::grouping::UserWithTasks;
use crate::engine::query::{parse_status_filter, FilterSelection, SortOption, Tab, TaskBoard, TaskCard};
use crate::error::CoreError;

// query string of GET /api-tasks
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListParams {
    pub status: Option<String>,
    pub assigned_to: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub sort: Option<String>,
    pub search: Option<String>,
}

impl TaskListParams {
    pub fn selection(&self) -> Result<FilterSelection, CoreError> {
        let sort = match &self.sort {
            Some(combined) => combined.parse::<SortOption>()?,
            None => SortOption::from_parts(self.sort_by.as_deref(), self.sort_order.as_deref())?,
        };

        let mut selection = FilterSelection::default();
        if let Some(status) = parse_status_filter(self.status.as_deref())? {
            selection.toggle_status(status);
        }
        if let Some(user_id) = self.assigned_to.as_deref().filter(|id| !id.trim().is_empty()) {
            selection.toggle_user(user_id);
        }
        selection.set_sort(sort);
        selection.set_search(self.search.as_deref());
        Ok(selection)
    }
}

#[derive(Serialize)]
pub struct TaskListResponse {
    pub success: bool,
    pub message: String,
    pub tabs: Vec<Tab>,
    pub tasks: Vec<TaskCard>,
}

impl TaskListResponse {
    pub fn from_board(board: TaskBoard, success: bool, message: String) -> Self {
        Self {
            success,
            message,
            tabs: board.tabs,
            tasks: board.tasks,
        }
    }
}

#[derive(Serialize)]
pub struct GroupedUsersResponse {
    pub users: Vec<UserWithTasks>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::query::{SortDir, SortKey};
    use crate::models::task::TaskStatus;

    #[test]
    fn query_string_builds_the_selection() {
        let params = TaskListParams {
            status: Some("In Progress".into()),
            assigned_to: Some("u2".into()),
            sort: Some("dueDate_asc".into()),
            search: Some("  ".into()),
            ..TaskListParams::default()
        };
        let selection = params.selection().unwrap();
        assert_eq!(selection.status, Some(TaskStatus::InProgress));
        assert_eq!(selection.user_id.as_deref(), Some("u2"));
        assert_eq!(selection.sort, SortOption::new(SortKey::DueDate, SortDir::Asc));
        assert_eq!(selection.search_term, None);
    }

    #[test]
    fn empty_query_string_is_the_default_selection() {
        let params = TaskListParams { status: Some("All".into()), assigned_to: Some("".into()), ..TaskListParams::default() };
        assert_eq!(params.selection().unwrap(), FilterSelection::default());
    }
}
