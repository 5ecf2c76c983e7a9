use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::mysql::{MySqlPoolOptions, MySqlRow};
use sqlx::{MySql, MySqlPool, QueryBuilder, Row};
use time::OffsetDateTime;

use super::{RequestStore, SessionStore, TaskStore, UserStore};
use crate::engine::query::{SortKey, SortDir, TaskQuery};
use crate::error::StoreError;
use crate::models::assignment_request::{AssignmentRequest, RequestFilter, Resolution};
use crate::models::session::CallerIdentity;
use crate::models::task::{StatusSummary, Task, TaskListing, TaskStatus};
use crate::models::user::{Role, User, UserUpdate};

const TASK_COLUMNS: &str = "t.task_id, t.title, t.description, t.status, t.priority, t.progress, \
     t.created_at, t.due_date, t.assigned_by, t.todo_checklist, t.attachments";

const REQUEST_COLUMNS: &str = "request_id, task_id, assigned_to_user_id, assigned_by_admin_id, \
     status, rejection_reason, created_at";

/// Store over the MySQL schema in `sql/schema.sql`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    async fn load_assignees(&self, tasks: &mut [Task]) -> Result<(), StoreError> {
        if tasks.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<MySql>::new("SELECT task_id, user_id FROM TaskAssignees_ WHERE task_id IN (");
        let mut ids = builder.separated(", ");
        for task in tasks.iter() {
            ids.push_bind(task.id.clone());
        }
        builder.push(") ORDER BY task_id, assignee_order");

        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut assignees: HashMap<String, Vec<String>> = HashMap::new();
        for row in rows {
            let task_id: String = row.try_get("task_id")?;
            let user_id: String = row.try_get("user_id")?;
            assignees.entry(task_id).or_default().push(user_id);
        }

        for task in tasks.iter_mut() {
            task.assigned_to = assignees.remove(&task.id).unwrap_or_default();
        }
        Ok(())
    }
}

// Assignee, visibility and search conditions. The status filter is left to the caller.
fn push_scope(builder: &mut QueryBuilder<'_, MySql>, query: &TaskQuery) {
    for user_id in [&query.visible_to, &query.assigned_to].into_iter().flatten() {
        builder.push(" AND EXISTS (SELECT 1 FROM TaskAssignees_ a WHERE a.task_id = t.task_id AND a.user_id = ");
        builder.push_bind(user_id.clone());
        builder.push(")");
    }
    if let Some(term) = &query.search {
        let pattern = format!("%{}%", escape_like(term));
        builder.push(" AND (t.title LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR t.description LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn parse_column<T>(row: &MySqlRow, column: &str) -> Result<T, StoreError>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(StoreError::Malformed)
}

fn task_from_row(row: &MySqlRow) -> Result<Task, StoreError> {
    let checklist: Option<String> = row.try_get("todo_checklist")?;
    let attachments: Option<String> = row.try_get("attachments")?;

    Ok(Task {
        id: row.try_get("task_id")?,
        title: row.try_get("title")?,
        description: row.try_get::<Option<String>, _>("description")?.unwrap_or_default(),
        status: parse_column(row, "status")?,
        priority: parse_column(row, "priority")?,
        progress: row.try_get("progress")?,
        created_at: row.try_get("created_at")?,
        due_date: row.try_get("due_date")?,
        assigned_to: Vec::new(),
        assigned_by: row.try_get("assigned_by")?,
        todo_checklist: match checklist {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        },
        attachments: match attachments {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        },
    })
}

#[async_trait]
impl TaskStore for MySqlStore {
    async fn list_tasks(&self, query: &TaskQuery) -> Result<TaskListing, StoreError> {
        let mut builder = QueryBuilder::<MySql>::new(format!("SELECT {} FROM Tasks_ t WHERE 1 = 1", TASK_COLUMNS));
        push_scope(&mut builder, query);
        if let Some(status) = query.status {
            builder.push(" AND t.status = ");
            builder.push_bind(status.label());
        }
        let column = match query.sort.key {
            SortKey::CreatedAt => "t.created_at",
            SortKey::DueDate => "t.due_date",
        };
        let direction = match query.sort.dir {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        };
        builder.push(format!(" ORDER BY {} {}", column, direction));

        let rows = builder.build().fetch_all(&self.pool).await?;
        let mut tasks = rows.iter().map(task_from_row).collect::<Result<Vec<_>, _>>()?;
        self.load_assignees(&mut tasks).await?;

        let mut summary_builder =
            QueryBuilder::<MySql>::new("SELECT t.status, COUNT(*) AS count FROM Tasks_ t WHERE 1 = 1");
        push_scope(&mut summary_builder, query);
        summary_builder.push(" GROUP BY t.status");

        let mut status_summary = StatusSummary::default();
        for row in summary_builder.build().fetch_all(&self.pool).await? {
            let status: TaskStatus = parse_column(&row, "status")?;
            let count: i64 = row.try_get("count")?;
            let count = count.max(0) as u64;
            status_summary.all += count;
            match status {
                TaskStatus::Pending => status_summary.pending_tasks = count,
                TaskStatus::InProgress => status_summary.in_progress_tasks = count,
                TaskStatus::Completed => status_summary.completed_tasks = count,
            }
        }

        Ok(TaskListing { tasks, status_summary })
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT user_id, user_name, user_email, role, profile_image_url, position
             FROM Users_ ORDER BY user_name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT user_id, user_name, user_email, role, profile_image_url, position
             FROM Users_ WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_user(&self, user_id: &str, update: &UserUpdate) -> Result<(), StoreError> {
        if update.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<MySql>::new("UPDATE Users_ SET ");
        let mut fields = builder.separated(", ");
        if let Some(position) = &update.position {
            fields.push("position = ");
            fields.push_bind_unseparated(position.clone());
        }
        if let Some(url) = &update.profile_image_url {
            fields.push("profile_image_url = ");
            fields.push_bind_unseparated(url.clone());
        }
        if let Some(role) = update.role {
            fields.push("role = ");
            fields.push_bind_unseparated(role.as_str());
        }
        builder.push(" WHERE user_id = ");
        builder.push_bind(user_id.to_string());

        builder.build().execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RequestStore for MySqlStore {
    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<AssignmentRequest>, StoreError> {
        let mut builder = QueryBuilder::<MySql>::new(format!(
            "SELECT {} FROM AssignmentRequests_ WHERE 1 = 1",
            REQUEST_COLUMNS
        ));
        if let Some(user_id) = &filter.assigned_to {
            builder.push(" AND assigned_to_user_id = ");
            builder.push_bind(user_id.clone());
        }
        if let Some(status) = filter.status {
            builder.push(" AND status = ");
            builder.push_bind(status.as_str());
        }
        builder.push(" ORDER BY created_at DESC");

        let requests = builder.build_query_as::<AssignmentRequest>().fetch_all(&self.pool).await?;
        Ok(requests)
    }

    async fn get_request(&self, request_id: &str) -> Result<Option<AssignmentRequest>, StoreError> {
        let request = sqlx::query_as::<_, AssignmentRequest>(&format!(
            "SELECT {} FROM AssignmentRequests_ WHERE request_id = ?",
            REQUEST_COLUMNS
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn insert_request(&self, request: &AssignmentRequest) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO AssignmentRequests_
             (request_id, task_id, assigned_to_user_id, assigned_by_admin_id, status, rejection_reason, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.id)
        .bind(&request.task_id)
        .bind(&request.assigned_to_user_id)
        .bind(&request.assigned_by_admin_id)
        .bind(request.status.as_str())
        .bind(&request.rejection_reason)
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn resolve_request(&self, request_id: &str, resolution: &Resolution) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE AssignmentRequests_ SET status = ?, rejection_reason = ?
             WHERE request_id = ? AND status = 'Pending'",
        )
        .bind(resolution.status().as_str())
        .bind(resolution.reason())
        .bind(request_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl SessionStore for MySqlStore {
    async fn resolve_session(&self, session_id: &str) -> Result<Option<CallerIdentity>, StoreError> {
        let row = sqlx::query(
            "SELECT s.user_id, s.expires_at, u.role FROM Sessions_ s
             JOIN Users_ u ON s.user_id = u.user_id
             WHERE s.session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let expires_at: OffsetDateTime = row.try_get("expires_at")?;
        if expires_at < OffsetDateTime::now_utc() {
            return Ok(None);
        }

        let role: Role = parse_column(&row, "role")?;
        let user_id: String = row.try_get("user_id")?;
        Ok(Some(CallerIdentity::new(user_id, role)))
    }
}
