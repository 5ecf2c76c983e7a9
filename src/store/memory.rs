use std::path::Path;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use super::{RequestStore, SessionStore, TaskStore, UserStore};
use crate::engine::query::TaskQuery;
use crate::error::{ConfigError, StoreError};
use crate::models::assignment_request::{AssignmentRequest, RequestFilter, RequestStatus, Resolution};
use crate::models::session::{CallerIdentity, Session};
use crate::models::task::{StatusSummary, Task, TaskListing};
use crate::models::user::{User, UserUpdate};

/// Contents of a memory store, also the shape of the `SEED_FILE` JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub users: Vec<User>,
    pub tasks: Vec<Task>,
    pub requests: Vec<AssignmentRequest>,
    pub sessions: Vec<Session>,
}

impl Seed {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let seed_error = |reason: String| ConfigError::Seed {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| seed_error(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| seed_error(e.to_string()))
    }
}

/// Store backed by process memory. Records keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<Seed>,
    #[cfg(test)]
    request_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn from_seed(seed: Seed) -> Self {
        Self {
            state: RwLock::new(seed),
            #[cfg(test)]
            request_calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls that reached the request store so far.
    #[cfg(test)]
    pub fn request_calls(&self) -> usize {
        self.request_calls.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    fn count_request_call(&self) {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
    }

    #[cfg(not(test))]
    fn count_request_call(&self) {}
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self, query: &TaskQuery) -> Result<TaskListing, StoreError> {
        let state = self.state.read().await;
        let mut status_summary = StatusSummary::default();
        let mut tasks = Vec::new();

        for task in state.tasks.iter().filter(|task| query.in_scope(task)) {
            status_summary.record(task.status);
            if query.matches(task) {
                tasks.push(task.clone());
            }
        }

        Ok(TaskListing { tasks, status_summary })
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.state.read().await.users.clone())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|user| user.id == user_id).cloned())
    }

    async fn update_user(&self, user_id: &str, update: &UserUpdate) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.iter_mut().find(|user| user.id == user_id) {
            update.apply_to(user);
        }
        Ok(())
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<AssignmentRequest>, StoreError> {
        self.count_request_call();
        let state = self.state.read().await;
        Ok(state
            .requests
            .iter()
            .filter(|req| filter.assigned_to.as_deref().map_or(true, |id| req.assigned_to_user_id == id))
            .filter(|req| filter.status.map_or(true, |status| req.status == status))
            .cloned()
            .collect())
    }

    async fn get_request(&self, request_id: &str) -> Result<Option<AssignmentRequest>, StoreError> {
        self.count_request_call();
        let state = self.state.read().await;
        Ok(state.requests.iter().find(|req| req.id == request_id).cloned())
    }

    async fn insert_request(&self, request: &AssignmentRequest) -> Result<(), StoreError> {
        self.count_request_call();
        self.state.write().await.requests.push(request.clone());
        Ok(())
    }

    async fn resolve_request(&self, request_id: &str, resolution: &Resolution) -> Result<bool, StoreError> {
        self.count_request_call();
        let mut state = self.state.write().await;
        match state
            .requests
            .iter_mut()
            .find(|req| req.id == request_id && req.status == RequestStatus::Pending)
        {
            Some(req) => {
                req.status = resolution.status();
                req.rejection_reason = resolution.reason().map(str::to_string);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn resolve_session(&self, session_id: &str) -> Result<Option<CallerIdentity>, StoreError> {
        let state = self.state.read().await;
        let session = match state.sessions.iter().find(|s| s.session_id == session_id) {
            Some(session) if !session.is_expired() => session,
            _ => return Ok(None),
        };
        Ok(state
            .users
            .iter()
            .find(|user| user.id == session.user_id)
            .map(|user| CallerIdentity::new(user.id.clone(), user.role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::query::SortOption;
    use crate::models::task::{Priority, TaskStatus};
    use crate::models::user::Role;
    use chrono::{TimeZone, Utc};
    use time::{Duration, OffsetDateTime};

    fn task(id: &str, title: &str, status: TaskStatus, assignee: &str) -> Task {
        let ts = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        Task {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            status,
            priority: Priority::High,
            progress: 10,
            created_at: ts,
            due_date: ts,
            assigned_to: vec![assignee.into()],
            assigned_by: None,
            todo_checklist: Vec::new(),
            attachments: Vec::new(),
        }
    }

    fn seeded() -> MemoryStore {
        MemoryStore::from_seed(Seed {
            tasks: vec![
                task("1", "Write report", TaskStatus::Pending, "u1"),
                task("2", "Review report", TaskStatus::Completed, "u1"),
                task("3", "Plan sprint", TaskStatus::Pending, "u2"),
            ],
            ..Seed::default()
        })
    }

    #[tokio::test]
    async fn summary_ignores_status_but_honours_scope() {
        let store = seeded();
        let query = TaskQuery {
            status: Some(TaskStatus::Pending),
            visible_to: Some("u1".into()),
            sort: SortOption::default(),
            ..TaskQuery::default()
        };
        let listing = store.list_tasks(&query).await.unwrap();
        assert_eq!(listing.tasks.len(), 1);
        assert_eq!(listing.status_summary.all, 2);
        assert_eq!(listing.status_summary.completed_tasks, 1);
    }

    #[tokio::test]
    async fn search_is_a_substring_match() {
        let store = seeded();
        let query = TaskQuery { search: Some("report".into()), ..TaskQuery::default() };
        let listing = store.list_tasks(&query).await.unwrap();
        let ids: Vec<&str> = listing.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[tokio::test]
    async fn expired_sessions_do_not_resolve() {
        let store = MemoryStore::from_seed(Seed {
            users: vec![User {
                id: "u1".into(),
                name: "Una".into(),
                email: "una@example.com".into(),
                role: Role::Admin,
                profile_image_url: None,
                position: None,
            }],
            sessions: vec![
                Session {
                    session_id: "live".into(),
                    user_id: "u1".into(),
                    expires_at: OffsetDateTime::now_utc() + Duration::minutes(30),
                },
                Session {
                    session_id: "stale".into(),
                    user_id: "u1".into(),
                    expires_at: OffsetDateTime::now_utc() - Duration::minutes(1),
                },
            ],
            ..Seed::default()
        });

        let caller = store.resolve_session("live").await.unwrap().unwrap();
        assert!(caller.is_admin());
        assert_eq!(store.resolve_session("stale").await.unwrap(), None);
        assert_eq!(store.resolve_session("missing").await.unwrap(), None);
    }
}
