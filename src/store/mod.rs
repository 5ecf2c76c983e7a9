// src/store/mod.rs

pub mod memory;
pub mod mysql;

use async_trait::async_trait;

use crate::engine::query::TaskQuery;
use crate::error::StoreError;
use crate::models::assignment_request::{AssignmentRequest, RequestFilter, Resolution};
use crate::models::session::CallerIdentity;
use crate::models::task::TaskListing;
use crate::models::user::{User, UserUpdate};

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Matching tasks plus a summary over the query scope, status filter excluded.
    async fn list_tasks(&self, query: &TaskQuery) -> Result<TaskListing, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Writes only the fields present in `update`.
    async fn update_user(&self, user_id: &str, update: &UserUpdate) -> Result<(), StoreError>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<AssignmentRequest>, StoreError>;

    async fn get_request(&self, request_id: &str) -> Result<Option<AssignmentRequest>, StoreError>;

    async fn insert_request(&self, request: &AssignmentRequest) -> Result<(), StoreError>;

    /// Moves a Pending request to its terminal state. Returns false when the
    /// request was no longer Pending, in which case nothing is written.
    async fn resolve_request(&self, request_id: &str, resolution: &Resolution) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// `None` for unknown or expired sessions.
    async fn resolve_session(&self, session_id: &str) -> Result<Option<CallerIdentity>, StoreError>;
}
