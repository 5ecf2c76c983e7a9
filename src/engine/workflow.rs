use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::query::TaskQuery;
use crate::error::CoreError;
use crate::models::assignment_request::{AssignmentRequest, RequestFilter, RequestStatus, Resolution};
use crate::models::session::CallerIdentity;
use crate::models::task::Task;
use crate::models::user::User;
use crate::store::{RequestStore, TaskStore, UserStore};

pub const UNKNOWN_TASK: &str = "Unknown Task";
pub const UNKNOWN_USER: &str = "Unknown User";
pub const UNKNOWN_ADMIN: &str = "Unknown Admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestScope {
    /// The caller's inbox: Pending requests addressed to them.
    Own,
    /// Every request, any status. Admins only.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseAction {
    Approve,
    Reject,
}

impl FromStr for ResponseAction {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "approve" => Ok(ResponseAction::Approve),
            "reject" => Ok(ResponseAction::Reject),
            other => Err(CoreError::validation(format!("unknown action: {}", other))),
        }
    }
}

/// Checks the caller's input before anything touches the store.
pub fn resolution_for(action: ResponseAction, reason: Option<&str>) -> Result<Resolution, CoreError> {
    match action {
        ResponseAction::Approve => Ok(Resolution::Approved),
        ResponseAction::Reject => match reason {
            Some(reason) if !reason.trim().is_empty() => Ok(Resolution::Rejected { reason: reason.to_string() }),
            _ => Err(CoreError::validation("Please provide a reason for rejection")),
        },
    }
}

/// A request joined with its task and the people involved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    #[serde(rename = "_id")]
    pub id: String,
    pub task_id: String,
    pub task_title: String,
    pub task: Option<Task>,
    pub assigned_to_user_id: String,
    pub assigned_to_name: String,
    pub assigned_by_admin_id: String,
    pub assigned_by_name: String,
    pub status: RequestStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn to_view(request: AssignmentRequest, tasks: &HashMap<String, Task>, names: &HashMap<String, String>) -> RequestView {
    let task = tasks.get(&request.task_id).cloned();
    RequestView {
        task_title: task.as_ref().map_or_else(|| UNKNOWN_TASK.to_string(), |t| t.title.clone()),
        task,
        assigned_to_name: names
            .get(&request.assigned_to_user_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_USER.to_string()),
        assigned_by_name: names
            .get(&request.assigned_by_admin_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_ADMIN.to_string()),
        id: request.id,
        task_id: request.task_id,
        assigned_to_user_id: request.assigned_to_user_id,
        assigned_by_admin_id: request.assigned_by_admin_id,
        status: request.status,
        rejection_reason: request.rejection_reason,
        created_at: request.created_at,
    }
}

/// Assignment request lifecycle: Pending, then exactly one of Approved or Rejected.
pub struct AssignmentWorkflow<'a> {
    requests: &'a dyn RequestStore,
    tasks: &'a dyn TaskStore,
    users: &'a dyn UserStore,
}

impl<'a> AssignmentWorkflow<'a> {
    pub fn new(requests: &'a dyn RequestStore, tasks: &'a dyn TaskStore, users: &'a dyn UserStore) -> Self {
        Self { requests, tasks, users }
    }

    pub async fn list_requests(&self, caller: &CallerIdentity, scope: RequestScope) -> Result<Vec<RequestView>, CoreError> {
        let filter = match scope {
            RequestScope::Own => RequestFilter {
                assigned_to: Some(caller.id.clone()),
                status: Some(RequestStatus::Pending),
            },
            RequestScope::All if caller.is_admin() => RequestFilter::default(),
            RequestScope::All => return Err(CoreError::Forbidden("view all assignment requests".into())),
        };

        let requests = self.requests.list_requests(&filter).await?;
        let tasks: HashMap<String, Task> = self
            .tasks
            .list_tasks(&TaskQuery::everything())
            .await?
            .tasks
            .into_iter()
            .map(|task| (task.id.clone(), task))
            .collect();
        let names: HashMap<String, String> = self
            .users
            .list_users()
            .await?
            .into_iter()
            .map(|user: User| (user.id, user.name))
            .collect();

        info!("Listing {} assignment requests for {} ({:?})", requests.len(), caller.id, scope);
        Ok(requests.into_iter().map(|req| to_view(req, &tasks, &names)).collect())
    }

    /// Applies approve/reject. Returns nothing: callers re-list to see the result.
    pub async fn respond(
        &self,
        caller: &CallerIdentity,
        request_id: &str,
        action: ResponseAction,
        reason: Option<&str>,
    ) -> Result<(), CoreError> {
        let resolution = resolution_for(action, reason)?;

        let request = self
            .requests
            .get_request(request_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("assignment request {}", request_id)))?;

        if request.assigned_to_user_id != caller.id && !caller.is_admin() {
            return Err(CoreError::Forbidden(format!("respond to assignment request {}", request_id)));
        }

        if request.status.is_terminal() {
            warn!("Request {} is already {}, ignoring {:?} from {}", request_id, request.status, action, caller.id);
            return Err(CoreError::InvalidStateTransition {
                request_id: request_id.to_string(),
                status: request.status,
            });
        }

        if !self.requests.resolve_request(request_id, &resolution).await? {
            // Lost a race with another response; report what the store holds now.
            let status = self
                .requests
                .get_request(request_id)
                .await?
                .map_or(RequestStatus::Pending, |req| req.status);
            warn!("Request {} was resolved concurrently (now {})", request_id, status);
            return Err(CoreError::InvalidStateTransition {
                request_id: request_id.to_string(),
                status,
            });
        }

        info!("Request {} {} by {}", request_id, resolution.status(), caller.id);
        Ok(())
    }

    /// Opens a new Pending request for `assignee` on `task_id`. Admins only.
    pub async fn create_request(
        &self,
        caller: &CallerIdentity,
        task_id: &str,
        assignee: &str,
    ) -> Result<AssignmentRequest, CoreError> {
        if !caller.is_admin() {
            return Err(CoreError::Forbidden("create assignment requests".into()));
        }
        if task_id.trim().is_empty() || assignee.trim().is_empty() {
            return Err(CoreError::validation("taskId and assignedToUserId are required"));
        }

        let listing = self.tasks.list_tasks(&TaskQuery::everything()).await?;
        if !listing.tasks.iter().any(|task| task.id == task_id) {
            return Err(CoreError::NotFound(format!("task {}", task_id)));
        }
        if self.users.get_user(assignee).await?.is_none() {
            return Err(CoreError::NotFound(format!("user {}", assignee)));
        }

        let request = AssignmentRequest {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            assigned_to_user_id: assignee.to_string(),
            assigned_by_admin_id: caller.id.clone(),
            status: RequestStatus::Pending,
            rejection_reason: None,
            created_at: Utc::now(),
        };
        self.requests.insert_request(&request).await?;

        info!("Request {} created by {} for task {} -> {}", request.id, caller.id, task_id, assignee);
        Ok(request)
    }
}

/// The single rejection reason being edited. Opening a draft for another
/// request discards the previous one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionDraft {
    current: Option<(String, String)>,
}

impl RejectionDraft {
    pub fn open(&mut self, request_id: &str) {
        match &self.current {
            Some((open_id, _)) if open_id == request_id => {}
            _ => self.current = Some((request_id.to_string(), String::new())),
        }
    }

    pub fn set_reason(&mut self, reason: &str) {
        if let Some((_, draft)) = &mut self.current {
            *draft = reason.to_string();
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        self.current.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn reason(&self) -> Option<&str> {
        self.current.as_ref().map(|(_, reason)| reason.as_str())
    }

    pub fn cancel(&mut self) {
        self.current = None;
    }

    /// Validates the draft and hands back `(request_id, resolution)`; the draft
    /// stays open when the reason is blank.
    pub fn submit(&mut self) -> Result<(String, Resolution), CoreError> {
        let (request_id, reason) = self
            .current
            .as_ref()
            .ok_or_else(|| CoreError::validation("no rejection in progress"))?;
        let resolution = resolution_for(ResponseAction::Reject, Some(reason.as_str()))?;
        let request_id = request_id.clone();
        self.current = None;
        Ok((request_id, resolution))
    }
}
