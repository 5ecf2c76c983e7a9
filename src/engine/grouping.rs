use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::task::{Task, TaskStatus};
use crate::models::user::{Role, User};

/// Task ids of one user, split by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusBuckets {
    #[serde(rename = "Pending")]
    pub pending: Vec<String>,
    #[serde(rename = "In Progress")]
    pub in_progress: Vec<String>,
    #[serde(rename = "Completed")]
    pub completed: Vec<String>,
}

impl StatusBuckets {
    pub fn bucket(&self, status: TaskStatus) -> &[String] {
        match status {
            TaskStatus::Pending => &self.pending,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Completed => &self.completed,
        }
    }

    fn bucket_mut(&mut self, status: TaskStatus) -> &mut Vec<String> {
        match status {
            TaskStatus::Pending => &mut self.pending,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Completed => &mut self.completed,
        }
    }

    pub fn total(&self) -> usize {
        self.pending.len() + self.in_progress.len() + self.completed.len()
    }
}

pub type GroupedUserTasks = BTreeMap<String, StatusBuckets>;

/// Every roster user gets an entry. A task lands once in the bucket of each
/// distinct assignee, roster member or not.
pub fn group_tasks_by_user(tasks: &[Task], users: &[User]) -> GroupedUserTasks {
    let mut grouped: GroupedUserTasks = users
        .iter()
        .map(|user| (user.id.clone(), StatusBuckets::default()))
        .collect();

    for task in tasks {
        let mut seen: Vec<&str> = Vec::with_capacity(task.assigned_to.len());
        for assignee in &task.assigned_to {
            if seen.contains(&assignee.as_str()) {
                continue;
            }
            seen.push(assignee);
            grouped
                .entry(assignee.clone())
                .or_default()
                .bucket_mut(task.status)
                .push(task.id.clone());
        }
    }

    grouped
}

/// Sidebar row of the admin task filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithTasks {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub profile_image_url: Option<String>,
    pub tasks: StatusBuckets,
}

pub fn users_with_tasks(users: &[User], grouped: &GroupedUserTasks) -> Vec<UserWithTasks> {
    users
        .iter()
        .map(|user| UserWithTasks {
            id: user.id.clone(),
            name: user.name.clone(),
            profile_image_url: user.profile_image_url.clone(),
            tasks: grouped.get(&user.id).cloned().unwrap_or_default(),
        })
        .collect()
}

/// A roster entry with its workload counts folded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWorkload {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub profile_image_url: Option<String>,
    pub position: Option<String>,
    pub pending_task: usize,
    pub in_progress_task: usize,
    pub completed_task: usize,
}

pub fn merge_task_counts(users: Vec<User>, grouped: &GroupedUserTasks) -> Vec<UserWorkload> {
    users
        .into_iter()
        .map(|user| {
            let (pending, in_progress, completed) = grouped
                .get(&user.id)
                .map(|b| (b.pending.len(), b.in_progress.len(), b.completed.len()))
                .unwrap_or((0, 0, 0));
            UserWorkload {
                id: user.id,
                name: user.name,
                email: user.email,
                role: user.role,
                profile_image_url: user.profile_image_url,
                position: user.position,
                pending_task: pending,
                in_progress_task: in_progress,
                completed_task: completed,
            }
        })
        .collect()
}
