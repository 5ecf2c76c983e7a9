use std::sync::Arc;

use crate::engine::workflow::AssignmentWorkflow;
use crate::store::{RequestStore, SessionStore, TaskStore, UserStore};

/// Shared handler state: one handle per store concern.
#[derive(Clone)]
pub struct AppState {
    pub tasks: Arc<dyn TaskStore>,
    pub users: Arc<dyn UserStore>,
    pub requests: Arc<dyn RequestStore>,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: TaskStore + UserStore + RequestStore + SessionStore + 'static,
    {
        Self {
            tasks: store.clone(),
            users: store.clone(),
            requests: store.clone(),
            sessions: store,
        }
    }

    pub fn workflow(&self) -> AssignmentWorkflow<'_> {
        AssignmentWorkflow::new(self.requests.as_ref(), self.tasks.as_ref(), self.users.as_ref())
    }
}
