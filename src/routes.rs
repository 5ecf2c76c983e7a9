// src/routes.rs

pub mod common;
pub mod routes;

pub mod task_view {
    pub mod task_view_handlers;
    pub mod task_view_models;
}

pub mod user_admin {
    pub mod user_admin_handlers;
    pub mod user_admin_models;
}

pub mod mailbox {
    pub mod mailbox_handlers;
    pub mod mailbox_models;
}

#[cfg(test)]
mod tests;
