// src/models/mod.rs

pub mod user;
pub mod session;
pub mod task;
pub mod assignment_request;
