// src/engine/mod.rs

pub mod grouping;
pub mod query;
pub mod workflow;
