//! HTTP surface over the orchestrator

pub mod handlers;
pub mod serve;
pub mod state;
