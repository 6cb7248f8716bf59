//! Deployment module

pub mod fsm;
pub mod orchestrator;
pub mod runner;
pub mod terraform;

pub use orchestrator::Orchestrator;
pub use runner::{ProcessRunner, ToolOutput, ToolRunner};
