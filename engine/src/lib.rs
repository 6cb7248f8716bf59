//! Landing zone engine library
//!
//! Turns a landing zone request into a Terraform document, drives the
//! Terraform lifecycle against it and reports progress and topology.

pub mod app;
pub mod deploy;
pub mod diagnostic;
pub mod errors;
pub mod filesys;
pub mod generator;
pub mod logs;
pub mod models;
pub mod server;
pub mod storage;
pub mod topology;
pub mod utils;
