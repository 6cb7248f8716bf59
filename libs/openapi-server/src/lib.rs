//! Wire models for the landing zone engine HTTP API

pub mod models;
