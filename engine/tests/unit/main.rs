//! Integration tests against the public engine API

mod support;
mod test_api;
mod test_orchestrator;
