//! Quarry Integration Tests
//!
//! End-to-end tests through the public executor API:
//! - scenarios: the reference dataset, search and reorder walkthroughs
//! - sessions: order, selection and pinned-order behavior per session
//! - concurrency: shared sessions, parallel readers, rebuild under load
//! - commands: JSON command dispatch and error mapping

mod common;

mod commands;
mod concurrency;
mod scenarios;
mod sessions;
