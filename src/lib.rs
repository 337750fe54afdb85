//! Task circulation service library.
//!
//! Exports the storage engine, lifecycle operations, statistics, maintenance
//! jobs, and scheduler for the `task-relay` binary and integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod maintenance;
pub mod notify;
pub mod scheduler;
pub mod types;
