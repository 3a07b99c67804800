//! quadrant-tasks library
//!
//! Eisenhower-matrix tasks with quadrant-scoped ordering. This module exports
//! the core components for the binary, for testing and for integration.

pub mod cli;
pub mod config;
pub mod db;
pub mod drag;
pub mod error;
pub mod format;
pub mod logging;
pub mod ordering;
pub mod quadrant;
pub mod server;
pub mod service;
pub mod store;
pub mod types;

pub use error::{ErrorCode, OrderError, OrderResult};
pub use quadrant::{Quadrant, classify, flags_for};
pub use service::TaskService;
pub use store::{MemoryStore, StoreError, TaskStore};
pub use types::{NewTask, Task, TaskPatch, TaskQuery};
