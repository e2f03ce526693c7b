//! Storage layer for projdash.
//!
//! The database lives entirely in memory as a single SQLite connection and
//! is made durable by writing a serialized image of it to a
//! [`SnapshotStore`]:
//!
//! - One engine per [`Database`] handle, created lazily on first `ready()`
//! - Synchronous query primitives gated on readiness
//! - Explicit, all-or-nothing persistence
//!
//! # Submodules
//!
//! - [`database`] - Handle, readiness gate and query primitives
//! - `engine` - The in-memory SQLite engine and its snapshot image
//! - [`projects`] - Project operations built on the primitives
//! - [`row`] - Detached result rows
//! - [`schema`] - Database schema definitions
//! - [`snapshot`] - Durable snapshot stores

pub mod database;
mod engine;
pub mod projects;
pub mod row;
pub mod schema;
pub mod snapshot;

pub use database::{Database, SNAPSHOT_KEY, global_database};
pub use row::{Row, RunResult};
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore, atomic_write};
