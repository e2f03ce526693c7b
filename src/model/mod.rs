//! Data models for projdash.
//!
//! - Project (stored row, draft for inserts, partial changes for updates)
//! - Dashboard statistics

pub mod project;
pub mod stats;

pub use project::{Project, ProjectChanges, ProjectDraft, ProjectStatus};
pub use stats::DashboardStats;
