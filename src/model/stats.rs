//! Dashboard statistics.

use serde::{Deserialize, Serialize};

/// Headline numbers shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// All projects.
    pub projects_count: i64,
    /// Projects with status `active`.
    pub active_count: i64,
    /// Projects past their end date that are not completed.
    pub overdue_count: i64,
}
