//! Status command implementation.
//!
//! Shows the dashboard numbers: total projects, active projects and
//! overdue projects as of today.

use crate::cli::commands::{open_database, runtime};
use crate::error::Result;
use crate::model::DashboardStats;
use crate::validate::today;
use chrono::NaiveDate;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

/// Output for status command.
#[derive(Serialize)]
struct StatusOutput {
    #[serde(flatten)]
    stats: DashboardStats,
    as_of: NaiveDate,
}

/// Execute status command.
///
/// # Errors
///
/// Returns an error if the data directory is not initialized or a query fails.
pub fn execute(data_dir: Option<&Path>, json: bool) -> Result<()> {
    let rt = runtime()?;
    let db = open_database(&rt, data_dir)?;

    let as_of = today();
    let stats = db.dashboard_stats(as_of)?;

    if json {
        let output = StatusOutput { stats, as_of };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_dashboard(&stats, as_of);
    }

    Ok(())
}

fn print_dashboard(stats: &DashboardStats, as_of: NaiveDate) {
    println!("{}", "projdash Status".cyan().bold());
    println!("{}", "===============".cyan());
    println!();
    println!("Projects: {}", stats.projects_count.to_string().bold());
    println!("  Active:  {}", stats.active_count.to_string().green());

    let overdue = stats.overdue_count.to_string();
    if stats.overdue_count > 0 {
        println!("  Overdue: {}", overdue.red().bold());
    } else {
        println!("  Overdue: {overdue}");
    }
    println!();
    println!("{}", format!("As of {as_of}").dimmed());

    if stats.projects_count == 0 {
        println!();
        println!("Create one with: pd project create \"My Project\"");
    }
}
