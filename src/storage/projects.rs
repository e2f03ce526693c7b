//! Project operations.
//!
//! Everything here is built on the public `get` / `all` / `run` primitives
//! of [`Database`]; none of it touches the engine directly. None of these
//! functions persist - callers batch their writes and call
//! [`Database::persist`] once.

use crate::error::{Error, Result};
use crate::model::{DashboardStats, Project, ProjectChanges, ProjectDraft, ProjectStatus};
use crate::storage::database::Database;
use crate::storage::snapshot::SnapshotStore;
use chrono::NaiveDate;
use rusqlite::params;
use serde::Deserialize;
use tracing::debug;

const SELECT_PROJECT: &str =
    "SELECT id, name, owner, budget, start_date, end_date, status FROM projects";

#[derive(Deserialize)]
struct Count {
    c: i64,
}

fn date_param(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

impl<S: SnapshotStore> Database<S> {
    /// Insert a project and return the stored row.
    ///
    /// # Errors
    ///
    /// Returns an error if the draft is invalid or the insert fails.
    pub fn create_project(&self, draft: &ProjectDraft) -> Result<Project> {
        draft.validate()?;

        let result = self.run(
            "INSERT INTO projects (name, owner, budget, start_date, end_date, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                draft.name.trim(),
                draft.owner,
                draft.budget,
                date_param(draft.start_date),
                date_param(draft.end_date),
                draft.status.as_str(),
            ],
        )?;
        debug!(id = result.last_insert_id, "Created project");

        self.get_project(result.last_insert_id)?
            .ok_or(Error::ProjectNotFound {
                id: result.last_insert_id,
            })
    }

    /// Get a project by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        self.get_as(&format!("{SELECT_PROJECT} WHERE id = ?1"), [id])
    }

    /// List projects, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn list_projects(&self, status: Option<ProjectStatus>, limit: usize) -> Result<Vec<Project>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        match status {
            Some(status) => self.all_as(
                &format!("{SELECT_PROJECT} WHERE status = ?1 ORDER BY id DESC LIMIT ?2"),
                params![status.as_str(), limit],
            ),
            None => self.all_as(
                &format!("{SELECT_PROJECT} ORDER BY id DESC LIMIT ?1"),
                [limit],
            ),
        }
    }

    /// Every project in creation order, for export.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn all_projects(&self) -> Result<Vec<Project>> {
        self.all_as(&format!("{SELECT_PROJECT} ORDER BY id"), [])
    }

    /// Apply `changes` to a project and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] if no project has this ID, or an
    /// error if the result is invalid or the update fails.
    pub fn update_project(&self, id: i64, changes: &ProjectChanges) -> Result<Project> {
        let current = self
            .get_project(id)?
            .ok_or(Error::ProjectNotFound { id })?;
        let updated = changes.apply(&current)?;

        self.run(
            "UPDATE projects
             SET name = ?1, owner = ?2, budget = ?3, start_date = ?4, end_date = ?5, status = ?6
             WHERE id = ?7",
            params![
                updated.name.trim(),
                updated.owner,
                updated.budget,
                date_param(updated.start_date),
                date_param(updated.end_date),
                updated.status.as_str(),
                id,
            ],
        )?;

        self.get_project(id)?.ok_or(Error::ProjectNotFound { id })
    }

    /// Delete a project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] if no project has this ID.
    pub fn delete_project(&self, id: i64) -> Result<()> {
        let result = self.run("DELETE FROM projects WHERE id = ?1", [id])?;
        if result.changes == 0 {
            return Err(Error::ProjectNotFound { id });
        }
        Ok(())
    }

    /// Count of projects past their end date that are not completed.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn overdue_count(&self, today: NaiveDate) -> Result<i64> {
        let count: Option<Count> = self.get_as(
            "SELECT COUNT(*) AS c FROM projects
             WHERE end_date IS NOT NULL AND end_date < ?1 AND status != ?2",
            params![date_param(Some(today)), ProjectStatus::Completed.as_str()],
        )?;
        Ok(count.map_or(0, |c| c.c))
    }

    /// Headline dashboard numbers as of `today`.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn dashboard_stats(&self, today: NaiveDate) -> Result<DashboardStats> {
        let projects_count = self
            .get_as::<Count, _>("SELECT COUNT(*) AS c FROM projects", [])?
            .map_or(0, |c| c.c);
        let active_count = self
            .get_as::<Count, _>(
                "SELECT COUNT(*) AS c FROM projects WHERE status = ?1",
                [ProjectStatus::Active.as_str()],
            )?
            .map_or(0, |c| c.c);

        Ok(DashboardStats {
            projects_count,
            active_count,
            overdue_count: self.overdue_count(today)?,
        })
    }
}
