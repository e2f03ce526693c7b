//! Project model for projdash.
//!
//! A project is one tracked piece of work with an optional owner, budget and
//! date range, in one of three statuses.

use crate::error::{Error, Result};
use crate::validate::normalize_status;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Project status values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Active,
    Paused,
    Completed,
}

impl ProjectStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 3] = [Self::Active, Self::Paused, Self::Completed];

    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = Error;

    /// Parse a status, accepting synonyms such as `done` or `wip`.
    fn from_str(s: &str) -> Result<Self> {
        match normalize_status(s) {
            Ok("active") => Ok(Self::Active),
            Ok("paused") => Ok(Self::Paused),
            Ok("completed") => Ok(Self::Completed),
            Ok(other) => Err(Error::InvalidStatus {
                value: other.to_string(),
                suggestion: None,
            }),
            Err((value, suggestion)) => Err(Error::InvalidStatus { value, suggestion }),
        }
    }
}

/// A stored project row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Auto-assigned identifier
    pub id: i64,

    /// Display name
    pub name: String,

    /// Person responsible
    pub owner: Option<String>,

    /// Budget in the user's currency
    pub budget: Option<f64>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,

    pub status: ProjectStatus,
}

impl Project {
    /// Whether the project has run past its end date without completing.
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != ProjectStatus::Completed && self.end_date.is_some_and(|end| end < today)
    }
}

/// Field values for a new project.
#[derive(Debug, Clone, Default)]
pub struct ProjectDraft {
    pub name: String,
    pub owner: Option<String>,
    pub budget: Option<f64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: ProjectStatus,
}

impl ProjectDraft {
    /// Create a draft with just a name; everything else defaults.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Check the draft before it is written.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank, the budget is negative or not
    /// finite, or the end date precedes the start date.
    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.name,
            self.budget,
            self.start_date,
            self.end_date,
        )
    }
}

/// Partial update of a project. `None` leaves a field unchanged;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub owner: Option<Option<String>>,
    pub budget: Option<Option<f64>>,
    pub start_date: Option<Option<NaiveDate>>,
    pub end_date: Option<Option<NaiveDate>>,
    pub status: Option<ProjectStatus>,
}

impl ProjectChanges {
    /// True if no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.owner.is_none()
            && self.budget.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.status.is_none()
    }

    /// Apply the changes to a copy of `project` and validate the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated project fails validation.
    pub fn apply(&self, project: &Project) -> Result<Project> {
        let mut updated = project.clone();
        if let Some(name) = &self.name {
            updated.name.clone_from(name);
        }
        if let Some(owner) = &self.owner {
            updated.owner.clone_from(owner);
        }
        if let Some(budget) = self.budget {
            updated.budget = budget;
        }
        if let Some(start) = self.start_date {
            updated.start_date = start;
        }
        if let Some(end) = self.end_date {
            updated.end_date = end;
        }
        if let Some(status) = self.status {
            updated.status = status;
        }

        validate_fields(
            &updated.name,
            updated.budget,
            updated.start_date,
            updated.end_date,
        )?;
        Ok(updated)
    }
}

fn validate_fields(
    name: &str,
    budget: Option<f64>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::RequiredField("name"));
    }
    if let Some(b) = budget {
        if !b.is_finite() || b < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "budget must be a non-negative number, got {b}"
            )));
        }
    }
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(Error::InvalidArgument(format!(
                "end date {end} is before start date {start}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn project() -> Project {
        Project {
            id: 1,
            name: "Bridge Audit".to_string(),
            owner: Some("Ravi".to_string()),
            budget: Some(5000.0),
            start_date: Some(date("2025-01-01")),
            end_date: Some(date("2025-03-01")),
            status: ProjectStatus::Active,
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("active".parse::<ProjectStatus>().unwrap(), ProjectStatus::Active);
        assert_eq!("PAUSED".parse::<ProjectStatus>().unwrap(), ProjectStatus::Paused);
        assert_eq!("done".parse::<ProjectStatus>().unwrap(), ProjectStatus::Completed);
        assert!(matches!(
            "archived".parse::<ProjectStatus>(),
            Err(Error::InvalidStatus { .. })
        ));
    }

    #[test]
    fn test_every_canonical_status_parses_to_itself() {
        for canonical in crate::validate::VALID_STATUSES.iter() {
            let status: ProjectStatus = canonical.parse().unwrap();
            assert_eq!(status.as_str(), *canonical);
        }
        for status in ProjectStatus::ALL {
            assert_eq!(status.as_str().parse::<ProjectStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_status_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&ProjectStatus::Completed).unwrap(),
            "\"completed\""
        );
    }

    #[test]
    fn test_is_overdue() {
        let p = project();
        assert!(!p.is_overdue(date("2025-03-01")));
        assert!(p.is_overdue(date("2025-03-02")));

        let done = Project {
            status: ProjectStatus::Completed,
            ..p.clone()
        };
        assert!(!done.is_overdue(date("2030-01-01")));

        let open_ended = Project { end_date: None, ..p };
        assert!(!open_ended.is_overdue(date("2030-01-01")));
    }

    #[test]
    fn test_draft_requires_name() {
        assert!(matches!(
            ProjectDraft::new("   ").validate(),
            Err(Error::RequiredField("name"))
        ));
        assert!(ProjectDraft::new("Ok").validate().is_ok());
    }

    #[test]
    fn test_draft_rejects_inverted_dates() {
        let draft = ProjectDraft {
            start_date: Some(date("2025-05-01")),
            end_date: Some(date("2025-04-01")),
            ..ProjectDraft::new("Backwards")
        };
        assert!(matches!(draft.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_draft_rejects_negative_budget() {
        let draft = ProjectDraft {
            budget: Some(-1.0),
            ..ProjectDraft::new("Cheap")
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_changes_apply_and_clear() {
        let changes = ProjectChanges {
            owner: Some(None),
            status: Some(ProjectStatus::Paused),
            ..ProjectChanges::default()
        };
        let updated = changes.apply(&project()).unwrap();

        assert_eq!(updated.owner, None);
        assert_eq!(updated.status, ProjectStatus::Paused);
        assert_eq!(updated.name, "Bridge Audit");
        assert_eq!(updated.budget, Some(5000.0));
    }

    #[test]
    fn test_changes_validate_result() {
        let changes = ProjectChanges {
            end_date: Some(Some(date("2024-12-31"))),
            ..ProjectChanges::default()
        };
        assert!(changes.apply(&project()).is_err());
        assert!(ProjectChanges::default().is_empty());
    }
}
