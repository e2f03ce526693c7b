//! Project management commands.
//!
//! Commands for managing projects:
//! - `pd project create <name>` - Create a new project
//! - `pd project list` - List projects, newest first
//! - `pd project show <id>` - Show project details
//! - `pd project update <id>` - Update project fields
//! - `pd project delete <id>` - Delete a project
//! - `pd project export` - Export all projects as CSV
//!
//! Every mutating command persists the snapshot once after its write.

use crate::cli::commands::{open_database, runtime};
use crate::cli::{ProjectCommands, ProjectCreateArgs, ProjectUpdateArgs};
use crate::error::{Error, Result};
use crate::model::{Project, ProjectChanges, ProjectDraft, ProjectStatus};
use crate::storage::{Database, atomic_write};
use crate::validate::{parse_date, today};
use chrono::NaiveDate;
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::Path;
use tokio::runtime::Runtime;

/// CSV header used by `list --format csv` and `export`.
pub const CSV_HEADER: &str = "id,name,owner,budget,start_date,end_date,status";

#[derive(Serialize)]
struct ProjectOutput<'a> {
    #[serde(flatten)]
    project: &'a Project,
    overdue: bool,
}

impl<'a> ProjectOutput<'a> {
    fn new(project: &'a Project, today: NaiveDate) -> Self {
        Self {
            project,
            overdue: project.is_overdue(today),
        }
    }
}

#[derive(Serialize)]
struct ProjectListOutput<'a> {
    projects: Vec<ProjectOutput<'a>>,
    count: usize,
}

/// Execute a project command.
///
/// # Errors
///
/// Returns an error if the data directory is not initialized, the
/// arguments are invalid, or a query or persist fails.
pub fn execute(command: &ProjectCommands, data_dir: Option<&Path>, json: bool) -> Result<()> {
    let rt = runtime()?;
    let db = open_database(&rt, data_dir)?;

    match command {
        ProjectCommands::Create(args) => execute_create(&rt, db, args, json),
        ProjectCommands::List { status, limit } => {
            execute_list(db, status.as_deref(), *limit, json)
        }
        ProjectCommands::Show { id } => execute_show(db, *id, json),
        ProjectCommands::Update(args) => execute_update(&rt, db, args, json),
        ProjectCommands::Delete { id } => execute_delete(&rt, db, *id, json),
        ProjectCommands::Export { output } => execute_export(db, output.as_deref(), json),
    }
}

fn parse_date_arg(value: Option<&str>) -> Result<Option<NaiveDate>> {
    value
        .map(|v| parse_date(v).map_err(Error::InvalidArgument))
        .transpose()
}

fn execute_create(
    rt: &Runtime,
    db: &Database,
    args: &ProjectCreateArgs,
    json: bool,
) -> Result<()> {
    let draft = ProjectDraft {
        owner: args.owner.clone(),
        budget: args.budget,
        start_date: parse_date_arg(args.start.as_deref())?,
        end_date: parse_date_arg(args.end.as_deref())?,
        status: args.status.parse()?,
        ..ProjectDraft::new(args.name.clone())
    };

    let project = db.create_project(&draft)?;
    rt.block_on(db.persist())?;

    if crate::is_silent() {
        println!("{}", project.id);
        return Ok(());
    }

    if json {
        let output = ProjectOutput::new(&project, today());
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Created project: {}", project.name);
        println!("  ID:     {}", project.id);
        println!("  Status: {}", project.status);
    }

    Ok(())
}

fn execute_list(db: &Database, status: Option<&str>, limit: usize, json: bool) -> Result<()> {
    let status = status.map(str::parse::<ProjectStatus>).transpose()?;
    let projects = db.list_projects(status, limit)?;
    let today = today();

    if crate::is_csv() {
        print!("{}", projects_to_csv(&projects));
    } else if json {
        let output = ProjectListOutput {
            count: projects.len(),
            projects: projects
                .iter()
                .map(|p| ProjectOutput::new(p, today))
                .collect(),
        };
        println!("{}", serde_json::to_string(&output)?);
    } else if projects.is_empty() {
        println!("No projects found.");
        println!("\nCreate one with: pd project create \"My Project\"");
    } else {
        print_project_list(&projects, today);
    }

    Ok(())
}

fn status_label(project: &Project, today: NaiveDate) -> String {
    let label = match project.status {
        ProjectStatus::Active => project.status.as_str().green(),
        ProjectStatus::Paused => project.status.as_str().yellow(),
        ProjectStatus::Completed => project.status.as_str().dimmed(),
    };
    if project.is_overdue(today) {
        format!("{label} {}", "OVERDUE".red().bold())
    } else {
        label.to_string()
    }
}

fn print_project_list(projects: &[Project], today: NaiveDate) {
    println!("Projects ({}):", projects.len());
    println!();
    for project in projects {
        println!(
            "  [{}] {} ({})",
            project.id,
            project.name.bold(),
            status_label(project, today)
        );
        if let Some(owner) = &project.owner {
            println!("      Owner:  {owner}");
        }
        if let Some(budget) = project.budget {
            println!("      Budget: {budget:.2}");
        }
        if project.start_date.is_some() || project.end_date.is_some() {
            println!(
                "      Dates:  {} → {}",
                format_date(project.start_date),
                format_date(project.end_date)
            );
        }
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.to_string())
}

fn execute_show(db: &Database, id: i64, json: bool) -> Result<()> {
    let project = db.get_project(id)?.ok_or(Error::ProjectNotFound { id })?;
    let today = today();

    if json {
        let output = ProjectOutput::new(&project, today);
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Project: {}", project.name.bold());
        println!("  ID:     {}", project.id);
        println!("  Status: {}", status_label(&project, today));
        println!("  Owner:  {}", project.owner.as_deref().unwrap_or("-"));
        println!(
            "  Budget: {}",
            project
                .budget
                .map_or_else(|| "-".to_string(), |b| format!("{b:.2}"))
        );
        println!("  Start:  {}", format_date(project.start_date));
        println!("  End:    {}", format_date(project.end_date));
    }

    Ok(())
}

fn changes_from_args(args: &ProjectUpdateArgs) -> Result<ProjectChanges> {
    let owner = if args.clear_owner {
        Some(None)
    } else {
        args.owner.clone().map(Some)
    };
    let budget = if args.clear_budget {
        Some(None)
    } else {
        args.budget.map(Some)
    };
    let (start_date, end_date) = if args.clear_dates {
        (Some(None), Some(None))
    } else {
        (
            parse_date_arg(args.start.as_deref())?.map(Some),
            parse_date_arg(args.end.as_deref())?.map(Some),
        )
    };

    let changes = ProjectChanges {
        name: args.name.clone(),
        owner,
        budget,
        start_date,
        end_date,
        status: args
            .status
            .as_deref()
            .map(str::parse::<ProjectStatus>)
            .transpose()?,
    };

    if changes.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to update; pass at least one field".to_string(),
        ));
    }
    Ok(changes)
}

fn execute_update(
    rt: &Runtime,
    db: &Database,
    args: &ProjectUpdateArgs,
    json: bool,
) -> Result<()> {
    let changes = changes_from_args(args)?;
    let updated = db.update_project(args.id, &changes)?;
    rt.block_on(db.persist())?;

    if crate::is_silent() {
        println!("{}", updated.id);
        return Ok(());
    }

    if json {
        let output = ProjectOutput::new(&updated, today());
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Updated project: {}", updated.name);
        println!("  ID:     {}", updated.id);
        println!("  Status: {}", updated.status);
    }

    Ok(())
}

fn execute_delete(rt: &Runtime, db: &Database, id: i64, json: bool) -> Result<()> {
    let project = db.get_project(id)?.ok_or(Error::ProjectNotFound { id })?;
    db.delete_project(id)?;
    rt.block_on(db.persist())?;

    if crate::is_silent() {
        println!("{id}");
        return Ok(());
    }

    if json {
        let output = serde_json::json!({
            "deleted": true,
            "id": project.id,
            "name": project.name,
        });
        println!("{output}");
    } else {
        println!("Deleted project: {} ({})", project.name, project.id);
    }

    Ok(())
}

fn execute_export(db: &Database, output: Option<&Path>, json: bool) -> Result<()> {
    let projects = db.all_projects()?;
    let csv = projects_to_csv(&projects);

    let Some(path) = output else {
        print!("{csv}");
        return Ok(());
    };

    atomic_write(path, csv.as_bytes())?;

    if json {
        let output = serde_json::json!({
            "path": path,
            "count": projects.len(),
        });
        println!("{output}");
    } else if !crate::is_silent() {
        println!("Exported {} projects to {}", projects.len(), path.display());
    }

    Ok(())
}

/// Render projects as CSV, header line included.
#[must_use]
pub fn projects_to_csv(projects: &[Project]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + projects.len() * 64);
    out.push_str(CSV_HEADER);
    out.push('\n');

    for p in projects {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{}",
            p.id,
            crate::csv_escape(&p.name),
            crate::csv_escape(p.owner.as_deref().unwrap_or("")),
            p.budget.map(|b| b.to_string()).unwrap_or_default(),
            p.start_date.map(|d| d.to_string()).unwrap_or_default(),
            p.end_date.map(|d| d.to_string()).unwrap_or_default(),
            p.status,
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn project(id: i64, name: &str) -> Project {
        Project {
            id,
            name: name.to_string(),
            owner: None,
            budget: None,
            start_date: None,
            end_date: None,
            status: ProjectStatus::Active,
        }
    }

    fn update_args(argv: &[&str]) -> ProjectUpdateArgs {
        let mut full = vec!["pd", "project", "update"];
        full.extend_from_slice(argv);
        match crate::cli::Cli::parse_from(full).command {
            crate::cli::Commands::Project {
                command: ProjectCommands::Update(args),
            } => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_projects_to_csv() {
        let mut audit = project(1, "Bridge Audit");
        audit.owner = Some("Ng, Ada".to_string());
        audit.budget = Some(12500.0);
        audit.start_date = NaiveDate::from_ymd_opt(2025, 1, 6);
        audit.end_date = NaiveDate::from_ymd_opt(2025, 4, 30);

        let mut done = project(2, "Say \"hi\"");
        done.status = ProjectStatus::Completed;

        let csv = projects_to_csv(&[audit, done]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "1,Bridge Audit,\"Ng, Ada\",12500,2025-01-06,2025-04-30,active"
        );
        assert_eq!(lines[2], "2,\"Say \"\"hi\"\"\",,,,,completed");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_projects_to_csv_empty_has_header() {
        assert_eq!(projects_to_csv(&[]), format!("{CSV_HEADER}\n"));
    }

    #[test]
    fn test_changes_from_args_clears_fields() {
        let args = update_args(&["7", "--clear-owner", "--clear-dates", "--status", "done"]);
        let changes = changes_from_args(&args).unwrap();

        assert_eq!(changes.owner, Some(None));
        assert_eq!(changes.start_date, Some(None));
        assert_eq!(changes.end_date, Some(None));
        assert_eq!(changes.status, Some(ProjectStatus::Completed));
        assert_eq!(changes.budget, None);
        assert_eq!(changes.name, None);
    }

    #[test]
    fn test_changes_from_args_parses_dates() {
        let args = update_args(&["7", "--end", "2025-12-31", "--budget", "10"]);
        let changes = changes_from_args(&args).unwrap();

        assert_eq!(changes.end_date, Some(NaiveDate::from_ymd_opt(2025, 12, 31)));
        assert_eq!(changes.budget, Some(Some(10.0)));
    }

    #[test]
    fn test_changes_from_args_rejects_empty_and_bad_input() {
        assert!(matches!(
            changes_from_args(&update_args(&["7"])),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            changes_from_args(&update_args(&["7", "--end", "31/12/2025"])),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            changes_from_args(&update_args(&["7", "--status", "archived"])),
            Err(Error::InvalidStatus { .. })
        ));
    }
}
