use anyhow::{anyhow, bail, Result};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use std::io::{self, Write};

use crate::api::Backend;
use crate::dates;
use crate::gantt;
use crate::models::{Project, ProjectCreate, Task, TaskCreate, TaskStatus};
use crate::tasks::{blank_task, check_update, current_payload, cycled_payload, prepare_create};

const CHART_WIDTH: usize = 40;

#[derive(Debug, PartialEq)]
pub enum ProjectMatch {
    Found(Project),
    Suggested(Project),
    NotFound,
}

/// Asks on stdin whether a suggested name was meant.
pub fn ask_user_confirmation(input_name: &str, suggested_name: &str) -> bool {
    print!("'{}' not found. Did you mean '{}'? (y/n): ", input_name, suggested_name);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    let answer = input.trim().to_lowercase();
    answer == "y" || answer == "yes"
}

/// Looks a project up by id, then exact name, then fuzzy name.
pub fn match_project(projects: &[Project], query: &str) -> ProjectMatch {
    let query = query.trim();

    if let Ok(id) = query.parse::<i64>() {
        if let Some(project) = projects.iter().find(|p| p.id == id) {
            return ProjectMatch::Found(project.clone());
        }
    }

    if let Some(project) = projects
        .iter()
        .find(|p| p.name == query)
        .or_else(|| projects.iter().find(|p| p.name.eq_ignore_ascii_case(query)))
    {
        return ProjectMatch::Found(project.clone());
    }

    let matcher = SkimMatcherV2::default();
    let mut best_match: Option<(i64, &Project)> = None;
    for project in projects {
        if let Some(score) = matcher.fuzzy_match(&project.name, query) {
            if best_match.map_or(true, |(best, _)| score > best) {
                best_match = Some((score, project));
            }
        }
    }

    match best_match {
        Some((_, project)) => ProjectMatch::Suggested(project.clone()),
        None => ProjectMatch::NotFound,
    }
}

pub async fn resolve_project<B: Backend>(
    api: &B,
    query: &str,
    confirm: impl Fn(&str, &str) -> bool,
) -> Result<Option<Project>> {
    let projects = api.list_projects().await?;
    match match_project(&projects, query) {
        ProjectMatch::Found(project) => Ok(Some(project)),
        ProjectMatch::Suggested(project) => {
            if confirm(query, &project.name) {
                Ok(Some(project))
            } else {
                println!("Operation cancelled.");
                Ok(None)
            }
        }
        ProjectMatch::NotFound => {
            println!("Project '{}' not found.", query);
            Ok(None)
        }
    }
}

pub fn format_project_row(project: &Project) -> String {
    format!(
        "{} | {} | {} | Created: {} | Tasks: {}",
        project.id,
        project.name,
        project.description.as_deref().unwrap_or(""),
        dates::display_date(&project.created_at),
        project.tasks.len()
    )
}

pub fn format_task_row(task: &Task) -> String {
    format!(
        "{} | {} | {} | {} - {} | {}",
        task.id,
        task.title,
        task.description.as_deref().unwrap_or(""),
        dates::display_date(&task.start_date),
        dates::display_date(&task.end_date),
        task.status
    )
}

fn parse_status(value: &str) -> Result<TaskStatus> {
    TaskStatus::parse(value)
        .ok_or_else(|| anyhow!("Invalid status '{}'. Valid statuses are: TODO, IN_PROGRESS, DONE", value))
}

fn print_tasks(tasks: &[Task]) {
    println!("Tasks:");
    println!("------");
    for task in tasks {
        println!("{}", format_task_row(task));
    }

    let rows = gantt::derive_rows(tasks, dates::now_millis());
    let chart = gantt::render_text(&rows, CHART_WIDTH);
    if !chart.is_empty() {
        println!();
        for line in chart {
            println!("{}", line);
        }
    }
}

pub async fn list_projects<B: Backend>(api: &B) -> Result<()> {
    let projects = api.list_projects().await?;
    println!("Projects:");
    println!("---------");
    for project in &projects {
        println!("{}", format_project_row(project));
    }
    Ok(())
}

pub async fn show_project<B: Backend>(api: &B, query: &str) -> Result<()> {
    let Some(found) = resolve_project(api, query, ask_user_confirmation).await? else {
        return Ok(());
    };
    let project = api.get_project(found.id).await?;

    println!("Project: {}", project.name);
    println!("Description: {}", project.description.as_deref().unwrap_or(""));
    println!("Created: {}", dates::display_date(&project.created_at));
    println!("Updated: {}", dates::display_date(&project.updated_at));
    println!();
    print_tasks(&project.tasks);
    Ok(())
}

pub async fn create_project<B: Backend>(api: &B, name: &str, description: Option<String>) -> Result<Project> {
    let payload = ProjectCreate {
        name: name.to_string(),
        description,
    };
    let project = api.create_project(&payload).await?;
    println!("Project '{}' created with id {}", project.name, project.id);
    Ok(project)
}

pub async fn update_project<B: Backend>(
    api: &B,
    project: &Project,
    name: Option<String>,
    description: Option<String>,
) -> Result<Project> {
    let current = ProjectCreate::from_project(project);
    let payload = ProjectCreate {
        name: name.unwrap_or(current.name),
        description: description.or(current.description),
    };
    let updated = api.update_project(project.id, &payload).await?;
    println!("Project {} updated", updated.id);
    Ok(updated)
}

pub async fn delete_project<B: Backend>(api: &B, project: &Project) -> Result<()> {
    api.delete_project(project.id).await?;
    println!("Project '{}' deleted", project.name);
    Ok(())
}

pub async fn list_tasks<B: Backend>(api: &B, project: &Project) -> Result<()> {
    let tasks = api.list_tasks(project.id).await?;
    println!("Project: {}", project.name);
    print_tasks(&tasks);
    Ok(())
}

pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub status: String,
}

pub async fn create_task<B: Backend>(api: &B, project: &Project, new_task: NewTask) -> Result<Task> {
    let defaults = blank_task(dates::today());
    let draft = TaskCreate {
        title: new_task.title,
        description: new_task.description.or(defaults.description),
        start_date: new_task.start.unwrap_or(defaults.start_date),
        end_date: new_task.end.unwrap_or(defaults.end_date),
        status: parse_status(&new_task.status)?,
    };
    let payload = prepare_create(&draft)?;

    let task = api.create_task(project.id, &payload).await?;
    println!("Task '{}' created with id {} in '{}'", task.title, task.id, project.name);
    Ok(task)
}

#[derive(Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub status: Option<String>,
}

async fn find_task<B: Backend>(api: &B, project: &Project, task_id: i64) -> Result<Task> {
    api.list_tasks(project.id)
        .await?
        .into_iter()
        .find(|t| t.id == task_id)
        .ok_or_else(|| anyhow!("Task {} not found in '{}'", task_id, project.name))
}

pub async fn update_task<B: Backend>(api: &B, project: &Project, task_id: i64, changes: TaskChanges) -> Result<Task> {
    let task = find_task(api, project, task_id).await?;
    let current = current_payload(&task);
    let payload = TaskCreate {
        title: changes.title.unwrap_or(current.title),
        description: changes.description.or(current.description),
        start_date: changes.start.unwrap_or(current.start_date),
        end_date: changes.end.unwrap_or(current.end_date),
        status: match changes.status {
            Some(status) => parse_status(&status)?,
            None => current.status,
        },
    };
    send_task_update(api, project, task_id, &payload).await
}

pub async fn toggle_task<B: Backend>(api: &B, project: &Project, task_id: i64) -> Result<Task> {
    let task = find_task(api, project, task_id).await?;
    let payload = cycled_payload(&task);
    send_task_update(api, project, task_id, &payload).await
}

async fn send_task_update<B: Backend>(api: &B, project: &Project, task_id: i64, payload: &TaskCreate) -> Result<Task> {
    if let Err(e) = check_update(payload) {
        bail!("{}", e);
    }
    let task = api.update_task(project.id, task_id, payload).await?;
    println!("Task '{}' is now {}", task.title, task.status);
    Ok(task)
}

pub async fn delete_task<B: Backend>(api: &B, project: &Project, task_id: i64) -> Result<()> {
    api.delete_task(project.id, task_id).await?;
    println!("Task {} deleted from '{}'", task_id, project.name);
    Ok(())
}

pub async fn health<B: Backend>(api: &B) -> Result<()> {
    let health = api.health().await?;
    println!("Status: {}", health.status);
    if let Some(message) = health.message {
        println!("Message: {}", message);
    }
    if let Some(database) = health.database {
        println!("Database: {}", database);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, FakeBackend};

    fn project(id: i64, name: &str) -> Project {
        Project {
            id,
            name: name.to_string(),
            description: None,
            created_at: "2024-01-01T09:00:00".to_string(),
            updated_at: "2024-01-01T09:00:00".to_string(),
            tasks: Vec::new(),
        }
    }

    fn draft(start: Option<&str>) -> NewTask {
        NewTask {
            title: "Draft".to_string(),
            description: None,
            start: start.map(str::to_string),
            end: Some("2024-01-08".to_string()),
            status: "todo".to_string(),
        }
    }

    #[test]
    fn matches_by_id_then_name_then_fuzzy() {
        let projects = vec![project(1, "Launch"), project(2, "Operations")];

        assert_eq!(match_project(&projects, "2"), ProjectMatch::Found(projects[1].clone()));
        assert_eq!(match_project(&projects, "launch"), ProjectMatch::Found(projects[0].clone()));
        assert_eq!(match_project(&projects, "opr"), ProjectMatch::Suggested(projects[1].clone()));
        assert_eq!(match_project(&projects, "zzz"), ProjectMatch::NotFound);
    }

    #[test]
    fn rows_show_dates_and_counts() {
        let mut launch = project(1, "Launch");
        launch.description = Some("Q1".to_string());
        assert_eq!(format_project_row(&launch), "1 | Launch | Q1 | Created: 01/01/2024 | Tasks: 0");
    }

    #[tokio::test]
    async fn declined_suggestion_resolves_nothing() {
        let api = FakeBackend::new();
        create_project(&api, "Operations", None).await.unwrap();

        let declined = resolve_project(&api, "opr", |_, _| false).await.unwrap();
        assert!(declined.is_none());

        let accepted = resolve_project(&api, "opr", |_, _| true).await.unwrap();
        assert_eq!(accepted.map(|p| p.name), Some("Operations".to_string()));
    }

    #[tokio::test]
    async fn task_lifecycle_through_commands() {
        let api = FakeBackend::new();
        let launch = create_project(&api, "Launch", Some("Q1".to_string())).await.unwrap();

        let task = create_task(&api, &launch, draft(Some("2024-01-01T00:00:00"))).await.unwrap();
        assert_eq!(task.status, TaskStatus::Todo);

        let toggled = toggle_task(&api, &launch, task.id).await.unwrap();
        assert_eq!(toggled.status, TaskStatus::InProgress);

        let renamed = update_task(
            &api,
            &launch,
            task.id,
            TaskChanges {
                title: Some("Final draft".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.title, "Final draft");
        assert_eq!(renamed.status, TaskStatus::InProgress);

        delete_task(&api, &launch, task.id).await.unwrap();
        assert!(api.list_tasks(launch.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn partial_update_resubmits_current_values() {
        let api = FakeBackend::new();
        let launch = create_project(&api, "Launch", None).await.unwrap();
        let task = create_task(&api, &launch, draft(Some("2024-01-01"))).await.unwrap();
        api.clear_calls();

        let changes = TaskChanges {
            description: Some("Outline first".to_string()),
            ..Default::default()
        };
        update_task(&api, &launch, task.id, changes).await.unwrap();

        let expected = TaskCreate {
            title: "Draft".to_string(),
            description: Some("Outline first".to_string()),
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-08".to_string(),
            status: TaskStatus::Todo,
        };
        assert_eq!(api.calls(), vec![Call::UpdateTask(launch.id, task.id, expected)]);
    }

    #[tokio::test]
    async fn bad_input_is_rejected_before_sending() {
        let api = FakeBackend::new();
        let launch = create_project(&api, "Launch", None).await.unwrap();
        let task = create_task(&api, &launch, draft(Some("2024-01-01"))).await.unwrap();
        api.clear_calls();

        assert!(create_task(&api, &launch, draft(Some("tomorrow"))).await.is_err());

        let mut bad_status = draft(None);
        bad_status.status = "BLOCKED".to_string();
        assert!(create_task(&api, &launch, bad_status).await.is_err());

        let loose = TaskChanges {
            end: Some("2024-1-9".to_string()),
            ..Default::default()
        };
        assert!(update_task(&api, &launch, task.id, loose).await.is_err());

        assert!(api
            .calls()
            .iter()
            .all(|c| !matches!(c, Call::CreateTask(..) | Call::UpdateTask(..))));
    }

    #[tokio::test]
    async fn update_project_keeps_unchanged_fields() {
        let api = FakeBackend::new();
        let launch = create_project(&api, "Launch", Some("Q1".to_string())).await.unwrap();

        let updated = update_project(&api, &launch, Some("Launch 2".to_string()), None)
            .await
            .unwrap();

        assert_eq!(updated.name, "Launch 2");
        assert_eq!(updated.description.as_deref(), Some("Q1"));
    }
}
