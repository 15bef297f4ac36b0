use chrono::NaiveDate;

use crate::api::Backend;
use crate::dates::{self, DateError};
use crate::models::{Project, Task, TaskCreate, TaskStatus};

/// TODO -> IN_PROGRESS -> DONE -> TODO.
pub fn next_status(status: TaskStatus) -> TaskStatus {
    match status {
        TaskStatus::Todo => TaskStatus::InProgress,
        TaskStatus::InProgress => TaskStatus::Done,
        TaskStatus::Done => TaskStatus::Todo,
    }
}

pub fn blank_task(today: NaiveDate) -> TaskCreate {
    let (start_date, end_date) = dates::default_range(today);
    TaskCreate {
        title: String::new(),
        description: Some(String::new()),
        start_date,
        end_date,
        status: TaskStatus::Todo,
    }
}

/// Update payload that resubmits a task as it currently stands.
///
/// Dates are re-normalized from whatever the backend stored. A date that
/// cannot be normalized is passed through untouched so the strict check in
/// [`TaskView::update`] rejects it.
pub fn current_payload(task: &Task) -> TaskCreate {
    let normalize = |value: &str| dates::normalize_date(value).unwrap_or_else(|| value.to_string());
    TaskCreate {
        title: task.title.clone(),
        description: Some(task.description.clone().unwrap_or_default()),
        start_date: normalize(&task.start_date),
        end_date: normalize(&task.end_date),
        status: task.status,
    }
}

/// Full update payload for a task with the following status.
pub fn cycled_payload(task: &Task) -> TaskCreate {
    TaskCreate {
        status: next_status(task.status),
        ..current_payload(task)
    }
}

/// Reformats a new task's dates to `YYYY-MM-DD`, rejecting unreadable ones.
pub fn prepare_create(payload: &TaskCreate) -> Result<TaskCreate, DateError> {
    let start_date = dates::normalize_field("start_date", &payload.start_date)?;
    let end_date = dates::normalize_field("end_date", &payload.end_date)?;
    Ok(TaskCreate {
        start_date,
        end_date,
        ..payload.clone()
    })
}

/// Update payloads must already be date-only; they are never reformatted.
pub fn check_update(payload: &TaskCreate) -> Result<(), DateError> {
    dates::require_strict("start_date", &payload.start_date)?;
    dates::require_strict("end_date", &payload.end_date)
}

/// Tasks of the selected project plus the new-task form.
///
/// Mutations return true when the caller should re-list the projects.
#[derive(Debug)]
pub struct TaskView {
    pub project_id: i64,
    pub project_name: String,
    pub tasks: Vec<Task>,
    pub new_task: TaskCreate,
}

impl TaskView {
    pub fn new(project: &Project) -> Self {
        Self {
            project_id: project.id,
            project_name: project.name.clone(),
            tasks: project.tasks.clone(),
            new_task: blank_task(dates::today()),
        }
    }

    /// Takes over the task list of a refreshed project; the form survives.
    pub fn sync(&mut self, project: &Project) {
        if self.project_id != project.id {
            *self = Self::new(project);
            return;
        }
        self.project_name = project.name.clone();
        self.tasks = project.tasks.clone();
    }

    pub fn reset_form(&mut self) {
        self.new_task = blank_task(dates::today());
    }

    pub async fn create<B: Backend>(&mut self, api: &B) -> bool {
        let payload = match prepare_create(&self.new_task) {
            Ok(payload) => payload,
            Err(e) => {
                log::error!("Invalid date format: {}", e);
                return false;
            }
        };

        match api.create_task(self.project_id, &payload).await {
            Ok(task) => {
                log::info!("Created task {} '{}'", task.id, task.title);
                self.reset_form();
                true
            }
            Err(e) => {
                log::error!("Error creating task: {}", e);
                false
            }
        }
    }

    pub async fn update<B: Backend>(&mut self, api: &B, task_id: i64, payload: &TaskCreate) -> bool {
        if let Err(e) = check_update(payload) {
            log::error!("Invalid date format: {}", e);
            return false;
        }

        match api.update_task(self.project_id, task_id, payload).await {
            Ok(_) => true,
            Err(e) => {
                if let Some(status) = e.status() {
                    log::error!("Error updating task - Status: {}", status);
                }
                log::error!("Error details: {}", e);
                log::error!("Request payload: {:?}", payload);
                false
            }
        }
    }

    pub async fn delete<B: Backend>(&mut self, api: &B, task_id: i64) -> bool {
        match api.delete_task(self.project_id, task_id).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("Error deleting task: {}", e);
                false
            }
        }
    }

    pub async fn cycle_status<B: Backend>(&mut self, api: &B, task_id: i64) -> bool {
        let Some(task) = self.tasks.iter().find(|t| t.id == task_id) else {
            return false;
        };
        let payload = cycled_payload(task);
        log::debug!("Sending task update: {:?}", payload);
        self.update(api, task_id, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, FakeBackend};
    use crate::models::ProjectCreate;
    use crate::projects::ProjectList;
    use reqwest::StatusCode;

    fn draft() -> TaskCreate {
        TaskCreate {
            title: "Draft".to_string(),
            description: Some(String::new()),
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-08".to_string(),
            status: TaskStatus::Todo,
        }
    }

    /// A backend holding project "Launch" and a list/view pair pointed at it.
    async fn launch() -> (FakeBackend, ProjectList, TaskView) {
        let api = FakeBackend::new();
        let mut list = ProjectList::new();
        list.new_project = ProjectCreate {
            name: "Launch".to_string(),
            description: Some("Q1".to_string()),
        };
        assert!(list.create(&api).await);
        list.select(list.projects[0].id);
        let view = TaskView::new(list.selected.as_ref().unwrap());
        api.clear_calls();
        (api, list, view)
    }

    async fn relist(api: &FakeBackend, list: &mut ProjectList, view: &mut TaskView) {
        assert!(list.list(api).await);
        view.sync(list.selected.as_ref().unwrap());
    }

    #[test]
    fn status_cycle_is_closed() {
        assert_eq!(next_status(TaskStatus::Todo), TaskStatus::InProgress);
        assert_eq!(next_status(TaskStatus::InProgress), TaskStatus::Done);
        assert_eq!(next_status(TaskStatus::Done), TaskStatus::Todo);
        for status in TaskStatus::ALL {
            assert_eq!(next_status(next_status(next_status(status))), status);
        }
    }

    #[test]
    fn blank_task_defaults_to_a_week() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 26).unwrap();
        let task = blank_task(today);
        assert_eq!(task.start_date, "2024-02-26");
        assert_eq!(task.end_date, "2024-03-04");
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.title.is_empty());
    }

    #[test]
    fn create_reformats_but_update_does_not() {
        let mut payload = draft();
        payload.start_date = "2024-01-01T00:00:00".to_string();

        let prepared = prepare_create(&payload).unwrap();
        assert_eq!(prepared.start_date, "2024-01-01");
        assert_eq!(prepared.title, "Draft");

        assert!(check_update(&payload).is_err());
        assert!(check_update(&prepared).is_ok());
    }

    #[test]
    fn cycled_payload_normalizes_dates_and_description() {
        let task = Task {
            id: 4,
            project_id: 1,
            title: "Draft".to_string(),
            description: None,
            start_date: "2024-01-01T00:00:00".to_string(),
            end_date: "2024-01-08T00:00:00".to_string(),
            status: TaskStatus::Done,
            created_at: String::new(),
            updated_at: String::new(),
        };

        let payload = cycled_payload(&task);
        assert_eq!(payload.start_date, "2024-01-01");
        assert_eq!(payload.end_date, "2024-01-08");
        assert_eq!(payload.description.as_deref(), Some(""));
        assert_eq!(payload.status, TaskStatus::Todo);
    }

    #[test]
    fn current_payload_keeps_status_and_normalizes_dates() {
        let task = Task {
            id: 4,
            project_id: 1,
            title: "Draft".to_string(),
            description: Some("Outline".to_string()),
            start_date: "2024-01-01T00:00:00".to_string(),
            end_date: "not a date".to_string(),
            status: TaskStatus::InProgress,
            created_at: String::new(),
            updated_at: String::new(),
        };

        let payload = current_payload(&task);
        assert_eq!(payload.status, TaskStatus::InProgress);
        assert_eq!(payload.start_date, "2024-01-01");
        assert_eq!(payload.end_date, "not a date");
        assert_eq!(payload.description.as_deref(), Some("Outline"));
        assert_eq!(cycled_payload(&task).status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn created_task_appears_after_relist() {
        let (api, mut list, mut view) = launch().await;
        view.new_task = draft();

        assert!(view.create(&api).await);
        relist(&api, &mut list, &mut view).await;

        assert_eq!(view.tasks.len(), 1);
        let task = &view.tasks[0];
        assert_eq!(task.title, "Draft");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(dates::normalize_date(&task.start_date).as_deref(), Some("2024-01-01"));
        assert_eq!(dates::normalize_date(&task.end_date).as_deref(), Some("2024-01-08"));
        assert!(view.new_task.title.is_empty());
    }

    #[tokio::test]
    async fn create_with_bad_date_never_sends() {
        let (api, _list, mut view) = launch().await;
        view.new_task = draft();
        view.new_task.end_date = "next week".to_string();

        assert!(!view.create(&api).await);

        assert!(api.calls().is_empty());
        assert_eq!(view.new_task.title, "Draft");
    }

    #[tokio::test]
    async fn update_with_loose_date_never_sends() {
        let (api, _list, mut view) = launch().await;
        let mut payload = draft();
        payload.start_date = "2024-1-1".to_string();

        assert!(!view.update(&api, 99, &payload).await);

        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn toggling_twice_walks_todo_to_done() {
        let (api, mut list, mut view) = launch().await;
        view.new_task = draft();
        assert!(view.create(&api).await);
        relist(&api, &mut list, &mut view).await;
        let task_id = view.tasks[0].id;

        assert!(view.cycle_status(&api, task_id).await);
        relist(&api, &mut list, &mut view).await;
        assert_eq!(view.tasks[0].status, TaskStatus::InProgress);

        assert!(view.cycle_status(&api, task_id).await);
        relist(&api, &mut list, &mut view).await;
        assert_eq!(view.tasks[0].status, TaskStatus::Done);

        let sent: Vec<_> = api
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::UpdateTask(_, _, payload) => Some(payload),
                _ => None,
            })
            .collect();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|p| p.start_date == "2024-01-01" && p.end_date == "2024-01-08"));
    }

    #[tokio::test]
    async fn toggle_with_corrupt_stored_date_is_rejected_locally() {
        let (api, mut list, mut view) = launch().await;
        view.new_task = draft();
        assert!(view.create(&api).await);
        relist(&api, &mut list, &mut view).await;
        let task_id = view.tasks[0].id;

        api.set_task_dates(task_id, "garbage", "2024-01-08");
        relist(&api, &mut list, &mut view).await;
        api.clear_calls();

        assert!(!view.cycle_status(&api, task_id).await);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_update_reports_no_refresh() {
        let (api, mut list, mut view) = launch().await;
        view.new_task = draft();
        assert!(view.create(&api).await);
        relist(&api, &mut list, &mut view).await;
        let task_id = view.tasks[0].id;

        api.fail_next_with(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!view.cycle_status(&api, task_id).await);

        relist(&api, &mut list, &mut view).await;
        assert_eq!(view.tasks[0].status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn delete_removes_task() {
        let (api, mut list, mut view) = launch().await;
        view.new_task = draft();
        assert!(view.create(&api).await);
        relist(&api, &mut list, &mut view).await;
        let task_id = view.tasks[0].id;

        assert!(view.delete(&api, task_id).await);
        relist(&api, &mut list, &mut view).await;

        assert!(view.tasks.is_empty());
        assert_eq!(list.projects[0].tasks.len(), 0);
    }

    #[test]
    fn sync_keeps_form_for_same_project() {
        let project = Project {
            id: 1,
            name: "Launch".to_string(),
            description: None,
            created_at: String::new(),
            updated_at: String::new(),
            tasks: Vec::new(),
        };
        let mut view = TaskView::new(&project);
        view.new_task.title = "half typed".to_string();

        view.sync(&project);
        assert_eq!(view.new_task.title, "half typed");

        let other = Project { id: 2, ..project };
        view.sync(&other);
        assert_eq!(view.project_id, 2);
        assert!(view.new_task.title.is_empty());
    }
}
