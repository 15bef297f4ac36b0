use crate::api::Backend;
use crate::models::{Project, ProjectCreate};

/// Project collection plus the drill-down selection.
///
/// Every successful mutation is followed by a full [`ProjectList::list`];
/// nothing is patched locally.
#[derive(Debug, Default)]
pub struct ProjectList {
    pub projects: Vec<Project>,
    pub selected: Option<Project>,
    pub new_project: ProjectCreate,
}

impl ProjectList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.selected.as_ref().map(|p| p.id)
    }

    pub fn select(&mut self, project_id: i64) {
        self.selected = self.projects.iter().find(|p| p.id == project_id).cloned();
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Returns false when the fetch failed; the previous state is kept then.
    pub async fn list<B: Backend>(&mut self, api: &B) -> bool {
        match api.list_projects().await {
            Ok(projects) => {
                self.projects = projects;
                if let Some(id) = self.selected_id() {
                    self.selected = self.projects.iter().find(|p| p.id == id).cloned();
                }
                true
            }
            Err(e) => {
                log::error!("Error fetching projects: {}", e);
                false
            }
        }
    }

    pub async fn create<B: Backend>(&mut self, api: &B) -> bool {
        match api.create_project(&self.new_project).await {
            Ok(project) => {
                log::info!("Created project {} '{}'", project.id, project.name);
                self.new_project = ProjectCreate::default();
                self.list(api).await;
                true
            }
            Err(e) => {
                log::error!("Error creating project: {}", e);
                false
            }
        }
    }

    pub async fn update<B: Backend>(&mut self, api: &B, project_id: i64, payload: &ProjectCreate) -> bool {
        match api.update_project(project_id, payload).await {
            Ok(_) => {
                self.list(api).await;
                true
            }
            Err(e) => {
                log::error!("Error updating project: {}", e);
                false
            }
        }
    }

    pub async fn delete<B: Backend>(&mut self, api: &B, project_id: i64) -> bool {
        match api.delete_project(project_id).await {
            Ok(()) => {
                log::info!("Deleted project {}", project_id);
                if self.selected_id() == Some(project_id) {
                    self.clear_selection();
                }
                self.list(api).await;
                true
            }
            Err(e) => {
                log::error!("Error deleting project: {}", e);
                false
            }
        }
    }
}
