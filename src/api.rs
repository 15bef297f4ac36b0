use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::models::{HealthStatus, Project, ProjectCreate, Task, TaskCreate};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: Value,
    },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The REST surface the views and commands talk to.
#[allow(async_fn_in_trait)]
pub trait Backend {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;
    async fn get_project(&self, project_id: i64) -> Result<Project, ApiError>;
    async fn create_project(&self, payload: &ProjectCreate) -> Result<Project, ApiError>;
    async fn update_project(&self, project_id: i64, payload: &ProjectCreate) -> Result<Project, ApiError>;
    async fn delete_project(&self, project_id: i64) -> Result<(), ApiError>;
    async fn list_tasks(&self, project_id: i64) -> Result<Vec<Task>, ApiError>;
    async fn create_task(&self, project_id: i64, payload: &TaskCreate) -> Result<Task, ApiError>;
    async fn update_task(&self, project_id: i64, task_id: i64, payload: &TaskCreate) -> Result<Task, ApiError>;
    async fn delete_task(&self, project_id: i64, task_id: i64) -> Result<(), ApiError>;
    async fn health(&self) -> Result<HealthStatus, ApiError>;
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn projects_url(&self) -> String {
        format!("{}/projects/", self.base_url)
    }

    fn project_url(&self, project_id: i64) -> String {
        format!("{}/projects/{}", self.base_url, project_id)
    }

    fn tasks_url(&self, project_id: i64) -> String {
        format!("{}/projects/{}/tasks/", self.base_url, project_id)
    }

    fn task_url(&self, project_id: i64, task_id: i64) -> String {
        format!("{}/projects/{}/tasks/{}", self.base_url, project_id, task_id)
    }

    async fn send(&self, url: &str, request: reqwest::RequestBuilder) -> Result<Response, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Network {
            url: url.to_string(),
            source,
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Err(ApiError::Status {
            url: url.to_string(),
            status,
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, ApiError> {
        response.json().await.map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ApiError> {
        log::debug!("GET {}", url);
        let response = self.send(&url, self.client.get(&url)).await?;
        Self::decode(&url, response).await
    }
}

impl Backend for ApiClient {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get_json(self.projects_url()).await
    }

    async fn get_project(&self, project_id: i64) -> Result<Project, ApiError> {
        self.get_json(self.project_url(project_id)).await
    }

    async fn create_project(&self, payload: &ProjectCreate) -> Result<Project, ApiError> {
        let url = self.projects_url();
        log::debug!("POST {}", url);
        let response = self.send(&url, self.client.post(&url).json(payload)).await?;
        Self::decode(&url, response).await
    }

    async fn update_project(&self, project_id: i64, payload: &ProjectCreate) -> Result<Project, ApiError> {
        let url = self.project_url(project_id);
        log::debug!("PUT {}", url);
        let response = self.send(&url, self.client.put(&url).json(payload)).await?;
        Self::decode(&url, response).await
    }

    async fn delete_project(&self, project_id: i64) -> Result<(), ApiError> {
        let url = self.project_url(project_id);
        log::debug!("DELETE {}", url);
        self.send(&url, self.client.delete(&url)).await?;
        Ok(())
    }

    async fn list_tasks(&self, project_id: i64) -> Result<Vec<Task>, ApiError> {
        self.get_json(self.tasks_url(project_id)).await
    }

    async fn create_task(&self, project_id: i64, payload: &TaskCreate) -> Result<Task, ApiError> {
        let url = self.tasks_url(project_id);
        log::debug!("POST {}", url);
        let response = self.send(&url, self.client.post(&url).json(payload)).await?;
        Self::decode(&url, response).await
    }

    async fn update_task(&self, project_id: i64, task_id: i64, payload: &TaskCreate) -> Result<Task, ApiError> {
        let url = self.task_url(project_id, task_id);
        log::debug!("PUT {}", url);
        let response = self.send(&url, self.client.put(&url).json(payload)).await?;
        Self::decode(&url, response).await
    }

    async fn delete_task(&self, project_id: i64, task_id: i64) -> Result<(), ApiError> {
        let url = self.task_url(project_id, task_id);
        log::debug!("DELETE {}", url);
        self.send(&url, self.client.delete(&url)).await?;
        Ok(())
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get_json(format!("{}/healthz", self.base_url)).await
    }
}
