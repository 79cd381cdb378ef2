use anyhow::Result;
use async_trait::async_trait;

use super::CreateTaskRequest;
use super::CreatedTask;
use super::TaskApiError;
use super::TaskPatch;
use super::TaskStatusReport;

#[async_trait]
pub trait TaskService {
    /// Used at startup to verify the task service can be reached.
    async fn health_check(&self) -> Result<()>;

    /// Registers a new scrape task and returns its id alongside the relative
    /// endpoint used to execute it.
    async fn create_task(&self, req: &CreateTaskRequest) -> Result<CreatedTask, TaskApiError>;

    /// Executes a task through the endpoint handed out by `create_task`. The
    /// response body is returned untouched.
    async fn run_task(&self, endpoint_path: &str) -> Result<serde_json::Value, TaskApiError>;

    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<(), TaskApiError>;

    async fn delete_task(&self, task_id: &str) -> Result<(), TaskApiError>;

    async fn task_status(&self, task_id: &str) -> Result<TaskStatusReport, TaskApiError>;
}

pub type TaskServiceBox = Box<dyn TaskService + Send + Sync>;
