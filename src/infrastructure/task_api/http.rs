#[cfg(test)]
#[path = "http_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::domain::models::CreateTaskRequest;
use crate::domain::models::CreatedTask;
use crate::domain::models::TaskApiError;
use crate::domain::models::TaskPatch;
use crate::domain::models::TaskService;
use crate::domain::models::TaskStatusReport;

type Rejection = fn(u16, &str) -> TaskApiError;

async fn rejection(res: reqwest::Response, rejected: Rejection) -> TaskApiError {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    let err = rejected(status, &body);
    tracing::error!(status = status, error = ?err, "Task service rejected the request");

    return err;
}

async fn parse_json<T: DeserializeOwned>(
    res: reqwest::Response,
    rejected: Rejection,
) -> Result<T, TaskApiError> {
    if !res.status().is_success() {
        return Err(rejection(res, rejected).await);
    }

    return res
        .json::<T>()
        .await
        .map_err(|err| return TaskApiError::network(err.to_string()));
}

async fn expect_success(res: reqwest::Response) -> Result<(), TaskApiError> {
    if !res.status().is_success() {
        return Err(rejection(res, TaskApiError::rejected).await);
    }

    return Ok(());
}

/// Talks to the Promptly task API over HTTP.
pub struct HttpTaskService {
    url: String,
    request_timeout: Duration,
    health_check_timeout: Duration,
    client: reqwest::Client,
}

impl HttpTaskService {
    pub fn new(url: &str, request_timeout: Duration, health_check_timeout: Duration) -> HttpTaskService {
        return HttpTaskService {
            url: url.trim_end_matches('/').to_string(),
            request_timeout,
            health_check_timeout,
            client: reqwest::Client::new(),
        };
    }

    fn endpoint(&self, path: &str) -> String {
        if path.starts_with('/') {
            return format!("{}{path}", self.url);
        }

        return format!("{}/{path}", self.url);
    }
}

#[async_trait]
impl TaskService for HttpTaskService {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let res = self
            .client
            .get(self.endpoint("/"))
            .timeout(self.health_check_timeout)
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, url = self.url, "Task service is not reachable");
                bail!("Task service at {} is not reachable", self.url);
            }
        };

        let status = res.status().as_u16();
        if status >= 500 {
            tracing::error!(status = status, "Task service health check failed");
            bail!("Task service health check failed with status {status}");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn create_task(&self, req: &CreateTaskRequest) -> Result<CreatedTask, TaskApiError> {
        let res = self
            .client
            .post(self.endpoint("/create-task/"))
            .timeout(self.request_timeout)
            .json(req)
            .send()
            .await?;

        return parse_json::<CreatedTask>(res, TaskApiError::rejected).await;
    }

    #[allow(clippy::implicit_return)]
    async fn run_task(&self, endpoint_path: &str) -> Result<serde_json::Value, TaskApiError> {
        let res = self
            .client
            .get(self.endpoint(endpoint_path))
            .timeout(self.request_timeout)
            .send()
            .await?;

        return parse_json::<serde_json::Value>(res, TaskApiError::run_rejected).await;
    }

    #[allow(clippy::implicit_return)]
    async fn update_task(&self, task_id: &str, patch: &TaskPatch) -> Result<(), TaskApiError> {
        let res = self
            .client
            .patch(self.endpoint(&format!("/update-task/{task_id}")))
            .timeout(self.request_timeout)
            .json(patch)
            .send()
            .await?;

        return expect_success(res).await;
    }

    #[allow(clippy::implicit_return)]
    async fn delete_task(&self, task_id: &str) -> Result<(), TaskApiError> {
        let res = self
            .client
            .delete(self.endpoint(&format!("/delete-task/{task_id}")))
            .timeout(self.request_timeout)
            .send()
            .await?;

        return expect_success(res).await;
    }

    #[allow(clippy::implicit_return)]
    async fn task_status(&self, task_id: &str) -> Result<TaskStatusReport, TaskApiError> {
        let res = self
            .client
            .get(self.endpoint(&format!("/task-status/{task_id}")))
            .timeout(self.request_timeout)
            .send()
            .await?;

        return parse_json::<TaskStatusReport>(res, TaskApiError::rejected).await;
    }
}
