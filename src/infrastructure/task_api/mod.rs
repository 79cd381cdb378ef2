pub mod http;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::TaskServiceBox;

pub struct TaskApiManager {}

impl TaskApiManager {
    pub fn get() -> Result<TaskServiceBox> {
        let url = Config::get(ConfigKey::BackendURL);
        if url.is_empty() {
            bail!("No backend URL configured. Set one with --backend-url or PROMPTLY_BACKEND_URL.");
        }

        let request_timeout = Config::get(ConfigKey::RequestTimeout).parse::<u64>()?;
        let health_check_timeout = Config::get(ConfigKey::HealthCheckTimeout).parse::<u64>()?;

        return Ok(Box::new(http::HttpTaskService::new(
            &url,
            Duration::from_millis(request_timeout),
            Duration::from_millis(health_check_timeout),
        )));
    }
}
