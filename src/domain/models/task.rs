use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub url: String,
    pub goal: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTask {
    pub task_id: String,
    pub endpoint: String,
}

/// Partial update body. Unchanged fields are left out of the payload entirely.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TaskPatch {
    pub fn diff(current_goal: &str, current_url: &str, goal: &str, url: &str) -> TaskPatch {
        let mut patch = TaskPatch::default();
        if goal != current_goal {
            patch.goal = Some(goal.to_string());
        }
        if url != current_url {
            patch.url = Some(url.to_string());
        }

        return patch;
    }

    pub fn is_empty(&self) -> bool {
        return self.goal.is_none() && self.url.is_none();
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusReport {
    pub task_id: String,
    pub status: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub goal: String,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}
