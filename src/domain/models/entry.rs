#[cfg(test)]
#[path = "entry_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Author;
use super::CreatedTask;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskStatus {
    Created,
    Running,
    Completed,
    Error,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Normal,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub text: String,
}

/// A line written by Promptly. Entries created from a successful
/// `create-task` call carry the task id and endpoint, every other assistant
/// entry is informational.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantEntry {
    pub text: String,
    pub task_id: Option<String>,
    pub endpoint_path: Option<String>,
    pub goal: Option<String>,
    pub url: Option<String>,
    pub status: Option<TaskStatus>,
    pub result: Option<String>,
    mtype: MessageType,
}

impl AssistantEntry {
    pub fn info(text: &str) -> AssistantEntry {
        return AssistantEntry {
            text: text.to_string(),
            task_id: None,
            endpoint_path: None,
            goal: None,
            url: None,
            status: None,
            result: None,
            mtype: MessageType::Normal,
        };
    }

    pub fn error(text: &str) -> AssistantEntry {
        return AssistantEntry {
            mtype: MessageType::Error,
            ..AssistantEntry::info(text)
        };
    }

    pub fn created(task: CreatedTask, goal: &str, url: &str) -> AssistantEntry {
        return AssistantEntry {
            task_id: Some(task.task_id),
            endpoint_path: Some(task.endpoint),
            goal: Some(goal.to_string()),
            url: Some(url.to_string()),
            status: Some(TaskStatus::Created),
            ..AssistantEntry::info(&format!("Created endpoint for goal: \"{goal}\""))
        };
    }

    pub fn run_result(goal: &str, result: String) -> AssistantEntry {
        return AssistantEntry {
            status: Some(TaskStatus::Completed),
            result: Some(result),
            ..AssistantEntry::info(&format!("Result for \"{goal}\":"))
        };
    }

    pub fn run_error(goal: &str, message: &str) -> AssistantEntry {
        return AssistantEntry {
            status: Some(TaskStatus::Error),
            ..AssistantEntry::error(&format!("Error running \"{goal}\": {message}"))
        };
    }

    pub fn message_type(&self) -> MessageType {
        return self.mtype;
    }

    pub fn has_task(&self) -> bool {
        return self.task_id.is_some() && self.endpoint_path.is_some();
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entry {
    User(UserEntry),
    Assistant(AssistantEntry),
}

impl Entry {
    pub fn user(text: &str) -> Entry {
        return Entry::User(UserEntry {
            text: text.to_string(),
        });
    }

    pub fn author(&self) -> Author {
        match self {
            Entry::User(_) => return Author::User,
            Entry::Assistant(_) => return Author::Promptly,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Entry::User(entry) => return &entry.text,
            Entry::Assistant(entry) => return &entry.text,
        }
    }

    pub fn as_assistant(&self) -> Option<&AssistantEntry> {
        if let Entry::Assistant(entry) = self {
            return Some(entry);
        }

        return None;
    }

    pub fn as_assistant_mut(&mut self) -> Option<&mut AssistantEntry> {
        if let Entry::Assistant(entry) = self {
            return Some(entry);
        }

        return None;
    }

    /// The task id of an assistant entry created from a confirmed task.
    pub fn task_id(&self) -> Option<&str> {
        return self.as_assistant().and_then(|entry| {
            return entry.task_id.as_deref();
        });
    }
}
