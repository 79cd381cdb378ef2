#[cfg(test)]
#[path = "task_session_test.rs"]
mod tests;

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::domain::models::AssistantEntry;
use crate::domain::models::CreateTaskRequest;
use crate::domain::models::EditDraft;
use crate::domain::models::Entry;
use crate::domain::models::TaskPatch;
use crate::domain::models::TaskServiceBox;
use crate::domain::models::TaskStatus;

const CREATE_FALLBACK: &str = "Failed to create task: Unknown error";
const RUN_FALLBACK: &str = "Failed to run task: Unknown error";
const UPDATE_FALLBACK: &str = "Failed to update endpoint";
const DELETE_FALLBACK: &str = "Failed to delete endpoint";
const STATUS_FALLBACK: &str = "Failed to fetch task status";

/// Shared flag raised while a task request is in flight. Views hold a clone
/// and keep their input disabled while it is raised.
#[derive(Clone, Default, Debug)]
pub struct BusyGate {
    flag: Arc<AtomicBool>,
}

impl BusyGate {
    pub fn is_busy(&self) -> bool {
        return self.flag.load(Ordering::SeqCst);
    }

    fn enter(&self) -> BusyGuard {
        self.flag.store(true, Ordering::SeqCst);
        return BusyGuard {
            flag: Arc::clone(&self.flag),
        };
    }
}

/// Lowers the gate on drop, whichever way the operation ended.
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

fn pretty_json(value: &serde_json::Value) -> String {
    return serde_json::to_string_pretty(value).unwrap_or_else(|_| return value.to_string());
}

/// The chat-style transcript of scrape tasks and every remote operation that
/// mutates it.
///
/// Operations take `&mut self`, so a session never has two requests in flight
/// and every response is applied to the state it was issued from. None of
/// them return errors: failures end up either as a transcript entry (create,
/// run) or in the error banner (edit, delete, status).
pub struct TaskSession {
    service: TaskServiceBox,
    entries: Vec<Entry>,
    draft: Option<EditDraft>,
    error: Option<String>,
    busy: BusyGate,
}

impl TaskSession {
    pub fn new(service: TaskServiceBox) -> TaskSession {
        return TaskSession {
            service,
            entries: vec![],
            draft: None,
            error: None,
            busy: BusyGate::default(),
        };
    }

    pub fn entries(&self) -> &[Entry] {
        return &self.entries;
    }

    pub fn draft(&self) -> Option<&EditDraft> {
        return self.draft.as_ref();
    }

    pub fn draft_mut(&mut self) -> Option<&mut EditDraft> {
        return self.draft.as_mut();
    }

    pub fn error(&self) -> Option<&str> {
        return self.error.as_deref();
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn is_busy(&self) -> bool {
        return self.busy.is_busy();
    }

    pub fn busy_gate(&self) -> BusyGate {
        return self.busy.clone();
    }

    /// Appends an informational line that never had a task behind it.
    pub fn add_notice(&mut self, entry: AssistantEntry) {
        self.entries.push(Entry::Assistant(entry));
    }

    /// Adds an error entry when the task service cannot be reached. The
    /// session stays usable either way.
    pub async fn check_connection(&mut self) {
        if let Err(err) = self.service.health_check().await {
            self.add_notice(AssistantEntry::error(&format!(
                "Hey, it looks like the task service isn't reachable. Double check the backend URL before creating tasks.\n\nError: {err}"
            )));
        }
    }

    fn task_entry(&mut self, index: usize, action: &str) -> Option<AssistantEntry> {
        let entry = self
            .entries
            .get(index)
            .and_then(|entry| return entry.as_assistant())
            .filter(|entry| return entry.has_task())
            .cloned();

        if entry.is_none() {
            self.error = Some(format!("Entry {} has no task to {action}.", index + 1));
        }

        return entry;
    }

    fn set_status(&mut self, index: usize, status: TaskStatus) {
        if let Some(entry) = self
            .entries
            .get_mut(index)
            .and_then(|entry| return entry.as_assistant_mut())
        {
            entry.status = Some(status);
        }
    }

    pub async fn create_task(&mut self, url: &str, goal: &str) {
        let url = url.trim();
        let goal = goal.trim();
        if url.is_empty() || goal.is_empty() {
            self.error = Some("Both a URL and a goal are required.".to_string());
            return;
        }

        let _guard = self.busy.enter();
        self.error = None;
        self.entries.push(Entry::user(goal));

        let req = CreateTaskRequest {
            url: url.to_string(),
            goal: goal.to_string(),
        };
        tracing::debug!(url = url, goal = goal, "Sending create-task request");

        match self.service.create_task(&req).await {
            Ok(task) => {
                tracing::debug!(task_id = task.task_id, endpoint = task.endpoint, "Task created");
                self.entries
                    .push(Entry::Assistant(AssistantEntry::created(task, goal, url)));
            }
            Err(err) => {
                let message = err.describe(CREATE_FALLBACK);
                tracing::error!(error = ?err, "Failed to create task");
                self.entries.push(Entry::Assistant(AssistantEntry::error(&format!(
                    "Error: {message}"
                ))));
                self.error = Some(message);
            }
        }
    }

    /// Executes the task behind the entry at `index`. Every call appends a new
    /// result or error line, the originating card only keeps the status of the
    /// latest attempt.
    pub async fn run_task(&mut self, index: usize) {
        let Some(entry) = self.task_entry(index, "run") else {
            return;
        };
        let endpoint = entry.endpoint_path.unwrap_or_default();
        let goal = entry.goal.unwrap_or_default();

        let _guard = self.busy.enter();
        self.error = None;
        self.set_status(index, TaskStatus::Running);
        tracing::debug!(endpoint = endpoint, "Running task");

        match self.service.run_task(&endpoint).await {
            Ok(body) => {
                self.entries.push(Entry::Assistant(AssistantEntry::run_result(
                    &goal,
                    pretty_json(&body),
                )));
                self.set_status(index, TaskStatus::Completed);
            }
            Err(err) => {
                let message = err.describe(RUN_FALLBACK);
                tracing::error!(error = ?err, endpoint = endpoint, "Failed to run task");
                self.entries
                    .push(Entry::Assistant(AssistantEntry::run_error(&goal, &message)));
                self.set_status(index, TaskStatus::Error);
                self.error = Some(message);
            }
        }
    }

    /// Makes the entry at `index` the edit target. An unsaved draft for another
    /// entry is dropped without confirmation.
    pub fn start_edit(&mut self, index: usize) {
        let Some(entry) = self.task_entry(index, "edit") else {
            return;
        };

        if let Some(previous) = &self.draft {
            if previous.index() != index {
                tracing::debug!(index = previous.index(), "Abandoning unsaved draft");
            }
        }

        self.draft = Some(EditDraft::new(
            index,
            entry.goal.as_deref().unwrap_or_default(),
            entry.url.as_deref().unwrap_or_default(),
        ));
    }

    pub fn cancel_edit(&mut self) {
        self.draft = None;
    }

    pub async fn save_edit(&mut self) {
        let Some(draft) = self.draft.clone() else {
            return;
        };
        let Some(entry) = self.task_entry(draft.index(), "edit") else {
            return;
        };
        let task_id = entry.task_id.unwrap_or_default();

        let _guard = self.busy.enter();
        self.error = None;

        let patch = TaskPatch::diff(
            entry.goal.as_deref().unwrap_or_default(),
            entry.url.as_deref().unwrap_or_default(),
            &draft.goal,
            &draft.url,
        );
        tracing::debug!(task_id = task_id, patch = ?patch, unchanged = patch.is_empty(), "Updating task");

        match self.service.update_task(&task_id, &patch).await {
            Ok(()) => {
                if let Some(entry) = self
                    .entries
                    .get_mut(draft.index())
                    .and_then(|entry| return entry.as_assistant_mut())
                {
                    entry.goal = Some(draft.goal);
                    entry.url = Some(draft.url);
                }
                self.draft = None;
            }
            Err(err) => {
                tracing::error!(error = ?err, task_id = task_id, "Failed to update task");
                self.error = Some(err.describe(UPDATE_FALLBACK));
            }
        }
    }

    /// Removes the entry at `index` once the service confirmed the delete.
    pub async fn delete_task(&mut self, index: usize) {
        let Some(entry) = self.task_entry(index, "delete") else {
            return;
        };
        let task_id = entry.task_id.unwrap_or_default();

        let _guard = self.busy.enter();
        self.error = None;
        tracing::debug!(task_id = task_id, "Deleting task");

        match self.service.delete_task(&task_id).await {
            Ok(()) => {
                self.entries.remove(index);
                if let Some(draft) = self.draft.as_mut() {
                    if !draft.follow_removal(index) {
                        self.draft = None;
                    }
                }
            }
            Err(err) => {
                tracing::error!(error = ?err, task_id = task_id, "Failed to delete task");
                self.error = Some(err.describe(DELETE_FALLBACK));
            }
        }
    }

    /// Reports what the service currently knows about a task. The card's
    /// local status is left alone.
    pub async fn check_status(&mut self, index: usize) {
        let Some(entry) = self.task_entry(index, "check") else {
            return;
        };
        let task_id = entry.task_id.unwrap_or_default();
        let goal = entry.goal.unwrap_or_default();

        let _guard = self.busy.enter();
        self.error = None;

        match self.service.task_status(&task_id).await {
            Ok(report) => {
                let mut notice =
                    AssistantEntry::info(&format!("Status for \"{goal}\": {}", report.status));
                notice.result = report.result.as_ref().map(pretty_json);
                self.entries.push(Entry::Assistant(notice));
            }
            Err(err) => {
                tracing::error!(error = ?err, task_id = task_id, "Failed to fetch task status");
                self.error = Some(err.describe(STATUS_FALLBACK));
            }
        }
    }
}
