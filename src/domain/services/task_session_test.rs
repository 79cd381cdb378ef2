use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use mockito::Matcher;
use serde_json::json;
use test_utils::created_task_body;
use test_utils::scrape_result_fixture;
use test_utils::server_error_body;
use test_utils::validation_error_body;
use tokio::sync::Notify;

use super::TaskSession;
use crate::domain::models::AssistantEntry;
use crate::domain::models::CreateTaskRequest;
use crate::domain::models::CreatedTask;
use crate::domain::models::Entry;
use crate::domain::models::MessageType;
use crate::domain::models::TaskApiError;
use crate::domain::models::TaskPatch;
use crate::domain::models::TaskService;
use crate::domain::models::TaskStatus;
use crate::domain::models::TaskStatusReport;
use crate::infrastructure::task_api::http::HttpTaskService;

fn session_for(url: &str) -> TaskSession {
    let service = HttpTaskService::new(url, Duration::from_secs(5), Duration::from_millis(200));
    return TaskSession::new(Box::new(service));
}

fn created_entry(task_id: &str, goal: &str, url: &str) -> Entry {
    return Entry::Assistant(AssistantEntry::created(
        CreatedTask {
            task_id: task_id.to_string(),
            endpoint: format!("/run-task/{task_id}"),
        },
        goal,
        url,
    ));
}

fn session_with_tasks(url: &str) -> TaskSession {
    let mut session = session_for(url);
    session.entries = vec![
        Entry::user("goal A"),
        created_entry("t1", "goal A", "https://x"),
        Entry::user("goal B"),
        created_entry("t2", "goal B", "https://y"),
    ];

    return session;
}

fn assistant(session: &TaskSession, index: usize) -> &AssistantEntry {
    return session.entries()[index]
        .as_assistant()
        .expect("entry should be an assistant entry");
}

#[tokio::test]
async fn it_creates_tasks() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/create-task/")
        .match_body(Matcher::Json(json!({"url": "https://x", "goal": "goal A"})))
        .with_status(201)
        .with_body(created_task_body("t1"))
        .create();

    let mut session = session_for(&server.url());
    session.create_task(" https://x ", " goal A ").await;

    assert_eq!(session.entries().len(), 2);
    assert_eq!(session.entries()[0], Entry::user("goal A"));

    let entry = assistant(&session, 1);
    assert_eq!(entry.text, "Created endpoint for goal: \"goal A\"");
    assert_eq!(entry.task_id.as_deref(), Some("t1"));
    assert_eq!(entry.endpoint_path.as_deref(), Some("/run-task/t1"));
    assert_eq!(entry.goal.as_deref(), Some("goal A"));
    assert_eq!(entry.url.as_deref(), Some("https://x"));
    assert_eq!(entry.status, Some(TaskStatus::Created));
    assert_eq!(session.error(), None);
    assert!(!session.is_busy());
    mock.assert();
}

#[tokio::test]
async fn it_records_rejected_creates_inline() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/create-task/")
        .with_status(422)
        .with_body(validation_error_body(&["url required"]))
        .create();

    let mut session = session_for(&server.url());
    session.create_task("https://x", "goal A").await;

    assert_eq!(session.entries().len(), 2);
    let entry = assistant(&session, 1);
    assert_eq!(entry.text, "Error: url required");
    assert_eq!(entry.message_type(), MessageType::Error);
    assert_eq!(entry.task_id, None);
    assert_eq!(session.error(), Some("url required"));
    assert!(!session.is_busy());
    mock.assert();
}

#[tokio::test]
async fn it_falls_back_when_rejections_have_no_detail() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/create-task/")
        .with_status(500)
        .with_body("{}")
        .create();

    let mut session = session_for(&server.url());
    session.create_task("https://x", "goal A").await;

    assert_eq!(
        session.error(),
        Some("Failed to create task: Unknown error")
    );
    mock.assert();
}

#[tokio::test]
async fn it_records_network_failures_on_create() {
    let mut session = session_for("http://127.0.0.1:1");
    session.create_task("https://x", "goal A").await;

    assert_eq!(session.entries().len(), 2);
    assert!(!assistant(&session, 1).has_task());
    assert!(session.error().is_some());
    assert!(!session.is_busy());
}

#[tokio::test]
async fn it_refuses_empty_creates() {
    let mut server = mockito::Server::new();
    let mock = server.mock("POST", "/create-task/").expect(0).create();

    let mut session = session_for(&server.url());
    session.create_task("   ", "goal A").await;
    session.create_task("https://x", "").await;

    assert!(session.entries().is_empty());
    assert_eq!(session.error(), Some("Both a URL and a goal are required."));
    mock.assert();
}

#[tokio::test]
async fn it_runs_and_reruns_tasks() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/run-task/t1")
        .with_status(200)
        .with_body(scrape_result_fixture().to_string())
        .expect(2)
        .create();

    let mut session = session_with_tasks(&server.url());
    session.run_task(1).await;
    assert_eq!(session.entries().len(), 5);
    session.run_task(1).await;
    assert_eq!(session.entries().len(), 6);

    let result = assistant(&session, 5);
    assert_eq!(result.text, "Result for \"goal A\":");
    assert_eq!(result.status, Some(TaskStatus::Completed));
    assert_eq!(
        result.result.as_deref(),
        serde_json::to_string_pretty(&scrape_result_fixture()).ok().as_deref()
    );
    assert_eq!(assistant(&session, 1).status, Some(TaskStatus::Completed));
    assert_eq!(assistant(&session, 3).status, Some(TaskStatus::Created));
    assert!(!session.is_busy());
    mock.assert();
}

#[tokio::test]
async fn it_recovers_after_failed_runs() {
    let mut server = mockito::Server::new();
    let failing = server
        .mock("GET", "/run-task/t1")
        .with_status(500)
        .with_body(server_error_body("scraper crashed"))
        .create();

    let mut session = session_with_tasks(&server.url());
    session.run_task(1).await;

    assert_eq!(session.entries().len(), 5);
    assert_eq!(
        assistant(&session, 4).text,
        "Error running \"goal A\": scraper crashed"
    );
    assert_eq!(assistant(&session, 1).status, Some(TaskStatus::Error));
    assert_eq!(session.error(), Some("scraper crashed"));
    failing.assert();
    failing.remove();

    let working = server
        .mock("GET", "/run-task/t1")
        .with_status(200)
        .with_body(scrape_result_fixture().to_string())
        .create();

    session.run_task(1).await;

    assert_eq!(session.entries().len(), 6);
    assert_eq!(assistant(&session, 1).status, Some(TaskStatus::Completed));
    assert_eq!(session.error(), None);
    working.assert();
}

#[tokio::test]
async fn it_marks_runs_failed_when_the_service_is_unreachable() {
    let mut session = session_with_tasks("http://127.0.0.1:1");
    session.run_task(1).await;

    assert_eq!(session.entries().len(), 5);
    let entry = assistant(&session, 4);
    assert_eq!(entry.message_type(), MessageType::Error);
    assert!(entry.text.starts_with("Error running \"goal A\": "));
    assert_eq!(assistant(&session, 1).status, Some(TaskStatus::Error));
    assert!(session.error().is_some());
    assert!(!session.is_busy());
}

#[tokio::test]
async fn it_refuses_to_run_entries_without_tasks() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", Matcher::Any).expect(0).create();

    let mut session = session_with_tasks(&server.url());
    session.run_task(0).await;
    session.run_task(42).await;

    assert_eq!(session.entries().len(), 4);
    assert_eq!(session.error(), Some("Entry 43 has no task to run."));
    mock.assert();
}

#[tokio::test]
async fn it_saves_edits_with_only_changed_fields() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("PATCH", "/update-task/t1")
        .match_body(Matcher::Json(json!({"goal": "goal C"})))
        .with_status(200)
        .with_body(r#"{"message": "Task updated."}"#)
        .create();

    let mut session = session_with_tasks(&server.url());
    session.start_edit(1);

    let draft = session.draft_mut().expect("draft should be open");
    assert_eq!(draft.goal, "goal A");
    assert_eq!(draft.url, "https://x");
    draft.goal = "goal C".to_string();

    session.save_edit().await;

    let entry = assistant(&session, 1);
    assert_eq!(entry.goal.as_deref(), Some("goal C"));
    assert_eq!(entry.url.as_deref(), Some("https://x"));
    assert_eq!(entry.task_id.as_deref(), Some("t1"));
    assert_eq!(session.draft(), None);
    assert_eq!(session.error(), None);
    mock.assert();
}

#[tokio::test]
async fn it_keeps_the_draft_when_saving_fails() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("PATCH", "/update-task/t1")
        .with_status(404)
        .with_body(r#"{"detail": "Task not found"}"#)
        .create();

    let mut session = session_with_tasks(&server.url());
    session.start_edit(1);
    if let Some(draft) = session.draft_mut() {
        draft.url = "https://z".to_string();
    }

    session.save_edit().await;

    assert_eq!(session.error(), Some("Task not found"));
    assert_eq!(
        session.draft().map(|draft| return draft.url.as_str()),
        Some("https://z")
    );
    assert_eq!(assistant(&session, 1).url.as_deref(), Some("https://x"));
    assert!(!session.is_busy());
    mock.assert();
}

#[tokio::test]
async fn it_cancels_edits_without_requests() {
    let mut server = mockito::Server::new();
    let mock = server.mock("PATCH", Matcher::Any).expect(0).create();

    let mut session = session_with_tasks(&server.url());
    session.start_edit(3);
    if let Some(draft) = session.draft_mut() {
        draft.goal = "changed".to_string();
    }
    session.cancel_edit();

    assert_eq!(session.draft(), None);
    assert_eq!(assistant(&session, 3).goal.as_deref(), Some("goal B"));
    mock.assert();
}

#[test]
fn it_abandons_the_previous_draft_when_editing_another_entry() {
    let mut session = session_with_tasks("http://127.0.0.1:1");
    session.start_edit(1);
    if let Some(draft) = session.draft_mut() {
        draft.goal = "unsaved".to_string();
    }

    session.start_edit(3);

    let draft = session.draft().expect("draft should be open");
    assert_eq!(draft.index(), 3);
    assert_eq!(draft.goal, "goal B");
    assert_eq!(assistant(&session, 1).goal.as_deref(), Some("goal A"));
}

#[tokio::test]
async fn it_deletes_exactly_one_entry() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("DELETE", "/delete-task/t1")
        .with_status(200)
        .with_body(r#"{"message": "Task deleted."}"#)
        .create();

    let mut session = session_with_tasks(&server.url());
    session.start_edit(3);
    session.delete_task(1).await;

    assert_eq!(session.entries().len(), 3);
    assert_eq!(session.entries()[0], Entry::user("goal A"));
    assert_eq!(session.entries()[1], Entry::user("goal B"));
    assert_eq!(session.entries()[2].task_id(), Some("t2"));
    assert_eq!(session.draft().map(|draft| return draft.index()), Some(2));
    assert_eq!(session.error(), None);
    mock.assert();
}

#[tokio::test]
async fn it_drops_the_draft_of_a_deleted_entry() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("DELETE", "/delete-task/t2")
        .with_status(200)
        .create();

    let mut session = session_with_tasks(&server.url());
    session.start_edit(3);
    session.delete_task(3).await;

    assert_eq!(session.entries().len(), 3);
    assert_eq!(session.draft(), None);
    mock.assert();
}

#[tokio::test]
async fn it_keeps_entries_when_deleting_fails() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("DELETE", "/delete-task/t1")
        .with_status(404)
        .with_body(r#"{"detail": "Task not found"}"#)
        .create();

    let mut session = session_with_tasks(&server.url());
    session.delete_task(1).await;

    assert_eq!(session.entries().len(), 4);
    assert_eq!(session.entries()[1].task_id(), Some("t1"));
    assert_eq!(session.error(), Some("Task not found"));

    session.dismiss_error();
    assert_eq!(session.error(), None);
    mock.assert();
}

#[tokio::test]
async fn it_reports_task_status() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/task-status/t2")
        .with_status(200)
        .with_body(
            json!({
                "task_id": "t2",
                "status": "modified",
                "url": "https://y",
                "goal": "goal B",
            })
            .to_string(),
        )
        .create();

    let mut session = session_with_tasks(&server.url());
    session.check_status(3).await;

    assert_eq!(session.entries().len(), 5);
    let notice = assistant(&session, 4);
    assert_eq!(notice.text, "Status for \"goal B\": modified");
    assert_eq!(notice.result, None);
    assert!(!notice.has_task());
    assert_eq!(assistant(&session, 3).status, Some(TaskStatus::Created));
    mock.assert();
}

#[tokio::test]
async fn it_warns_when_the_service_is_unreachable() {
    let mut session = session_for("http://127.0.0.1:1");
    session.check_connection().await;

    assert_eq!(session.entries().len(), 1);
    assert_eq!(
        assistant(&session, 0).message_type(),
        MessageType::Error
    );
}

/// Holds every create call until released.
struct GatedService {
    release: Arc<Notify>,
    fail: bool,
}

#[async_trait]
impl TaskService for GatedService {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn create_task(&self, req: &CreateTaskRequest) -> Result<CreatedTask, TaskApiError> {
        self.release.notified().await;
        if self.fail {
            return Err(TaskApiError::network("connection reset"));
        }

        return Ok(CreatedTask {
            task_id: "t1".to_string(),
            endpoint: format!("/run-task/{}", req.goal.len()),
        });
    }

    #[allow(clippy::implicit_return)]
    async fn run_task(&self, _endpoint_path: &str) -> Result<serde_json::Value, TaskApiError> {
        return Ok(json!({}));
    }

    #[allow(clippy::implicit_return)]
    async fn update_task(&self, _task_id: &str, _patch: &TaskPatch) -> Result<(), TaskApiError> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn delete_task(&self, _task_id: &str) -> Result<(), TaskApiError> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn task_status(&self, task_id: &str) -> Result<TaskStatusReport, TaskApiError> {
        return Ok(TaskStatusReport {
            task_id: task_id.to_string(),
            status: "created".to_string(),
            ..TaskStatusReport::default()
        });
    }
}

async fn busy_while_in_flight(fail: bool) -> Result<TaskSession> {
    let release = Arc::new(Notify::new());
    let session = TaskSession::new(Box::new(GatedService {
        release: Arc::clone(&release),
        fail,
    }));
    let gate = session.busy_gate();
    assert!(!gate.is_busy());

    let handle = tokio::spawn(async move {
        let mut session = session;
        session.create_task("https://x", "goal A").await;
        return session;
    });

    let mut attempts = 0;
    while !gate.is_busy() {
        attempts += 1;
        if attempts > 1000 {
            bail!("busy gate was never raised");
        }
        tokio::task::yield_now().await;
    }

    release.notify_one();
    let session = handle.await?;
    assert!(!gate.is_busy());

    return Ok(session);
}

#[tokio::test]
async fn it_raises_the_busy_gate_while_in_flight() -> Result<()> {
    let session = busy_while_in_flight(false).await?;
    assert_eq!(session.entries().len(), 2);
    assert_eq!(session.error(), None);

    return Ok(());
}

#[tokio::test]
async fn it_lowers_the_busy_gate_after_failures() -> Result<()> {
    let session = busy_while_in_flight(true).await?;
    assert_eq!(session.entries().len(), 2);
    assert_eq!(session.error(), Some("connection reset"));

    return Ok(());
}
