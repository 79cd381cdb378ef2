#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use thiserror::Error;

const NETWORK_FALLBACK: &str = "Network error occurred";

/// Failures of a single call to the task service. Both kinds are recovered
/// by the session and never bubble past it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskApiError {
    /// The request could not be sent or the response could not be parsed.
    #[error("{0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("request rejected with status {status}")]
    RequestRejected { status: u16, detail: Option<String> },
}

impl TaskApiError {
    pub fn network<S: Into<String>>(message: S) -> TaskApiError {
        return TaskApiError::Network(message.into());
    }

    pub fn rejected(status: u16, body: &str) -> TaskApiError {
        return TaskApiError::RequestRejected {
            status,
            detail: rejection_detail(body),
        };
    }

    pub fn run_rejected(status: u16, body: &str) -> TaskApiError {
        return TaskApiError::RequestRejected {
            status,
            detail: run_rejection_detail(body),
        };
    }

    /// Text shown to the user. Rejections without a readable detail fall back
    /// to the operation specific message.
    pub fn describe(&self, fallback: &str) -> String {
        match self {
            TaskApiError::Network(message) => {
                if message.is_empty() {
                    return NETWORK_FALLBACK.to_string();
                }
                return message.to_string();
            }
            TaskApiError::RequestRejected { detail, .. } => {
                return detail.clone().unwrap_or_else(|| return fallback.to_string());
            }
        }
    }
}

impl From<reqwest::Error> for TaskApiError {
    fn from(err: reqwest::Error) -> TaskApiError {
        return TaskApiError::Network(err.to_string());
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    return Some(trimmed.to_string());
}

/// Pulls a readable message out of an error body. Validation errors arrive as
/// a `detail` list of `{msg}` objects, handled errors as a `detail` string or
/// a `detail.error` string, and some routes answer with a bare `error` field.
pub fn rejection_detail(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;

    if let Some(detail) = value.get("detail") {
        if let Some(items) = detail.as_array() {
            let messages = items
                .iter()
                .filter_map(|item| {
                    if let Some(msg) = item.get("msg").and_then(|msg| return msg.as_str()) {
                        return Some(msg.to_string());
                    }
                    return item.as_str().map(|msg| return msg.to_string());
                })
                .collect::<Vec<String>>();

            return non_empty(&messages.join("; "));
        }

        if let Some(text) = detail.as_str() {
            return non_empty(text);
        }

        if let Some(text) = detail.get("error").and_then(|err| return err.as_str()) {
            return non_empty(text);
        }
    }

    if let Some(text) = value.get("error").and_then(|err| return err.as_str()) {
        return non_empty(text);
    }

    return None;
}

/// Run failures are reported by the scraper itself, so a top-level `error`
/// wins over a `detail` string. Validation lists still come first.
pub fn run_rejection_detail(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;

    let is_validation = value.get("detail").map(|detail| return detail.is_array()) == Some(true);
    if !is_validation {
        if let Some(text) = value
            .get("error")
            .and_then(|err| return err.as_str())
            .and_then(non_empty)
        {
            return Some(text);
        }
    }

    return rejection_detail(body);
}
