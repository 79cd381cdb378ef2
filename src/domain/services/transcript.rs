#[cfg(test)]
#[path = "transcript_test.rs"]
mod tests;

use crate::domain::models::AssistantEntry;
use crate::domain::models::Author;
use crate::domain::models::EditDraft;
use crate::domain::models::Entry;
use crate::domain::models::MessageType;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LineStyle {
    Plain,
    UserHeader,
    AssistantHeader,
    Error,
    Detail,
    Result,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    pub style: LineStyle,
    pub text: String,
}

impl Line {
    pub fn new(style: LineStyle, text: &str) -> Line {
        return Line {
            style,
            text: text.to_string(),
        };
    }
}

/// Word wraps `text` to `line_max_width`, keeping blank lines.
pub fn wrap(text: &str, line_max_width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for full_line in text.split('\n') {
        if full_line.trim().is_empty() {
            lines.push("".to_string());
            continue;
        }

        let mut char_count = 0;
        let mut current_lines: Vec<&str> = vec![];

        for word in full_line.split(' ') {
            if !current_lines.is_empty() && word.len() + char_count + 1 > line_max_width {
                lines.push(current_lines.join(" ").trim_end().to_string());
                current_lines = vec![word];
                char_count = word.len() + 1;
            } else {
                current_lines.push(word);
                char_count += word.len() + 1;
            }
        }
        if !current_lines.is_empty() {
            lines.push(current_lines.join(" ").trim_end().to_string());
        }
    }

    return lines;
}

pub struct Transcript {
    line_max_width: usize,
    username: String,
}

impl Default for Transcript {
    fn default() -> Transcript {
        return Transcript::new(100, &Author::User.to_string());
    }
}

impl Transcript {
    pub fn new(line_max_width: usize, username: &str) -> Transcript {
        return Transcript {
            line_max_width,
            username: username.to_string(),
        };
    }

    fn assistant_lines(&self, entry: &AssistantEntry, lines: &mut Vec<Line>) {
        let text_style = if entry.message_type() == MessageType::Error {
            LineStyle::Error
        } else {
            LineStyle::Plain
        };
        for line in wrap(&entry.text, self.line_max_width) {
            lines.push(Line::new(text_style, &format!("  {line}")));
        }

        if let Some(task_id) = &entry.task_id {
            lines.push(Line::new(LineStyle::Detail, &format!("  task: {task_id}")));
        }
        if let Some(endpoint) = &entry.endpoint_path {
            lines.push(Line::new(
                LineStyle::Detail,
                &format!("  endpoint: {endpoint}"),
            ));
        }
        if entry.has_task() {
            if let Some(url) = &entry.url {
                lines.push(Line::new(LineStyle::Detail, &format!("  url: {url}")));
            }
            if let Some(goal) = &entry.goal {
                lines.push(Line::new(LineStyle::Detail, &format!("  goal: {goal}")));
            }
        }
        if let Some(result) = &entry.result {
            for line in result.split('\n') {
                lines.push(Line::new(LineStyle::Result, &format!("    {line}")));
            }
        }
    }

    /// Lines for the entry at `index`. Entries are numbered from 1 so the
    /// numbers can be typed back into commands.
    pub fn entry_lines(&self, index: usize, entry: &Entry, draft: Option<&EditDraft>) -> Vec<Line> {
        let mut lines = vec![];
        let number = index + 1;

        match entry {
            Entry::User(_) => {
                lines.push(Line::new(
                    LineStyle::UserHeader,
                    &format!("[{number}] {}", self.username),
                ));
                for line in wrap(entry.text(), self.line_max_width) {
                    lines.push(Line::new(LineStyle::Plain, &format!("  {line}")));
                }
            }
            Entry::Assistant(assistant) => {
                let mut header = format!("[{number}] {}", entry.author().to_string());
                if assistant.has_task() {
                    if let Some(status) = assistant.status {
                        header = format!("{header} ({status})");
                    }
                }
                lines.push(Line::new(LineStyle::AssistantHeader, &header));
                self.assistant_lines(assistant, &mut lines);
            }
        }

        if let Some(draft) = draft.filter(|draft| return draft.index() == index) {
            lines.push(Line::new(
                LineStyle::Detail,
                &format!("  editing goal: {}", draft.goal),
            ));
            lines.push(Line::new(
                LineStyle::Detail,
                &format!("  editing url: {}", draft.url),
            ));
        }

        return lines;
    }

    pub fn render(&self, entries: &[Entry], draft: Option<&EditDraft>) -> Vec<Line> {
        return entries
            .iter()
            .enumerate()
            .flat_map(|(idx, entry)| {
                return self.entry_lines(idx, entry, draft);
            })
            .collect();
    }
}
