#[cfg(test)]
#[path = "repl_test.rs"]
mod tests;

use std::collections::VecDeque;
use std::io::Write;

use anyhow::Result;
use owo_colors::OwoColorize;
use owo_colors::Stream;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;

use crate::domain::models::SlashCommand;
use crate::domain::models::TaskServiceBox;
use crate::domain::services::Line;
use crate::domain::services::LineStyle;
use crate::domain::services::TaskSession;
use crate::domain::services::Transcript;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /url (/u) [URL] - Sets the target URL for new tasks. Any other line you type is a goal and creates a task for the target URL.
- /run (/r, /rerun) [ENTRY_NUMBER] - Runs the task behind an entry and appends its result.
- /edit (/e) [ENTRY_NUMBER] - Starts editing the goal and URL of a task. Starting a new edit drops any unsaved one.
- /edit goal [GOAL] - Changes the goal of the task being edited.
- /edit url [URL] - Changes the URL of the task being edited.
- /save (/s) - Sends the edit to the task service.
- /cancel - Discards the edit.
- /delete (/d) [ENTRY_NUMBER] - Deletes a task.
- /status (/st) [ENTRY_NUMBER] - Shows what the task service knows about a task.
- /list (/ls) - Prints the whole transcript.
- /dismiss - Clears the last error.
- /quit /exit (/q) - Exit Promptly.
- /help (/h) - Provides this help menu.
        "#;

    return text.trim().to_string();
}

#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

const STILL_WORKING: &str = "Still working on the previous request, try again once it finishes.";

fn error_line(text: &str) -> Line {
    return Line::new(LineStyle::Error, text);
}

fn usage(command: &str) -> Vec<Line> {
    return vec![error_line(&format!(
        "Usage: {command} ENTRY_NUMBER. Entry numbers are shown in brackets, /list prints them all."
    ))];
}

/// Line-oriented view over a `TaskSession`. Holds the input form state
/// (target URL) the session itself does not own.
pub struct Repl {
    session: TaskSession,
    transcript: Transcript,
    url: String,
}

impl Repl {
    pub fn new(service: TaskServiceBox, transcript: Transcript) -> Repl {
        return Repl {
            session: TaskSession::new(service),
            transcript,
            url: "".to_string(),
        };
    }

    pub fn session(&self) -> &TaskSession {
        return &self.session;
    }

    pub async fn greet(&mut self) -> Vec<Line> {
        let mut lines = vec![Line::new(
            LineStyle::AssistantHeader,
            "Hey there! Set a target with /url URL, then describe what you want scraped. /help lists every command.",
        )];

        self.session.check_connection().await;
        lines.append(&mut self.changes(0));

        return lines;
    }

    /// New entries from `before` onwards. The error banner is only shown when
    /// nothing was appended, create and run failures already carry it inline.
    fn changes(&self, before: usize) -> Vec<Line> {
        let mut lines = self
            .session
            .entries()
            .iter()
            .enumerate()
            .skip(before)
            .flat_map(|(idx, entry)| {
                return self
                    .transcript
                    .entry_lines(idx, entry, self.session.draft());
            })
            .collect::<Vec<Line>>();

        if lines.is_empty() {
            if let Some(err) = self.session.error() {
                lines.push(error_line(&format!("! {err}")));
            }
        }

        return lines;
    }

    fn entry(&self, index: usize) -> Vec<Line> {
        if let Some(entry) = self.session.entries().get(index) {
            return self
                .transcript
                .entry_lines(index, entry, self.session.draft());
        }

        return vec![];
    }

    async fn handle_command(&mut self, command: SlashCommand) -> Vec<Line> {
        let before = self.session.entries().len();

        if command.is_help() {
            return help_text()
                .split('\n')
                .map(|line| return Line::new(LineStyle::Plain, line))
                .collect();
        }

        if command.is_set_url() {
            let url = command.text_from(0);
            if url.is_empty() {
                return vec![error_line("Usage: /url URL")];
            }
            self.url = url;
            return vec![Line::new(
                LineStyle::Detail,
                &format!("Target URL set to {}", self.url),
            )];
        }

        if command.is_list() {
            if self.session.entries().is_empty() {
                return vec![Line::new(LineStyle::Detail, "No entries yet.")];
            }
            return self
                .transcript
                .render(self.session.entries(), self.session.draft());
        }

        if command.is_dismiss() {
            self.session.dismiss_error();
            return vec![];
        }

        if command.is_edit_goal() || command.is_edit_url() {
            let value = command.text_from(1);
            let Some(draft) = self.session.draft_mut() else {
                return vec![error_line("Start editing an entry with /edit ENTRY_NUMBER first.")];
            };
            if command.is_edit_goal() {
                draft.goal = value;
            } else {
                draft.url = value;
            }
            let index = draft.index();
            return self.entry(index);
        }

        if command.is_save() {
            let Some(index) = self.session.draft().map(|draft| return draft.index()) else {
                return vec![error_line("Nothing is being edited.")];
            };
            self.session.save_edit().await;
            let mut lines = self.entry(index);
            lines.append(&mut self.changes(before));
            return lines;
        }

        if command.is_cancel() {
            self.session.cancel_edit();
            return vec![Line::new(LineStyle::Detail, "Edit cancelled.")];
        }

        let Some(index) = command.entry_index() else {
            return usage(&format!(
                "/{}",
                if command.is_run() {
                    "run"
                } else if command.is_edit_start() {
                    "edit"
                } else if command.is_delete() {
                    "delete"
                } else {
                    "status"
                }
            ));
        };

        if command.is_run() {
            self.session.run_task(index).await;
        } else if command.is_edit_start() {
            self.session.start_edit(index);
            if self.session.draft().map(|draft| return draft.index()) == Some(index) {
                return self.entry(index);
            }
        } else if command.is_delete() {
            let task_id = self
                .session
                .entries()
                .get(index)
                .and_then(|entry| return entry.task_id())
                .unwrap_or_default()
                .to_string();
            self.session.delete_task(index).await;
            if self.session.entries().len() < before {
                return vec![Line::new(
                    LineStyle::Detail,
                    &format!("Deleted task {task_id} (entry {}).", index + 1),
                )];
            }
        } else if command.is_status() {
            self.session.check_status(index).await;
        }

        return self.changes(before);
    }

    pub async fn handle_line(&mut self, input: &str) -> (Outcome, Vec<Line>) {
        let input = input.trim();
        if input.is_empty() {
            return (Outcome::Continue, vec![]);
        }

        if let Some(command) = SlashCommand::parse(input) {
            if command.is_quit() {
                return (Outcome::Quit, vec![]);
            }
            return (Outcome::Continue, self.handle_command(command).await);
        }

        if SlashCommand::looks_like_command(input) {
            return (
                Outcome::Continue,
                vec![error_line(&format!(
                    "Unknown command {input}. Run /help for the list of commands."
                ))],
            );
        }

        if self.url.is_empty() {
            return (
                Outcome::Continue,
                vec![error_line("Set a target URL with /url URL first.")],
            );
        }

        let before = self.session.entries().len();
        let url = self.url.to_string();
        self.session.create_task(&url, input).await;

        return (Outcome::Continue, self.changes(before));
    }
}

fn print_lines<W: Write>(out: &mut W, lines: &[Line]) -> Result<()> {
    for line in lines {
        let text = line.text.as_str();
        match line.style {
            LineStyle::Plain => writeln!(out, "{text}")?,
            LineStyle::UserHeader => writeln!(
                out,
                "{}",
                text.if_supports_color(Stream::Stdout, |t| return t.cyan())
            )?,
            LineStyle::AssistantHeader => writeln!(
                out,
                "{}",
                text.if_supports_color(Stream::Stdout, |t| return t.green())
            )?,
            LineStyle::Error => writeln!(
                out,
                "{}",
                text.if_supports_color(Stream::Stdout, |t| return t.red())
            )?,
            LineStyle::Detail => writeln!(
                out,
                "{}",
                text.if_supports_color(Stream::Stdout, |t| return t.dimmed())
            )?,
            LineStyle::Result => writeln!(
                out,
                "{}",
                text.if_supports_color(Stream::Stdout, |t| return t.yellow())
            )?,
        }
    }

    return Ok(());
}

fn print_prompt<W: Write>(out: &mut W) -> Result<()> {
    write!(out, "> ")?;
    out.flush()?;
    return Ok(());
}

/// Reads lines from `input` until EOF or a quit command, writing everything
/// the session produces to `out`.
pub async fn run<R, W>(repl: &mut Repl, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let gate = repl.session().busy_gate();
    let mut input_lines = input.lines();
    let mut queued: VecDeque<String> = VecDeque::new();
    let mut eof = false;

    let greeting = repl.greet().await;
    print_lines(out, &greeting)?;

    loop {
        let input = match queued.pop_front() {
            Some(input) => input,
            None => {
                if eof {
                    break;
                }
                print_prompt(out)?;
                match input_lines.next_line().await? {
                    Some(input) => input,
                    None => break,
                }
            }
        };

        // Input typed while a request is in flight is refused, never queued
        // behind it.
        let (outcome, lines) = {
            let handled = repl.handle_line(&input);
            tokio::pin!(handled);

            loop {
                tokio::select! {
                    biased;
                    res = &mut handled => break res,
                    line = input_lines.next_line(), if !eof => {
                        match line {
                            Ok(Some(text)) => {
                                if gate.is_busy() {
                                    tracing::debug!(input = text.as_str(), "Refusing input while busy");
                                    print_lines(out, &[Line::new(LineStyle::Detail, STILL_WORKING)])?;
                                } else {
                                    queued.push_back(text);
                                }
                            }
                            _ => eof = true,
                        }
                    }
                }
            }
        };

        tracing::debug!(
            busy = repl.session().is_busy(),
            entries = repl.session().entries().len(),
            "Line handled"
        );
        print_lines(out, &lines)?;
        if outcome == Outcome::Quit {
            break;
        }
    }

    return Ok(());
}

pub async fn start(service: TaskServiceBox) -> Result<()> {
    let mut repl = Repl::new(service, Transcript::default());
    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();

    return run(&mut repl, input, &mut out).await;
}
