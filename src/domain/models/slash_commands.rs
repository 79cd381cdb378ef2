#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
    rest: String,
}

/// `text` without its first word, spacing of the remainder untouched.
fn after_first_word(text: &str) -> &str {
    let text = text.trim_start();
    return text
        .find(char::is_whitespace)
        .map(|idx| return &text[idx..])
        .unwrap_or("");
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .split_whitespace()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args[0].to_string();
        args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
            rest: after_first_word(text).to_string(),
        };
        if cmd.is_quit()
            || cmd.is_help()
            || cmd.is_set_url()
            || cmd.is_run()
            || cmd.is_edit_start()
            || cmd.is_edit_goal()
            || cmd.is_edit_url()
            || cmd.is_save()
            || cmd.is_cancel()
            || cmd.is_delete()
            || cmd.is_status()
            || cmd.is_list()
            || cmd.is_dismiss()
        {
            return Some(cmd);
        }

        return None;
    }

    pub fn looks_like_command(text: &str) -> bool {
        return text.trim_start().starts_with('/');
    }

    /// Entry numbers are shown 1-based in the transcript.
    pub fn entry_index(&self) -> Option<usize> {
        let number = self.args.first()?.parse::<usize>().ok()?;
        if number == 0 {
            return None;
        }

        return Some(number - 1);
    }

    /// Everything after the first `skip` arguments as typed, so goals and
    /// URLs keep their inner spacing.
    pub fn text_from(&self, skip: usize) -> String {
        let mut rest = self.rest.as_str();
        for _ in 0..skip {
            rest = after_first_word(rest);
        }

        return rest.trim().to_string();
    }

    fn is(&self, names: &[&str]) -> bool {
        return names.contains(&self.command.as_str());
    }

    fn first_arg_is(&self, name: &str) -> bool {
        return self.args.first().map(|arg| return arg == name) == Some(true);
    }

    pub fn is_quit(&self) -> bool {
        return self.is(&["/q", "/quit", "/exit"]);
    }

    pub fn is_help(&self) -> bool {
        return self.is(&["/h", "/help"]);
    }

    pub fn is_set_url(&self) -> bool {
        return self.is(&["/u", "/url"]);
    }

    pub fn is_run(&self) -> bool {
        return self.is(&["/r", "/run", "/rerun"]);
    }

    pub fn is_edit_start(&self) -> bool {
        return self.is(&["/e", "/edit"]) && !self.is_edit_goal() && !self.is_edit_url();
    }

    pub fn is_edit_goal(&self) -> bool {
        return self.is(&["/e", "/edit"]) && self.first_arg_is("goal");
    }

    pub fn is_edit_url(&self) -> bool {
        return self.is(&["/e", "/edit"]) && self.first_arg_is("url");
    }

    pub fn is_save(&self) -> bool {
        return self.is(&["/s", "/save"]);
    }

    pub fn is_cancel(&self) -> bool {
        return self.is(&["/cancel"]);
    }

    pub fn is_delete(&self) -> bool {
        return self.is(&["/d", "/delete"]);
    }

    pub fn is_status(&self) -> bool {
        return self.is(&["/st", "/status"]);
    }

    pub fn is_list(&self) -> bool {
        return self.is(&["/ls", "/list"]);
    }

    pub fn is_dismiss(&self) -> bool {
        return self.is(&["/dismiss"]);
    }
}
