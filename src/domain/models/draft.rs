/// Scratch copy of an entry's goal and url while it is being edited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditDraft {
    index: usize,
    pub goal: String,
    pub url: String,
}

impl EditDraft {
    pub fn new(index: usize, goal: &str, url: &str) -> EditDraft {
        return EditDraft {
            index,
            goal: goal.to_string(),
            url: url.to_string(),
        };
    }

    pub fn index(&self) -> usize {
        return self.index;
    }

    /// Keeps the draft attached to the same entry after the entry at
    /// `removed` left the session. Returns false when the draft's own entry
    /// was the one removed.
    pub fn follow_removal(&mut self, removed: usize) -> bool {
        if self.index == removed {
            return false;
        }
        if self.index > removed {
            self.index -= 1;
        }

        return true;
    }
}
