/// Keystroke-level edits applied to the inline content input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    Insert(char),
    Backspace,
    Delete,
    MoveLeft,
    MoveRight,
    MoveHome,
    MoveEnd,
    /// Write the buffer back to the node.
    Commit,
    /// Discard the buffer.
    Cancel,
}

/// What the caller should do after an [`InputAction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputOutcome {
    Editing,
    Commit,
    Cancel,
}

/// Text buffer for the node currently being edited.
///
/// The cursor is a char index, so multi-byte input never splits a character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentInput<Id> {
    id: Id,
    buffer: String,
    cursor: usize,
}

impl<Id: Copy> ContentInput<Id> {
    /// Opens an input on `id` with the cursor at the end of `content`.
    pub fn new(id: Id, content: &str) -> Self {
        Self {
            id,
            buffer: content.to_string(),
            cursor: content.chars().count(),
        }
    }

    pub const fn id(&self) -> Id {
        self.id
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn into_buffer(self) -> String {
        self.buffer
    }

    /// Cursor position in chars.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Empties the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    /// Text before and after the cursor.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.buffer.split_at(self.byte_index(self.cursor))
    }

    pub fn apply(&mut self, action: InputAction) -> InputOutcome {
        match action {
            InputAction::Insert(ch) => self.insert(ch),
            InputAction::Backspace => self.backspace(),
            InputAction::Delete => self.delete(),
            InputAction::MoveLeft => self.cursor = self.cursor.saturating_sub(1),
            InputAction::MoveRight => self.cursor = (self.cursor + 1).min(self.char_len()),
            InputAction::MoveHome => self.cursor = 0,
            InputAction::MoveEnd => self.cursor = self.char_len(),
            InputAction::Commit => return InputOutcome::Commit,
            InputAction::Cancel => return InputOutcome::Cancel,
        }
        InputOutcome::Editing
    }

    fn insert(&mut self, ch: char) {
        let at = self.byte_index(self.cursor);
        self.buffer.insert(at, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.buffer.remove(at);
    }

    fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.buffer.remove(at);
        }
    }

    fn char_len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.buffer
            .char_indices()
            .nth(char_idx)
            .map_or(self.buffer.len(), |(idx, _)| idx)
    }
}
