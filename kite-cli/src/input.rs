/// How the editor resolves the Enter key, decided once at startup by the
/// keyboard-capability probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Kitty protocol available: Enter inserts a newline, Ctrl+Enter submits.
    MultiLine,
    /// Plain terminal: Enter submits. The modifier distinction collapses
    /// because Ctrl+Enter is indistinguishable from Enter here.
    SingleLine,
}

/// Message editor with a byte-indexed cursor over multi-line text.
pub struct Editor {
    mode: InputMode,
    text: String,
    cursor: usize,
}

impl Editor {
    pub fn new(mode: InputMode) -> Self {
        Self {
            mode,
            text: String::new(),
            cursor: 0,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Extract the trimmed buffer for submission. Empty (or all-whitespace)
    /// buffers submit nothing; a real submission clears the buffer.
    pub fn take_submission(&mut self) -> Option<String> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.text.clear();
        self.cursor = 0;
        Some(text)
    }

    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Insert a line break. Only reachable in multi-line mode; single-line
    /// terminals submit on Enter instead.
    pub fn insert_newline(&mut self) {
        if self.mode == InputMode::MultiLine {
            self.insert_char('\n');
        }
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = self.text[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.text.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            let next = self.text[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.text.len());
            self.text.drain(self.cursor..next);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.text[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.text.len() {
            self.cursor = self.text[self.cursor..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor + i)
                .unwrap_or(self.text.len());
        }
    }

    /// Start of the current line, not of the whole buffer.
    pub fn move_home(&mut self) {
        let before = &self.text[..self.cursor];
        self.cursor = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    }

    /// End of the current line, not of the whole buffer.
    pub fn move_end(&mut self) {
        let after = &self.text[self.cursor..];
        if let Some(pos) = after.find('\n') {
            self.cursor += pos;
        } else {
            self.cursor = self.text.len();
        }
    }

    /// 0-indexed line the cursor is on.
    pub fn cursor_line(&self) -> usize {
        self.text[..self.cursor].matches('\n').count()
    }

    /// Byte column of the cursor within its line.
    pub fn cursor_col(&self) -> usize {
        let before = &self.text[..self.cursor];
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        self.cursor - line_start
    }

    /// Move the cursor up one line, keeping the column where possible.
    pub fn move_up(&mut self) {
        let before = &self.text[..self.cursor];
        let cur_line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        if cur_line_start == 0 {
            return;
        }
        let col = self.cursor - cur_line_start;
        let prev_content = &self.text[..cur_line_start - 1];
        let prev_line_start = prev_content.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let prev_line_len = cur_line_start - 1 - prev_line_start;
        self.cursor = prev_line_start + col.min(prev_line_len);
    }

    /// Move the cursor down one line, keeping the column where possible.
    pub fn move_down(&mut self) {
        let before = &self.text[..self.cursor];
        let cur_line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let col = self.cursor - cur_line_start;
        let after = &self.text[self.cursor..];
        let newline_offset = match after.find('\n') {
            Some(i) => i,
            None => return,
        };
        let next_line_start = self.cursor + newline_offset + 1;
        let next_after = &self.text[next_line_start..];
        let next_line_len = next_after.find('\n').unwrap_or(next_after.len());
        self.cursor = next_line_start + col.min(next_line_len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(editor: &mut Editor, s: &str) {
        for c in s.chars() {
            editor.insert_char(c);
        }
    }

    #[test]
    fn newline_does_not_submit_in_multiline_mode() {
        let mut editor = Editor::new(InputMode::MultiLine);
        typed(&mut editor, "first");
        editor.insert_newline();
        typed(&mut editor, "second");
        assert_eq!(editor.text(), "first\nsecond");
        assert_eq!(editor.cursor_line(), 1);
    }

    #[test]
    fn newline_is_unavailable_in_single_line_mode() {
        let mut editor = Editor::new(InputMode::SingleLine);
        typed(&mut editor, "hello");
        editor.insert_newline();
        assert_eq!(editor.text(), "hello");
    }

    #[test]
    fn submission_trims_and_clears() {
        let mut editor = Editor::new(InputMode::MultiLine);
        typed(&mut editor, "  hello world \n");
        assert_eq!(editor.take_submission().as_deref(), Some("hello world"));
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn whitespace_only_buffer_submits_nothing() {
        let mut editor = Editor::new(InputMode::MultiLine);
        typed(&mut editor, "   \n  ");
        assert!(editor.take_submission().is_none());
    }

    #[test]
    fn cursor_movement_respects_char_boundaries() {
        let mut editor = Editor::new(InputMode::MultiLine);
        typed(&mut editor, "aé");
        editor.backspace();
        assert_eq!(editor.text(), "a");
        editor.move_left();
        editor.delete();
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn vertical_movement_keeps_column() {
        let mut editor = Editor::new(InputMode::MultiLine);
        typed(&mut editor, "long line\nab");
        // Cursor at end of "ab" (col 2); moving up lands on col 2 of line 0.
        editor.move_up();
        assert_eq!(editor.cursor_line(), 0);
        assert_eq!(editor.cursor_col(), 2);
        editor.move_end();
        editor.move_down();
        // Line 1 is shorter; column clamps to its length.
        assert_eq!(editor.cursor_line(), 1);
        assert_eq!(editor.cursor_col(), 2);
    }

    #[test]
    fn home_and_end_are_line_scoped() {
        let mut editor = Editor::new(InputMode::MultiLine);
        typed(&mut editor, "one\ntwo");
        editor.move_home();
        assert_eq!(editor.cursor_line(), 1);
        assert_eq!(editor.cursor_col(), 0);
        editor.move_end();
        assert_eq!(editor.cursor_col(), 3);
    }
}
