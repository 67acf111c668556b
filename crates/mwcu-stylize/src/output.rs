/// Append-only output buffer with line-end trimming.
///
/// Each newline appended through [`Output::push`] first truncates the
/// spaces and tabs just before it. Text appended with
/// [`Output::push_verbatim`] is never trimmed afterwards.
#[derive(Debug, Default)]
pub struct Output {
    buf: String,
    protected: usize,
}

impl Output {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: String::with_capacity(capacity),
            protected: 0,
        }
    }

    /// Append ordinary text, trimming horizontal whitespace at line ends.
    pub fn push(&mut self, text: &str) {
        let mut lines = text.split('\n');
        if let Some(first) = lines.next() {
            self.buf.push_str(first);
        }
        for line in lines {
            self.trim_line_end();
            self.buf.push('\n');
            self.buf.push_str(line);
        }
    }

    pub fn push_space(&mut self) {
        self.buf.push(' ');
    }

    /// Append literal text that later trimming must not touch.
    pub fn push_verbatim(&mut self, text: &str) {
        self.buf.push_str(text);
        self.protected = self.buf.len();
    }

    pub fn into_string(self) -> String {
        self.buf
    }

    fn trim_line_end(&mut self) {
        let kept = self.buf[self.protected..]
            .trim_end_matches([' ', '\t'])
            .len();
        self.buf.truncate(self.protected + kept);
    }
}
