//! Line framing over decoded text.
//!
//! Accumulates text and yields complete `\n`-terminated lines. The
//! unterminated tail stays buffered until more text arrives or the stream
//! ends. Carriage returns are left in place; the classifier trims them.

/// Accumulator for decoded-but-unterminated text.
///
/// Invariant: `buffer` never contains a `\n`.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: String,
}

impl LineFramer {
    /// Create an empty framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and return every line it completes, in order.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buffer.push_str(text);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };

        let complete: String = self.buffer.drain(..=last_newline).collect();
        // `complete` ends with '\n', so the final split element is always empty
        let mut lines: Vec<String> = complete.split('\n').map(str::to_string).collect();
        lines.pop();
        lines
    }

    /// Take the residual partial line at end of stream, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    /// The currently buffered partial line.
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}
