//! Append-only display buffer fed by the fragment stream.

/// Accumulates fragments in producer order. The buffer only ever grows, so
/// each state is a prefix of the next.
#[derive(Debug, Default)]
pub struct StreamRenderer {
    buffer: String,
    fragments: usize,
}

impl StreamRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment. Returns the offset it was appended at, or `None`
    /// for a fragment without text (nothing to redraw).
    pub fn push(&mut self, text: &str) -> Option<usize> {
        if text.is_empty() {
            return None;
        }
        let offset = self.buffer.len();
        self.buffer.push_str(text);
        self.fragments += 1;
        Some(offset)
    }

    #[cfg(test)]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Final text and fragment count.
    pub fn finish(self) -> (String, usize) {
        (self.buffer, self.fragments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_state_extends_the_previous() {
        let mut renderer = StreamRenderer::new();
        let mut previous = String::new();
        for fragment in ["## Candidate", "", " alice\n", "Score: 8", "2/100"] {
            renderer.push(fragment);
            assert!(renderer.buffer().starts_with(&previous));
            previous = renderer.buffer().to_string();
        }
        assert_eq!(previous, "## Candidate alice\nScore: 82/100");
    }

    #[test]
    fn test_offsets_and_empty_fragments() {
        let mut renderer = StreamRenderer::new();
        assert_eq!(renderer.push("héllo"), Some(0));
        assert_eq!(renderer.push(""), None);
        assert_eq!(renderer.push(" world"), Some(6));

        let (text, fragments) = renderer.finish();
        assert_eq!(text, "héllo world");
        assert_eq!(fragments, 2);
    }
}
