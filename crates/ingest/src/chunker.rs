//! Overlapping character-window chunking.

/// Splits text into overlapping windows of at most `chunk_size` characters.
///
/// Each window prefers to end just after a sentence (`.`, `!`, `?` followed
/// by whitespace) in its last fifth, then on any whitespace, and only cuts
/// mid-word when neither exists. The next window starts `overlap`
/// characters before the previous cut.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let mut end = (start + self.chunk_size).min(total);
            if end < total {
                end = find_break(&chars, start, end);
            }

            let chunk: String = chars[start..end].iter().collect();
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            if end >= total {
                break;
            }
            start = end.saturating_sub(self.overlap).max(start + 1);
        }

        chunks
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

/// Exclusive cut index within `chars[start..end]`.
fn find_break(chars: &[char], start: usize, end: usize) -> usize {
    let floor = end - (end - start) / 5;

    let sentence_end = (floor..end)
        .rev()
        .find(|&i| i > start && chars[i].is_whitespace() && matches!(chars[i - 1], '.' | '!' | '?'));
    if let Some(i) = sentence_end {
        return i;
    }

    (floor..end)
        .rev()
        .find(|&i| i > start && chars[i].is_whitespace())
        .unwrap_or(end)
}
