use regex::Regex;
use std::sync::LazyLock;

static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence pattern is valid"));

pub const SENTENCE_CHUNK_LIMIT: usize = 400;

pub trait RecursiveTextSplitter {
    fn split_text(&self, text: &str) -> Vec<String>;
}

/// Recursive character splitter. Each chunk after the first starts with the
/// tail of the previous one, up to `chunk_overlap` bytes cut at a word boundary.
#[derive(Debug, Clone)]
pub struct RTSplitter {
    separators: Vec<&'static str>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for RTSplitter {
    fn default() -> Self {
        Self::new(2000, 800)
    }
}

impl RecursiveTextSplitter for RTSplitter {
    fn split_text(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if text.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let base_size = if self.chunk_overlap == 0 {
            self.chunk_size
        } else {
            self.chunk_size.saturating_sub(self.chunk_overlap + 1).max(1)
        };
        let base_chunks: Vec<String> = self
            .recursive_split(text, base_size, 0)
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if self.chunk_overlap == 0 {
            return base_chunks;
        }

        let mut chunks = Vec::with_capacity(base_chunks.len());
        for (i, chunk) in base_chunks.iter().enumerate() {
            if i == 0 {
                chunks.push(chunk.clone());
                continue;
            }

            let overlap = tail_at_word_boundary(&base_chunks[i - 1], self.chunk_overlap);
            if overlap.is_empty() {
                chunks.push(chunk.clone());
            } else {
                chunks.push(format!("{} {}", overlap, chunk));
            }
        }

        chunks
    }
}

impl RTSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            separators: vec!["\n\n", "\n", " ", ""],
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size / 2),
        }
    }

    fn split_by_length(&self, text: &str, max_chunk_size: usize) -> Vec<String> {
        let mut chunks = Vec::new();
        let chars: Vec<char> = text.chars().collect();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + max_chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            start = end;
        }

        chunks
    }

    fn recursive_split(
        &self,
        text: &str,
        max_chunk_size: usize,
        separator_index: usize,
    ) -> Vec<String> {
        if text.len() <= max_chunk_size {
            return vec![text.to_string()];
        }

        if separator_index >= self.separators.len() {
            return self.split_by_length(text, max_chunk_size);
        }

        let separator = self.separators[separator_index];

        if separator.is_empty() {
            return self.split_by_length(text, max_chunk_size);
        }

        let parts: Vec<&str> = text.split(separator).collect();

        if parts.len() == 1 {
            return self.recursive_split(text, max_chunk_size, separator_index + 1);
        }

        let mut chunks = Vec::new();
        let mut current_chunk = String::new();

        for part in parts {
            let candidate = if current_chunk.is_empty() {
                part.to_string()
            } else {
                format!("{}{}{}", current_chunk, separator, part)
            };

            if candidate.len() <= max_chunk_size {
                current_chunk = candidate;
                continue;
            }

            if !current_chunk.is_empty() {
                chunks.push(std::mem::take(&mut current_chunk));
            }
            current_chunk = part.to_string();

            if current_chunk.len() > max_chunk_size {
                chunks.extend(self.recursive_split(
                    &current_chunk,
                    max_chunk_size,
                    separator_index + 1,
                ));
                current_chunk.clear();
            }
        }

        if !current_chunk.is_empty() {
            chunks.push(current_chunk);
        }

        chunks
    }
}

/// Last `max_len` bytes of `text`, starting after a whitespace so no word is cut.
fn tail_at_word_boundary(text: &str, max_len: usize) -> &str {
    if text.len() <= max_len {
        return text;
    }

    let mut start = text.len() - max_len;
    while !text.is_char_boundary(start) {
        start += 1;
    }

    let tail = &text[start..];
    match tail.find(char::is_whitespace) {
        Some(pos) => tail[pos..].trim_start(),
        None => tail,
    }
}

/// Groups sentences into chunks shorter than `SENTENCE_CHUNK_LIMIT` characters.
pub fn sentence_chunks(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        sentences.push(&text[start..boundary.start() + 1]);
        start = boundary.end();
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }

    let mut chunks = Vec::new();
    let mut chunk = String::new();
    for sentence in sentences {
        if chunk.chars().count() + sentence.chars().count() < SENTENCE_CHUNK_LIMIT {
            chunk.push_str(sentence);
            chunk.push(' ');
        } else {
            if !chunk.trim().is_empty() {
                chunks.push(chunk.trim().to_string());
            }
            chunk = format!("{} ", sentence);
        }
    }
    if !chunk.trim().is_empty() {
        chunks.push(chunk.trim().to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_splitting() {
        let splitter = RTSplitter::new(30, 0);
        let text = "This is a test.\n\nThis is another paragraph.\n\nAnd a third one.";
        let chunks = splitter.split_text(text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 30);
        }
    }

    #[test]
    fn test_overlap_repeats_previous_tail() {
        let splitter = RTSplitter::new(40, 15);
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu nu xi omicron pi rho sigma";
        let chunks = splitter.split_text(text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 40, "chunk too long: {:?}", chunk);
        }

        for pair in chunks.windows(2) {
            let first_word_of_next = pair[1].split_whitespace().next().unwrap();
            assert!(pair[0].contains(first_word_of_next));
        }
    }

    #[test]
    fn test_short_text() {
        let splitter = RTSplitter::default();
        let chunks = splitter.split_text("Short text");

        assert_eq!(chunks, vec!["Short text".to_string()]);
        assert!(splitter.split_text("   ").is_empty());
    }

    #[test]
    fn test_tail_respects_word_boundary() {
        assert_eq!(tail_at_word_boundary("hello brave new world", 9), "world");
        assert_eq!(tail_at_word_boundary("tiny", 9), "tiny");
    }

    #[test]
    fn test_sentence_chunks() {
        let sentence = "The keynote starts at nine in the main hall.";
        let text = vec![sentence; 20].join(" ");
        let chunks = sentence_chunks(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() < SENTENCE_CHUNK_LIMIT);
            assert!(chunk.ends_with('.'));
        }
        assert_eq!(sentence_chunks("One line. Two lines!"), vec!["One line. Two lines!"]);
    }
}
