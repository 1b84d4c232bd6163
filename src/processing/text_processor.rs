//! Text normalization and sentence splitting

use regex::Regex;

/// Bullet glyph left behind by common resume templates.
const BULLET_ARTIFACT: char = '\u{f0b7}';

pub struct TextProcessor {
    whitespace_regex: Regex,
    sentence_boundary: Regex,
}

#[derive(Debug, Clone)]
pub struct NormalizedText {
    pub clean_text: String,
    pub sentences: Vec<String>,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        let whitespace_regex = Regex::new(r"\s+").expect("Invalid whitespace regex");
        let sentence_boundary = Regex::new(r"[.!?]\s+").expect("Invalid sentence boundary regex");

        Self {
            whitespace_regex,
            sentence_boundary,
        }
    }

    /// Normalize raw extracted text and split it into sentences.
    pub fn process(&self, text: &str) -> NormalizedText {
        let clean_text = self.clean_text(text);
        let sentences = self.split_sentences(&clean_text);

        NormalizedText {
            clean_text,
            sentences,
        }
    }

    /// Collapse whitespace runs to single spaces, strip bullet artifacts, trim.
    pub fn clean_text(&self, text: &str) -> String {
        let without_bullets = text.replace(BULLET_ARTIFACT, " ");
        self.whitespace_regex
            .replace_all(&without_bullets, " ")
            .trim()
            .to_string()
    }

    /// Split after `.`, `!` or `?` followed by whitespace; empty fragments
    /// are discarded. The boundary characters are ASCII, so the +1 byte
    /// slice below is safe.
    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        let mut sentences = Vec::new();
        let mut start = 0;

        for boundary in self.sentence_boundary.find_iter(text) {
            let end = boundary.start() + 1;
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = boundary.end();
        }

        let tail = text[start..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }

        sentences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_collapse() {
        let processor = TextProcessor::new();
        let cleaned = processor.clean_text("John\n\nDoe\t\tEngineer   at  Acme");
        assert_eq!(cleaned, "John Doe Engineer at Acme");
    }

    #[test]
    fn test_bullet_artifact_removed() {
        let processor = TextProcessor::new();
        let cleaned = processor.clean_text("Skills: \u{f0b7} Python \u{f0b7} Rust");
        assert_eq!(cleaned, "Skills: Python Rust");
    }

    #[test]
    fn test_sentence_splitting() {
        let processor = TextProcessor::new();
        let sentences =
            processor.split_sentences("Senior engineer. Led a team of five! Ship it? Yes.");
        assert_eq!(
            sentences,
            vec!["Senior engineer.", "Led a team of five!", "Ship it?", "Yes."]
        );
    }

    #[test]
    fn test_empty_fragments_discarded() {
        let processor = TextProcessor::new();
        assert!(processor.split_sentences("   ").is_empty());
        assert_eq!(processor.split_sentences("No boundary here"), vec!["No boundary here"]);
    }

    #[test]
    fn test_process_combines_both() {
        let processor = TextProcessor::new();
        let result = processor.process("First   sentence. Second\nsentence.");
        assert_eq!(result.clean_text, "First sentence. Second sentence.");
        assert_eq!(result.sentences, vec!["First sentence.", "Second sentence."]);
    }
}
