//! Text and URL tokenization.

use std::collections::BTreeSet;

use unicode_segmentation::UnicodeSegmentation;

use crate::config::TokenizerConfig;

const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he",
    "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "my",
    "no", "not", "of", "on", "or", "our", "out", "she", "so", "some", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "to", "up", "us", "was", "we",
    "were", "what", "when", "which", "who", "will", "with", "would", "you", "your",
];

/// URL tokens carrying no signal.
const URL_NOISE: &[&str] = &["www", "http", "https", "html", "htm", "php", "index"];

/// Turns raw text into normalized index tokens.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Create a tokenizer.
    pub fn new(config: TokenizerConfig) -> Self {
        Self { config }
    }

    /// Body/title tokens: Unicode words, lower-cased, filtered.
    pub fn tokenize(&self, text: &str) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for word in text.unicode_words() {
            let token = word.to_lowercase();
            if self.keep(&token) && !is_numeric(&token) {
                out.insert(token);
            }
            if self.config.max_terms > 0 && out.len() >= self.config.max_terms {
                break;
            }
        }
        out
    }

    /// URL tokens: host labels and path segments split on any non-alphanumeric.
    pub fn tokenize_url(&self, host: &str, path: &str) -> BTreeSet<String> {
        let split = |c: char| !c.is_alphanumeric();
        host.split(split)
            .chain(path.split(split))
            .map(str::to_lowercase)
            .filter(|t| !URL_NOISE.contains(&t.as_str()))
            .filter(|t| self.keep(t))
            .collect()
    }

    fn keep(&self, token: &str) -> bool {
        let len = token.chars().count();
        if len < self.config.min_token_length || len > self.config.max_token_length {
            return false;
        }
        !(self.config.remove_stopwords && STOPWORDS.contains(&token))
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(TokenizerConfig::default())
    }
}

fn is_numeric(token: &str) -> bool {
    token.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_lowercases_and_dedups() {
        let tokens = Tokenizer::default().tokenize("Rust rust RUST programming");
        let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
        assert_eq!(tokens, vec!["programming", "rust"]);
    }

    #[test]
    fn test_stopwords_and_numbers_dropped() {
        let tokens = Tokenizer::default().tokenize("the 2024 release of the compiler");
        assert!(!tokens.contains("the"));
        assert!(!tokens.contains("2024"));
        assert!(tokens.contains("compiler"));
    }

    #[test]
    fn test_stopwords_kept_when_disabled() {
        let tok = Tokenizer::new(TokenizerConfig {
            remove_stopwords: false,
            ..Default::default()
        });
        assert!(tok.tokenize("the cat").contains("the"));
    }

    #[test]
    fn test_max_terms_caps_output() {
        let tok = Tokenizer::new(TokenizerConfig {
            max_terms: 2,
            ..Default::default()
        });
        assert_eq!(tok.tokenize("alpha beta gamma delta").len(), 2);
    }

    #[test]
    fn test_url_tokens() {
        let tokens = Tokenizer::default().tokenize_url("blog.example.com", "/posts/async-rust.html");
        assert!(tokens.contains("blog"));
        assert!(tokens.contains("example"));
        assert!(tokens.contains("com"));
        assert!(tokens.contains("async"));
        assert!(tokens.contains("rust"));
        assert!(!tokens.contains("html"));
    }
}
