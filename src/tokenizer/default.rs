//! Built-in word and CJK bigram tokenizer

use crate::config::TokenizerConfig;
use crate::tokenizer::Tokenizer;
use crate::{ConfigError, ConfigResult};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Unicode word tokenizer with CJK bigrams
///
/// - text is lowercased
/// - runs of letters and digits form one token each
/// - runs of CJK characters yield overlapping bigrams (a lone character
///   yields itself), plus every user-dictionary word found inside the run
/// - stop words are dropped
#[derive(Debug, Clone, Default)]
pub struct DefaultTokenizer {
    dictionary: HashSet<String>,
    /// Length in chars of the longest dictionary word
    longest_word: usize,
    stop_words: HashSet<String>,
}

impl DefaultTokenizer {
    /// Creates a tokenizer without dictionary or stop words
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the dictionary and stop-word files named in the configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The `[tokenizer]` section, with paths already resolved
    ///
    /// # Returns
    ///
    /// * `Ok(DefaultTokenizer)` - Resources loaded
    /// * `Err(ConfigError)` - A configured file is missing or unreadable
    pub fn from_config(config: &TokenizerConfig) -> ConfigResult<Self> {
        let mut tokenizer = Self::new();

        if let Some(path) = &config.user_dict {
            let words = read_word_list(path)?;
            tracing::debug!(path = %path.display(), words = words.len(), "user dictionary loaded");
            tokenizer = tokenizer.with_dictionary(words);
        }
        if let Some(path) = &config.stop_words {
            let words = read_word_list(path)?;
            tracing::debug!(path = %path.display(), words = words.len(), "stop words loaded");
            tokenizer = tokenizer.with_stop_words(words);
        }

        Ok(tokenizer)
    }

    /// Adds user-dictionary words
    pub fn with_dictionary<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if word.is_empty() {
                continue;
            }
            self.longest_word = self.longest_word.max(word.chars().count());
            self.dictionary.insert(word);
        }
        self
    }

    /// Adds stop words
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.stop_words.extend(
            words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty()),
        );
        self
    }

    fn push(&self, tokens: &mut Vec<String>, token: String) {
        if !self.stop_words.contains(&token) {
            tokens.push(token);
        }
    }

    fn cjk_run(&self, run: &[char], tokens: &mut Vec<String>) {
        if run.len() == 1 {
            self.push(tokens, run[0].to_string());
        } else {
            for pair in run.windows(2) {
                self.push(tokens, pair.iter().collect());
            }
        }

        // Dictionary words of three or more chars; two-char ones are already bigrams
        if self.longest_word < 3 {
            return;
        }
        for start in 0..run.len() {
            let max_len = self.longest_word.min(run.len() - start);
            for len in 3..=max_len {
                let candidate: String = run[start..start + len].iter().collect();
                if self.dictionary.contains(&candidate) {
                    self.push(tokens, candidate);
                }
            }
        }
    }
}

impl Tokenizer for DefaultTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut word = String::new();
        let mut cjk: Vec<char> = Vec::new();

        for c in text.chars().flat_map(char::to_lowercase) {
            if is_cjk(c) {
                if !word.is_empty() {
                    self.push(&mut tokens, std::mem::take(&mut word));
                }
                cjk.push(c);
            } else {
                if !cjk.is_empty() {
                    self.cjk_run(&cjk, &mut tokens);
                    cjk.clear();
                }
                if c.is_alphanumeric() {
                    word.push(c);
                } else if !word.is_empty() {
                    self.push(&mut tokens, std::mem::take(&mut word));
                }
            }
        }

        if !word.is_empty() {
            self.push(&mut tokens, word);
        }
        if !cjk.is_empty() {
            self.cjk_run(&cjk, &mut tokens);
        }

        tokens
    }
}

/// Returns true for CJK ideographs, kana and hangul syllables
pub fn is_cjk(c: char) -> bool {
    matches!(
        c as u32,
        0x3040..=0x30FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xF900..=0xFAFF
            | 0xAC00..=0xD7AF
            | 0x20000..=0x2A6DF
    )
}

/// Reads a word list: one entry per line, `#` comments, first field only
fn read_word_list(path: &Path) -> ConfigResult<Vec<String>> {
    if !path.is_file() {
        return Err(ConfigError::MissingResource(format!(
            "word list not found: {}",
            path.display()
        )));
    }
    let content = fs::read_to_string(path)?;
    Ok(parse_word_list(&content))
}

fn parse_word_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect()
}
