use anyhow::{anyhow, Result};
use std::path::Path;

/// Validation utilities for command-line input
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Validate a search word
    pub fn validate_word(word: &str) -> Result<()> {
        let word = word.trim();
        if word.is_empty() {
            return Err(anyhow!("Word cannot be empty"));
        }

        if word.len() > 100 {
            return Err(anyhow!("Word too long (max 100 characters)"));
        }

        if word.chars().any(char::is_control) {
            return Err(anyhow!("Word contains invalid characters"));
        }

        Ok(())
    }

    /// Validate a list of co-occurrence words
    pub fn validate_words(words: &[String]) -> Result<()> {
        if words.is_empty() {
            return Err(anyhow!("At least one word is required"));
        }

        if words.len() > 20 {
            return Err(anyhow!("Too many words (max 20)"));
        }

        words.iter().try_for_each(|w| Self::validate_word(w))
    }

    /// Validate that `year` lies inside the analysis window
    pub fn validate_year(year: i32, (first, last): (i32, i32)) -> Result<()> {
        if !(first..=last).contains(&year) {
            return Err(anyhow!("Year {year} is outside the analysis window {first}-{last}"));
        }

        Ok(())
    }

    /// Validate a top-tags set number
    pub fn validate_set_number(set_number: usize, top_tags: usize, per_set: usize) -> Result<()> {
        let sets = top_tags.div_ceil(per_set.max(1));
        if set_number >= sets {
            return Err(anyhow!("Set number must be between 0 and {}", sets.saturating_sub(1)));
        }

        Ok(())
    }

    /// Validate an output file path
    pub fn validate_file_path(path: &Path) -> Result<()> {
        if path.to_string_lossy().is_empty() {
            return Err(anyhow!("File path cannot be empty"));
        }

        // Check for path traversal attempts
        let path_str = path.to_string_lossy();
        if path_str.contains("..") || path_str.contains('~') {
            return Err(anyhow!("File path contains potentially dangerous characters"));
        }

        // Check path length
        if path_str.len() > 4096 {
            return Err(anyhow!("File path too long (max 4096 characters)"));
        }

        Ok(())
    }

    /// Validate a dataset download URL
    pub fn validate_url(url: &str) -> Result<()> {
        if url.trim().is_empty() {
            return Err(anyhow!("URL cannot be empty"));
        }

        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(anyhow!("Only http and https URLs are supported"));
        }

        if url.len() > 2000 {
            return Err(anyhow!("URL too long"));
        }

        Ok(())
    }

    /// Sanitize text input
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect::<String>()
            .trim()
            .to_string()
    }
}
