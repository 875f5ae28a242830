//! Cleanup and accept/reject rules for raw recognizer output.
//!
//! The modelled grammar is two or three letters followed by up to five digits,
//! with at most one separating space: six to eight significant characters.

use crate::error::LprError;
use regex::Regex;

/// `X Y...`: a stray letter split off from the rest by a space
const LEADING_NOISE: &str = r"^[A-Za-z] [A-Za-z][A-Za-z0-9 ]*$";
/// `... X`: a stray trailing letter after a space
const TRAILING_NOISE: &str = r"^[A-Za-z0-9 ]* [A-Za-z]$";

/// Length (spaces included) at which the last character is a frame artifact
const ARTIFACT_LENGTH: usize = 9;

pub struct PlateGrammar {
    denied_first: Vec<char>,
    leading_noise: Regex,
    trailing_noise: Regex,
}

impl PlateGrammar {
    pub fn new(denied_first: &[char]) -> Result<Self, LprError> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| LprError::Internal(format!("Failed to compile plate pattern: {}", e)))
        };

        Ok(Self {
            denied_first: denied_first.to_vec(),
            leading_noise: compile(LEADING_NOISE)?,
            trailing_noise: compile(TRAILING_NOISE)?,
        })
    }

    /// Clean `raw` and return it when it reads as a plate
    pub fn validate(&self, raw: &str) -> Option<String> {
        let mut text = raw.trim();

        let starts_with_digit = text.chars().next().is_some_and(|c| c.is_ascii_digit());
        if starts_with_digit || self.leading_noise.is_match(text) {
            text = drop_first(text);
        }

        if text.chars().next().is_some_and(|c| self.denied_first.contains(&c)) {
            text = drop_first(text);
        }

        if text.chars().count() == ARTIFACT_LENGTH || self.trailing_noise.is_match(text) {
            text = drop_last(text);
        }

        let letters = text.chars().filter(|c| c.is_alphabetic()).count();
        let digits = text.chars().filter(|c| c.is_ascii_digit()).count();
        let spaces = text.chars().filter(|c| c.is_whitespace()).count();
        if letters > 5 || digits > 5 || digits < 1 || letters < 2 || spaces >= 2 {
            tracing::debug!(raw, letters, digits, spaces, "plate grammar rejected text");
            return None;
        }

        let significant = text.chars().filter(|c| !c.is_whitespace()).count();
        if significant > 5 && significant < 9 {
            Some(text.to_string())
        } else {
            tracing::debug!(raw, significant, "plate length out of range");
            None
        }
    }
}

fn drop_first(text: &str) -> &str {
    let mut chars = text.chars();
    chars.next();
    chars.as_str().trim()
}

fn drop_last(text: &str) -> &str {
    let mut chars = text.chars();
    chars.next_back();
    chars.as_str().trim()
}
