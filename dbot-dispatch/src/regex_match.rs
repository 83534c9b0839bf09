//! Owned regex match evidence handed to callbacks via `context.matches`.

use std::collections::HashMap;

use regex::{Captures, Regex};

/// A regex match detached from the matched text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegexMatch {
    /// Group 0 is the whole match; unmatched optional groups are `None`.
    groups: Vec<Option<String>>,
    named: HashMap<String, String>,
}

impl RegexMatch {
    pub fn from_captures(regex: &Regex, captures: &Captures<'_>) -> Self {
        let groups = captures
            .iter()
            .map(|m| m.map(|m| m.as_str().to_string()))
            .collect();
        let named = regex
            .capture_names()
            .flatten()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|m| (name.to_string(), m.as_str().to_string()))
            })
            .collect();
        Self { groups, named }
    }

    /// The whole matched text.
    pub fn as_str(&self) -> &str {
        self.get(0).unwrap_or_default()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }

    pub fn name(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    /// Capture groups after group 0.
    pub fn groups(&self) -> &[Option<String>] {
        self.groups.get(1..).unwrap_or_default()
    }

    pub fn groupdict(&self) -> &HashMap<String, String> {
        &self.named
    }
}

/// Matches only at the start of `text`.
pub(crate) fn match_start(regex: &Regex, text: &str) -> Option<RegexMatch> {
    // Leftmost search: if any match starts at 0, this is it.
    regex
        .captures(text)
        .filter(|c| c.get(0).is_some_and(|m| m.start() == 0))
        .map(|c| RegexMatch::from_captures(regex, &c))
}

/// Matches anywhere in `text`.
pub(crate) fn search(regex: &Regex, text: &str) -> Option<RegexMatch> {
    regex
        .captures(text)
        .map(|c| RegexMatch::from_captures(regex, &c))
}
