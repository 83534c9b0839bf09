//! Handlers for raw string events (not Bot API updates).

use regex::Regex;

use super::CheckResult;
use crate::error::RegistrationError;
use crate::event::Event;
use crate::regex_match::match_start;

/// Matches text events of the form `/command arg1 arg2`; args are split on single spaces.
#[derive(Debug, Clone)]
pub struct StringCommandHandler {
    command: String,
}

impl StringCommandHandler {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub(crate) fn check(&self, event: &Event) -> Option<CheckResult> {
        let rest = event.text()?.strip_prefix('/')?;
        let mut parts = rest.split(' ');
        if parts.next()? != self.command {
            return None;
        }
        Some(CheckResult::StringArgs(parts.map(str::to_string).collect()))
    }
}

/// Matches text events with a regex anchored at the start.
#[derive(Debug, Clone)]
pub struct StringRegexHandler {
    pattern: Regex,
}

impl StringRegexHandler {
    pub fn new(pattern: &str) -> Result<Self, RegistrationError> {
        Ok(Self::with_regex(Regex::new(pattern)?))
    }

    pub fn with_regex(pattern: Regex) -> Self {
        Self { pattern }
    }

    pub(crate) fn check(&self, event: &Event) -> Option<CheckResult> {
        match_start(&self.pattern, event.text()?).map(CheckResult::Regex)
    }
}
