//! Callback query handler with an optional data pattern.

use std::fmt;
use std::sync::Arc;

use dbot_core::Update;
use regex::Regex;

use super::CheckResult;
use crate::error::RegistrationError;
use crate::regex_match::match_start;

/// How callback data is tested.
#[derive(Clone)]
pub enum CallbackPattern {
    /// Regex matched at the start of the data; the match becomes `context.matches`.
    Regex(Regex),
    /// Arbitrary predicate over the data.
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl fmt::Debug for CallbackPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(re) => f.debug_tuple("Regex").field(&re.as_str()).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Matches updates carrying a callback query. Without a pattern every callback query
/// matches; with one, queries without data never match.
#[derive(Debug, Clone, Default)]
pub struct CallbackQueryHandler {
    pattern: Option<CallbackPattern>,
}

impl CallbackQueryHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `pattern` as a regex pattern.
    pub fn with_pattern(pattern: &str) -> Result<Self, RegistrationError> {
        Ok(Self::with_regex(Regex::new(pattern)?))
    }

    pub fn with_regex(regex: Regex) -> Self {
        Self {
            pattern: Some(CallbackPattern::Regex(regex)),
        }
    }

    pub fn with_predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            pattern: Some(CallbackPattern::Predicate(Arc::new(predicate))),
        }
    }

    pub fn pattern(&self) -> Option<&CallbackPattern> {
        self.pattern.as_ref()
    }

    pub(crate) fn check(&self, update: &Update) -> Option<CheckResult> {
        let query = update.callback_query()?;
        let Some(pattern) = &self.pattern else {
            return Some(CheckResult::Matched);
        };
        let data = query.data.as_deref()?;
        match pattern {
            CallbackPattern::Regex(re) => match_start(re, data).map(CheckResult::Regex),
            CallbackPattern::Predicate(predicate) => predicate(data).then_some(CheckResult::Matched),
        }
    }
}
