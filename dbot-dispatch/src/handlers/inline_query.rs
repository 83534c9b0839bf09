//! Inline query handler.

use dbot_core::{ChatType, Update};
use regex::Regex;

use super::CheckResult;
use crate::error::RegistrationError;
use crate::regex_match::match_start;

/// Matches updates carrying an inline query, optionally narrowed by a regex on the query
/// text (matched at the start; empty queries never match a pattern) and by the type of the
/// chat the query was sent from.
#[derive(Debug, Clone, Default)]
pub struct InlineQueryHandler {
    pattern: Option<Regex>,
    chat_types: Option<Vec<ChatType>>,
}

impl InlineQueryHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, RegistrationError> {
        self.pattern = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn with_chat_types(mut self, chat_types: Vec<ChatType>) -> Self {
        self.chat_types = Some(chat_types);
        self
    }

    pub(crate) fn check(&self, update: &Update) -> Option<CheckResult> {
        let query = update.inline_query()?;
        if let Some(types) = &self.chat_types {
            if !query.chat_type.is_some_and(|t| types.contains(&t)) {
                return None;
            }
        }
        match &self.pattern {
            None => Some(CheckResult::Matched),
            Some(_) if query.query.is_empty() => None,
            Some(re) => match_start(re, &query.query).map(CheckResult::Regex),
        }
    }
}
