//! Filter-based handler for message-like updates.

use dbot_core::Update;

use super::CheckResult;
use crate::filters::Filter;

/// Matches message, edited message, channel post and edited channel post updates whose
/// message passes `filter`. Regex filters contribute `context.matches`.
#[derive(Debug, Clone)]
pub struct MessageHandler {
    filter: Filter,
}

impl MessageHandler {
    pub fn new(filter: Filter) -> Self {
        Self { filter }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub(crate) fn check(&self, update: &Update) -> Option<CheckResult> {
        self.filter.check(update).map(CheckResult::Filter)
    }
}

impl Default for MessageHandler {
    fn default() -> Self {
        Self::new(Filter::All)
    }
}
