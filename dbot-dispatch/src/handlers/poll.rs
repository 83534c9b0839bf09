//! Poll and poll answer handlers.

use dbot_core::Update;

use super::CheckResult;

/// Matches updates carrying a poll state.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollHandler;

impl PollHandler {
    pub(crate) fn check(&self, update: &Update) -> Option<CheckResult> {
        update.poll().map(|_| CheckResult::Matched)
    }
}

/// Matches updates carrying a poll answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollAnswerHandler;

impl PollAnswerHandler {
    pub(crate) fn check(&self, update: &Update) -> Option<CheckResult> {
        update.poll_answer().map(|_| CheckResult::Matched)
    }
}
