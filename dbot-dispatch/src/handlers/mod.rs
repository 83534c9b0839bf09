//! Handlers: "does this event match, and how do I invoke my callback".
//!
//! A [`Handler`] pairs one matcher from the closed [`HandlerKind`] family with a
//! [`Callback`] and a `block` flag. The dispatcher calls [`Handler::check_update`] for each
//! handler of a group until one returns `Some`, then [`Handler::handle_update`] on that one.
//!
//! # Entry points
//!
//! - **[`Handler::new`]** – builds a handler from any variant plus a callback; blocking by default.
//! - **[`Handler::non_blocking`]** – runs the callback as a tracked task instead of inline.

mod callback;
mod callback_query;
mod chat_member;
mod command;
mod inline_query;
mod message;
mod poll;
mod string;
mod type_handler;

use std::fmt;

use futures::future::BoxFuture;

pub use callback::{Callback, Flow, HandlerResult, LegacyArgs, LegacyOptions};
pub use callback_query::{CallbackPattern, CallbackQueryHandler};
pub use chat_member::{ChatMemberHandler, ChatMemberMode};
pub use command::{CommandHandler, HasArgs, PrefixHandler};
pub use inline_query::InlineQueryHandler;
pub use message::MessageHandler;
pub use poll::{PollAnswerHandler, PollHandler};
pub use string::{StringCommandHandler, StringRegexHandler};
pub use type_handler::TypeHandler;

use crate::context::CallbackContext;
use crate::event::Event;
use crate::regex_match::RegexMatch;

/// Evidence returned by a successful [`Handler::check_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    /// Matched, nothing to hand over.
    Matched,
    /// Command-style match: tokens after the command plus filter regex matches.
    Args {
        args: Vec<String>,
        matches: Vec<RegexMatch>,
    },
    /// String command match: tokens after the command.
    StringArgs(Vec<String>),
    /// A single regex match (callback data, inline query, raw string).
    Regex(RegexMatch),
    /// Filter match with the regex matches the filter produced.
    Filter(Vec<RegexMatch>),
}

impl CheckResult {
    fn args(&self) -> Option<&[String]> {
        match self {
            Self::Args { args, .. } | Self::StringArgs(args) => Some(args),
            _ => None,
        }
    }

    fn first_match(&self) -> Option<&RegexMatch> {
        match self {
            Self::Regex(m) => Some(m),
            Self::Args { matches, .. } | Self::Filter(matches) => matches.first(),
            _ => None,
        }
    }
}

/// The closed set of matching strategies.
#[derive(Debug, Clone)]
pub enum HandlerKind {
    Command(CommandHandler),
    Prefix(PrefixHandler),
    Message(MessageHandler),
    CallbackQuery(CallbackQueryHandler),
    InlineQuery(InlineQueryHandler),
    ChatMember(ChatMemberHandler),
    Type(TypeHandler),
    StringCommand(StringCommandHandler),
    StringRegex(StringRegexHandler),
    Poll(PollHandler),
    PollAnswer(PollAnswerHandler),
}

impl HandlerKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Command(_) => "CommandHandler",
            Self::Prefix(_) => "PrefixHandler",
            Self::Message(_) => "MessageHandler",
            Self::CallbackQuery(_) => "CallbackQueryHandler",
            Self::InlineQuery(_) => "InlineQueryHandler",
            Self::ChatMember(_) => "ChatMemberHandler",
            Self::Type(_) => "TypeHandler",
            Self::StringCommand(_) => "StringCommandHandler",
            Self::StringRegex(_) => "StringRegexHandler",
            Self::Poll(_) => "PollHandler",
            Self::PollAnswer(_) => "PollAnswerHandler",
        }
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(impl From<$ty> for HandlerKind {
            fn from(handler: $ty) -> Self {
                Self::$variant(handler)
            }
        })*
    };
}

impl_from_variant! {
    Command => CommandHandler,
    Prefix => PrefixHandler,
    Message => MessageHandler,
    CallbackQuery => CallbackQueryHandler,
    InlineQuery => InlineQueryHandler,
    ChatMember => ChatMemberHandler,
    Type => TypeHandler,
    StringCommand => StringCommandHandler,
    StringRegex => StringRegexHandler,
    Poll => PollHandler,
    PollAnswer => PollAnswerHandler,
}

/// A matcher bound to a callback. Immutable once registered; identity (for registration and
/// removal) is the `Arc` the application stores.
#[derive(Clone)]
pub struct Handler {
    kind: HandlerKind,
    callback: Callback,
    block: bool,
}

impl Handler {
    pub fn new(kind: impl Into<HandlerKind>, callback: Callback) -> Self {
        Self {
            kind: kind.into(),
            callback,
            block: true,
        }
    }

    /// Run the callback as an independently tracked task; dispatch moves on immediately.
    pub fn non_blocking(self) -> Self {
        self.with_block(false)
    }

    pub fn with_block(mut self, block: bool) -> Self {
        self.block = block;
        self
    }

    pub fn block(&self) -> bool {
        self.block
    }

    pub fn kind(&self) -> &HandlerKind {
        &self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Side-effect-free match test. `None` means "not mine, try the next handler".
    pub fn check_update(&self, event: &Event, bot_username: Option<&str>) -> Option<CheckResult> {
        match &self.kind {
            HandlerKind::Type(h) => h.check(event),
            HandlerKind::StringCommand(h) => h.check(event),
            HandlerKind::StringRegex(h) => h.check(event),
            kind => {
                let update = event.update()?;
                match kind {
                    HandlerKind::Command(h) => h.check(update, bot_username),
                    HandlerKind::Prefix(h) => h.check(update),
                    HandlerKind::Message(h) => h.check(update),
                    HandlerKind::CallbackQuery(h) => h.check(update),
                    HandlerKind::InlineQuery(h) => h.check(update),
                    HandlerKind::ChatMember(h) => h.check(update),
                    HandlerKind::Poll(h) => h.check(update),
                    HandlerKind::PollAnswer(h) => h.check(update),
                    HandlerKind::Type(_)
                    | HandlerKind::StringCommand(_)
                    | HandlerKind::StringRegex(_) => None,
                }
            }
        }
    }

    /// Copies match evidence into the context's transient fields.
    pub fn collect_additional_context(&self, context: &mut CallbackContext, check: &CheckResult) {
        match check {
            CheckResult::Matched => {}
            CheckResult::Args { args, matches } => {
                context.args = Some(args.clone());
                context.matches = matches.clone();
            }
            CheckResult::StringArgs(args) => context.args = Some(args.clone()),
            CheckResult::Regex(m) => context.matches = vec![m.clone()],
            CheckResult::Filter(matches) => context.matches = matches.clone(),
        }
    }

    /// Builds the value set for the legacy calling convention.
    pub fn collect_optional_args(
        &self,
        context: &CallbackContext,
        check: &CheckResult,
        options: &LegacyOptions,
    ) -> LegacyArgs {
        let first_match = check.first_match();
        LegacyArgs {
            bot: context.bot(),
            update_queue: options.pass_update_queue.then(|| context.update_queue()),
            user_data: options.pass_user_data.then(|| context.user_data()).flatten(),
            chat_data: options.pass_chat_data.then(|| context.chat_data()).flatten(),
            args: options
                .pass_args
                .then(|| check.args().map(<[String]>::to_vec))
                .flatten(),
            groups: options
                .pass_groups
                .then(|| first_match.map(|m| m.groups().to_vec()))
                .flatten(),
            groupdict: options
                .pass_groupdict
                .then(|| first_match.map(|m| m.groupdict().clone()))
                .flatten(),
        }
    }

    /// Prepares the context and returns the callback's future. The future owns everything
    /// it needs, so the dispatcher may await it inline or spawn it.
    pub fn handle_update(
        &self,
        event: Event,
        check: CheckResult,
        mut context: CallbackContext,
    ) -> BoxFuture<'static, HandlerResult> {
        self.collect_additional_context(&mut context, &check);
        match &self.callback {
            Callback::Context(f) => f(event, context),
            Callback::Legacy { options, f } => {
                let args = self.collect_optional_args(&context, &check, options);
                f(event, args)
            }
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("kind", &self.kind)
            .field("block", &self.block)
            .field("legacy", &self.callback.is_legacy())
            .finish()
    }
}
