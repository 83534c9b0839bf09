//! Command-style handlers: `/command@bot args` and `<prefix><command> args`.

use std::collections::BTreeSet;

use dbot_core::Update;

use super::CheckResult;
use crate::error::RegistrationError;
use crate::filters::{Filter, UpdateTypes};

const MAX_COMMAND_LEN: usize = 32;

/// Constraint on the number of arguments following a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HasArgs {
    /// At least one argument.
    AtLeastOne,
    /// No arguments at all.
    None,
    /// Exactly this many arguments.
    Exactly(usize),
}

impl HasArgs {
    fn accepts(self, count: usize) -> bool {
        match self {
            Self::AtLeastOne => count > 0,
            Self::None => count == 0,
            Self::Exactly(n) => count == n,
        }
    }
}

/// Matches messages whose first entity is a bot command at offset 0 naming one of
/// `commands`. A `@botname` suffix must equal the bot's username (case-insensitive).
#[derive(Debug, Clone)]
pub struct CommandHandler {
    commands: BTreeSet<String>,
    filter: Filter,
    has_args: Option<HasArgs>,
}

impl CommandHandler {
    /// Commands are case-folded to lower case; each must be 1-32 chars of `[a-z0-9_]`.
    pub fn new<I, S>(commands: I) -> Result<Self, RegistrationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let commands = commands
            .into_iter()
            .map(|c| {
                let command = c.as_ref().to_lowercase();
                if is_valid_command(&command) {
                    Ok(command)
                } else {
                    Err(RegistrationError::InvalidCommand(c.as_ref().to_string()))
                }
            })
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self {
            commands,
            filter: Filter::UpdateType(UpdateTypes::Messages),
            has_args: None,
        })
    }

    /// Replaces the default filter (new and edited messages).
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_has_args(mut self, rule: HasArgs) -> Self {
        self.has_args = Some(rule);
        self
    }

    pub fn commands(&self) -> &BTreeSet<String> {
        &self.commands
    }

    pub(crate) fn check(&self, update: &Update, bot_username: Option<&str>) -> Option<CheckResult> {
        let message = update.effective_message()?;
        let entity = message.leading_command_entity()?;
        let text = message.text.as_deref()?;
        let command_text = message.parse_entity(entity)?;
        let command_text = command_text.strip_prefix('/').unwrap_or(&command_text);

        let (name, target) = match command_text.split_once('@') {
            Some((name, target)) => (name, Some(target)),
            None => (command_text, None),
        };
        if !self.commands.contains(&name.to_lowercase()) {
            return None;
        }
        if let Some(target) = target {
            match bot_username {
                Some(username) if target.eq_ignore_ascii_case(username) => {}
                _ => return None,
            }
        }

        let args: Vec<String> = text.split_whitespace().skip(1).map(str::to_string).collect();
        if let Some(rule) = self.has_args {
            if !rule.accepts(args.len()) {
                return None;
            }
        }

        let matches = self.filter.check(update)?;
        Some(CheckResult::Args { args, matches })
    }
}

fn is_valid_command(command: &str) -> bool {
    !command.is_empty()
        && command.len() <= MAX_COMMAND_LEN
        && command
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Matches messages whose first whitespace-separated token equals `prefix + command` for
/// any configured prefix and command (compared lower-cased).
#[derive(Debug, Clone)]
pub struct PrefixHandler {
    prefixes: Vec<String>,
    commands: Vec<String>,
    filter: Filter,
    combined: BTreeSet<String>,
}

impl PrefixHandler {
    pub fn new<P, C, S, T>(prefixes: P, commands: C) -> Self
    where
        P: IntoIterator<Item = S>,
        C: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut handler = Self {
            prefixes: lowered(prefixes),
            commands: lowered(commands),
            filter: Filter::UpdateType(UpdateTypes::Messages),
            combined: BTreeSet::new(),
        };
        handler.rebuild();
        handler
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Every accepted leading token.
    pub fn combined(&self) -> &BTreeSet<String> {
        &self.combined
    }

    pub fn set_prefix<P, S>(&mut self, prefixes: P)
    where
        P: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.prefixes = lowered(prefixes);
        self.rebuild();
    }

    pub fn set_command<C, S>(&mut self, commands: C)
    where
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.commands = lowered(commands);
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.combined = self
            .prefixes
            .iter()
            .flat_map(|p| self.commands.iter().map(move |c| format!("{p}{c}")))
            .collect();
    }

    pub(crate) fn check(&self, update: &Update) -> Option<CheckResult> {
        let text = update.effective_message()?.text.as_deref()?;
        let mut tokens = text.split_whitespace();
        let first = tokens.next()?;
        if !self.combined.contains(&first.to_lowercase()) {
            return None;
        }
        let matches = self.filter.check(update)?;
        Some(CheckResult::Args {
            args: tokens.map(str::to_string).collect(),
            matches,
        })
    }
}

fn lowered<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items.into_iter().map(|s| s.as_ref().to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbot_core::{Chat, ChatType, Message, MessageEntity, MessageEntityKind, UpdateKind, User};

    fn command_update(text: &str) -> Update {
        let len = text.split_whitespace().next().unwrap().encode_utf16().count();
        let message = Message::text(1, Chat::new(1, ChatType::Private), Some(User::new(2, "A")), text)
            .with_entity(MessageEntity::new(MessageEntityKind::BotCommand, 0, len));
        Update::new(1, UpdateKind::Message(message))
    }

    fn plain_update(text: &str) -> Update {
        let message = Message::text(1, Chat::new(1, ChatType::Private), Some(User::new(2, "A")), text);
        Update::new(1, UpdateKind::Message(message))
    }

    fn args_of(result: Option<CheckResult>) -> Option<Vec<String>> {
        match result? {
            CheckResult::Args { args, .. } => Some(args),
            _ => None,
        }
    }

    #[test]
    fn test_rejects_invalid_command_names() {
        assert!(matches!(
            CommandHandler::new(["bad command"]),
            Err(RegistrationError::InvalidCommand(_))
        ));
        assert!(CommandHandler::new([""]).is_err());
        assert!(CommandHandler::new(["a".repeat(33)]).is_err());
        assert!(CommandHandler::new(["START_2"]).is_ok());
    }

    #[test]
    fn test_command_with_args() {
        let handler = CommandHandler::new(["start"]).unwrap();
        let args = args_of(handler.check(&command_update("/start hello"), Some("Foo")));
        assert_eq!(args, Some(vec!["hello".to_string()]));
    }

    #[test]
    fn test_command_bot_suffix_is_case_insensitive() {
        let handler = CommandHandler::new(["start"]).unwrap();
        assert!(handler.check(&command_update("/Start@foo x"), Some("Foo")).is_some());
        assert!(handler.check(&command_update("/start@OtherBot"), Some("Foo")).is_none());
        assert!(handler.check(&command_update("/start@Foo"), None).is_none());
    }

    #[test]
    fn test_command_needs_entity_at_offset_zero() {
        let handler = CommandHandler::new(["start"]).unwrap();
        assert!(handler.check(&plain_update("/start"), Some("Foo")).is_none());
        assert!(handler.check(&command_update("/stop"), Some("Foo")).is_none());
    }

    #[test]
    fn test_command_has_args_rules() {
        let handler = CommandHandler::new(["ban"]).unwrap().with_has_args(HasArgs::AtLeastOne);
        assert!(handler.check(&command_update("/ban"), None).is_none());
        assert!(handler.check(&command_update("/ban joe"), None).is_some());

        let exact = CommandHandler::new(["pair"]).unwrap().with_has_args(HasArgs::Exactly(2));
        assert!(exact.check(&command_update("/pair a"), None).is_none());
        assert!(exact.check(&command_update("/pair a b"), None).is_some());
    }

    #[test]
    fn test_command_filter_must_pass() {
        let handler = CommandHandler::new(["start"])
            .unwrap()
            .with_filter(Filter::ChatType(vec![ChatType::Group]));
        assert!(handler.check(&command_update("/start"), None).is_none());
    }

    #[test]
    fn test_prefix_cross_product() {
        let handler = PrefixHandler::new(["!", "#"], ["test"]);
        assert_eq!(
            args_of(handler.check(&plain_update("!test extra"))),
            Some(vec!["extra".to_string()])
        );
        assert_eq!(
            args_of(handler.check(&plain_update("#TEST extra"))),
            Some(vec!["extra".to_string()])
        );
        assert!(handler.check(&plain_update("!testing")).is_none());
        assert!(handler.check(&plain_update("test")).is_none());
        assert!(handler.check(&plain_update("")).is_none());
    }

    #[test]
    fn test_prefix_setters_rebuild_cache() {
        let mut handler = PrefixHandler::new(["!"], ["a"]);
        handler.set_prefix(["/", "."]);
        handler.set_command(["B", "c"]);
        let expected: BTreeSet<String> = ["/b", "/c", ".b", ".c"].iter().map(|s| s.to_string()).collect();
        assert_eq!(handler.combined(), &expected);
        assert!(handler.check(&plain_update("!a")).is_none());
        assert!(handler.check(&plain_update(".c")).is_some());
    }
}
