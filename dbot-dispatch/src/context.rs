//! The per-dispatch context handed to callbacks.

use std::fmt;
use std::sync::Arc;

use dbot_core::Bot;

use crate::application::{Application, UpdateSender};
use crate::event::Event;
use crate::regex_match::RegexMatch;
use crate::store::DataHandle;

/// Built fresh for every handler or error-handler invocation.
///
/// `args`, `matches` and `error` are transient; `user_data`, `chat_data` and `bot_data`
/// resolve to the application's persistent stores.
#[derive(Clone)]
pub struct CallbackContext {
    /// Tokens after the command, for command-style handlers.
    pub args: Option<Vec<String>>,
    /// Regex evidence from the matching handler or its filter.
    pub matches: Vec<RegexMatch>,
    /// The failure being handled; only set for error handlers.
    pub error: Option<Arc<anyhow::Error>>,
    user_id: Option<i64>,
    chat_id: Option<i64>,
    app: Application,
}

impl CallbackContext {
    pub(crate) fn from_event(event: &Event, app: &Application) -> Self {
        Self {
            args: None,
            matches: Vec::new(),
            error: None,
            user_id: event.effective_user().map(|u| u.id),
            chat_id: event.effective_chat().map(|c| c.id),
            app: app.clone(),
        }
    }

    pub(crate) fn from_error(
        event: Option<&Event>,
        error: Arc<anyhow::Error>,
        app: &Application,
    ) -> Self {
        let mut context = match event {
            Some(event) => Self::from_event(event, app),
            None => Self {
                args: None,
                matches: Vec::new(),
                error: None,
                user_id: None,
                chat_id: None,
                app: app.clone(),
            },
        };
        context.error = Some(error);
        context
    }

    /// Data for the event's effective user, created on first access. `None` when the event
    /// has no user.
    pub fn user_data(&self) -> Option<DataHandle> {
        self.user_id
            .map(|id| self.app.stores().user_data.get_or_create(id))
    }

    /// Data for the event's effective chat, created on first access.
    pub fn chat_data(&self) -> Option<DataHandle> {
        self.chat_id
            .map(|id| self.app.stores().chat_data.get_or_create(id))
    }

    pub fn bot_data(&self) -> DataHandle {
        self.app.stores().bot_data.clone()
    }

    pub fn bot(&self) -> Arc<dyn Bot> {
        self.app.bot()
    }

    pub fn update_queue(&self) -> UpdateSender {
        self.app.update_queue()
    }

    pub fn application(&self) -> &Application {
        &self.app
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn chat_id(&self) -> Option<i64> {
        self.chat_id
    }

    /// First regex match, the common case for single-pattern handlers.
    pub fn first_match(&self) -> Option<&RegexMatch> {
        self.matches.first()
    }
}

impl fmt::Debug for CallbackContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackContext")
            .field("args", &self.args)
            .field("matches", &self.matches)
            .field("error", &self.error.as_ref().map(|e| e.to_string()))
            .field("user_id", &self.user_id)
            .field("chat_id", &self.chat_id)
            .finish()
    }
}
