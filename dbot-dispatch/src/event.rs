//! What flows through the update queue.
//!
//! Most traffic is [`Update`]s from the Bot API, but string handlers consume raw text and
//! type handlers consume arbitrary values, so the queue carries an [`Event`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use dbot_core::{Chat, Message, Update, User};

/// One item taken off the update queue. Cloning is cheap (reference counted).
#[derive(Clone)]
pub enum Event {
    /// An update from the Bot API.
    Update(Arc<Update>),
    /// A raw string, matched by string command/regex handlers.
    Text(Arc<str>),
    /// Any other value, matched by type handlers.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl Event {
    /// Wraps an arbitrary value for type handlers.
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Self::Custom(Arc::new(value))
    }

    pub fn update(&self) -> Option<&Update> {
        match self {
            Self::Update(u) => Some(&**u),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(&**s),
            _ => None,
        }
    }

    /// Borrows the custom payload as `T` if it holds exactly that type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(v) => (**v).downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Update id for log fields; `None` for non-update events.
    pub fn update_id(&self) -> Option<i64> {
        self.update().map(|u| u.update_id)
    }

    pub fn effective_message(&self) -> Option<&Message> {
        self.update().and_then(Update::effective_message)
    }

    pub fn effective_chat(&self) -> Option<&Chat> {
        self.update().and_then(Update::effective_chat)
    }

    pub fn effective_user(&self) -> Option<&User> {
        self.update().and_then(Update::effective_user)
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update(u) => f.debug_tuple("Update").field(u).finish(),
            Self::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<Update> for Event {
    fn from(update: Update) -> Self {
        Self::Update(Arc::new(update))
    }
}

impl From<Arc<Update>> for Event {
    fn from(update: Arc<Update>) -> Self {
        Self::Update(update)
    }
}

impl From<String> for Event {
    fn from(text: String) -> Self {
        Self::Text(text.into())
    }
}

impl From<&str> for Event {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}
