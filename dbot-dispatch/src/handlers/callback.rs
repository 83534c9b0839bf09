//! Callback shapes and the value a callback returns.
//!
//! Two explicit shapes exist, chosen when the handler is built: [`Callback::new`] receives
//! a [`CallbackContext`]; [`Callback::legacy`] receives positional-style [`LegacyArgs`]
//! gated by [`LegacyOptions`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use dbot_core::Bot;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::application::UpdateSender;
use crate::context::CallbackContext;
use crate::event::Event;
use crate::store::DataHandle;

/// What a callback tells the dispatcher after it ran.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Flow {
    /// Keep going with the next group.
    #[default]
    Continue,
    /// Application handler stop: skip every remaining group for this update. The optional
    /// payload is a new state for conversation-style handlers layered on top.
    Stop(Option<Value>),
}

impl Flow {
    pub fn stop() -> Self {
        Self::Stop(None)
    }

    pub fn stop_with(state: impl Into<Value>) -> Self {
        Self::Stop(Some(state.into()))
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, Self::Stop(_))
    }
}

/// Result of every handler and error-handler callback. `Err` is a genuine failure and goes
/// to the error-handler chain; stopping is expressed through [`Flow::Stop`].
pub type HandlerResult = anyhow::Result<Flow>;

type ContextFn = dyn Fn(Event, CallbackContext) -> BoxFuture<'static, HandlerResult> + Send + Sync;
type LegacyFn = dyn Fn(Event, LegacyArgs) -> BoxFuture<'static, HandlerResult> + Send + Sync;

/// Which extra values a legacy callback wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyOptions {
    pub pass_update_queue: bool,
    pub pass_user_data: bool,
    pub pass_chat_data: bool,
    pub pass_args: bool,
    pub pass_groups: bool,
    pub pass_groupdict: bool,
}

/// Values supplied to a legacy callback; each optional one is `Some` only when its
/// `pass_*` flag is set and the value exists for this update.
#[derive(Clone)]
pub struct LegacyArgs {
    pub bot: Arc<dyn Bot>,
    pub update_queue: Option<UpdateSender>,
    pub user_data: Option<DataHandle>,
    pub chat_data: Option<DataHandle>,
    pub args: Option<Vec<String>>,
    pub groups: Option<Vec<Option<String>>>,
    pub groupdict: Option<HashMap<String, String>>,
}

#[derive(Clone)]
pub enum Callback {
    Context(Arc<ContextFn>),
    Legacy {
        options: LegacyOptions,
        f: Arc<LegacyFn>,
    },
}

impl Callback {
    /// Context-based callback: `f(event, context)`.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Event, CallbackContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let f: Arc<ContextFn> = Arc::new(
            move |event: Event, ctx: CallbackContext| -> BoxFuture<'static, HandlerResult> {
                Box::pin(f(event, ctx))
            },
        );
        Self::Context(f)
    }

    /// Deprecated calling convention: `f(event, legacy_args)`.
    pub fn legacy<F, Fut>(options: LegacyOptions, f: F) -> Self
    where
        F: Fn(Event, LegacyArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let f: Arc<LegacyFn> = Arc::new(
            move |event: Event, args: LegacyArgs| -> BoxFuture<'static, HandlerResult> {
                Box::pin(f(event, args))
            },
        );
        Self::Legacy { options, f }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy { .. })
    }
}
