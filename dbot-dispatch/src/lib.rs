//! # dbot-dispatch
//!
//! Routes each incoming [`Event`] to registered [`Handler`]s by priority group.
//!
//! - Groups are visited in ascending id order; within a group the first handler whose
//!   check matches runs and the rest are skipped.
//! - Blocking handlers finish before the next group; non-blocking ones run as tracked tasks
//!   that [`Application::stop`] waits for.
//! - A handler returning [`Flow::Stop`] skips all remaining groups. A handler returning
//!   `Err` goes to the error handlers and dispatch continues.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dbot_dispatch::{Application, Callback, CommandHandler, Flow, Handler};
//!
//! # async fn demo(bot: Arc<dyn dbot_core::Bot>) -> anyhow::Result<()> {
//! let app = Application::builder().bot(bot).build()?;
//! app.add_handler(
//!     Handler::new(
//!         CommandHandler::new(["start"])?,
//!         Callback::new(|event, ctx| async move {
//!             if let Some(message) = event.effective_message() {
//!                 ctx.bot().reply_to(message, "hello").await?;
//!             }
//!             Ok::<_, anyhow::Error>(Flow::Continue)
//!         }),
//!     ),
//!     0,
//! )?;
//! app.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! # Ok(()) }
//! ```

pub mod application;
pub mod context;
pub mod error;
pub mod error_handlers;
pub mod event;
pub mod filters;
pub mod groups;
pub mod handlers;
pub mod regex_match;
pub mod store;

pub use application::{AppState, Application, ApplicationBuilder, DispatchOutcome, UpdateSender};
pub use context::CallbackContext;
pub use error::{DispatchError, LifecycleError, MigrationError, RegistrationError, Result};
pub use error_handlers::ErrorCallback;
pub use event::Event;
pub use filters::{Filter, UpdateTypes};
pub use groups::{HandlerGroups, DEFAULT_GROUP};
pub use handlers::{
    Callback, CallbackPattern, CallbackQueryHandler, ChatMemberHandler, ChatMemberMode,
    CheckResult, CommandHandler, Flow, Handler, HandlerKind, HandlerResult, HasArgs,
    InlineQueryHandler, LegacyArgs, LegacyOptions, MessageHandler, PollAnswerHandler,
    PollHandler, PrefixHandler, StringCommandHandler, StringRegexHandler, TypeHandler,
};
pub use regex_match::RegexMatch;
pub use store::{ContextStores, DataHandle, DataMap, KeyedStore};
