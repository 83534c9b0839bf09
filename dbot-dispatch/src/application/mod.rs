//! # Application
//!
//! Owns the group table, the error-handler registry, the context stores and the update
//! queue, and drives the lifecycle:
//!
//! `Created → Initialized → Running → Stopped → ShutDown`
//!
//! - **initialize**: resolves the bot username, runs `post_init`. Idempotent.
//! - **start**: spawns the update fetcher. Only from `Initialized` or `Stopped`.
//! - **stop**: lets the fetcher drain everything queued before the call, then waits for
//!   every in-flight task. Only while `Running`. `stop_running` does the same from a
//!   handler without waiting.
//! - **shutdown**: only when not running; a no-op before `initialize`.

mod builder;
mod dispatch;
mod queue;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use dbot_core::{Bot, Message};
use futures::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

pub use builder::ApplicationBuilder;
pub use dispatch::DispatchOutcome;
pub use queue::UpdateSender;

use crate::error::{DispatchError, LifecycleError, Result};
use crate::error_handlers::{ErrorCallback, ErrorHandlers};
use crate::groups::HandlerGroups;
use crate::handlers::Handler;
use crate::store::{ContextStores, DataHandle};
use queue::Envelope;

pub(crate) type Hook = Arc<dyn Fn(Application) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

#[derive(Default)]
pub(crate) struct Hooks {
    pub(crate) post_init: Option<Hook>,
    pub(crate) post_stop: Option<Hook>,
    pub(crate) post_shutdown: Option<Hook>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Created,
    Initialized,
    Running,
    /// `stop` is draining the queue and joining tasks.
    Stopping,
    Stopped,
    ShutDown,
}

impl AppState {
    fn is_initialized(self) -> bool {
        matches!(self, Self::Initialized | Self::Running | Self::Stopping | Self::Stopped)
    }
}

type Fetcher = JoinHandle<mpsc::UnboundedReceiver<Envelope>>;

struct Inner {
    bot: Arc<dyn Bot>,
    bot_username: RwLock<Option<String>>,
    handlers: RwLock<HandlerGroups>,
    error_handlers: RwLock<ErrorHandlers>,
    stores: ContextStores,
    state: Mutex<AppState>,
    queue: UpdateSender,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Envelope>>>,
    fetcher: Mutex<Option<Fetcher>>,
    tracker: TaskTracker,
    concurrent_updates: usize,
    limiter: Option<Arc<Semaphore>>,
    hooks: Hooks,
}

/// Cheap to clone; all clones share the same state.
#[derive(Clone)]
pub struct Application {
    inner: Arc<Inner>,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    fn from_parts(
        bot: Arc<dyn Bot>,
        bot_username: Option<String>,
        concurrent_updates: usize,
        hooks: Hooks,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let limiter = (concurrent_updates > 1).then(|| Arc::new(Semaphore::new(concurrent_updates)));
        Self {
            inner: Arc::new(Inner {
                bot,
                bot_username: RwLock::new(bot_username),
                handlers: RwLock::new(HandlerGroups::new()),
                error_handlers: RwLock::new(ErrorHandlers::default()),
                stores: ContextStores::new(),
                state: Mutex::new(AppState::Created),
                queue: UpdateSender::new(tx),
                receiver: Mutex::new(Some(rx)),
                fetcher: Mutex::new(None),
                tracker: TaskTracker::new(),
                concurrent_updates,
                limiter,
                hooks,
            }),
        }
    }

    // --- lifecycle ---

    /// Prepares the application for `start`. Calling it again while initialized does
    /// nothing; after `shutdown` it initializes afresh.
    pub async fn initialize(&self) -> Result<()> {
        if self.state().is_initialized() {
            debug!("This Application is already initialized.");
            return Ok(());
        }

        if self.bot_username().is_none() {
            info!("step: resolving bot username via get_me");
            let me = self.inner.bot.get_me().await?;
            match me.username {
                Some(username) => *self.inner.bot_username.write() = Some(username),
                None => warn!(bot_id = me.id, "get_me returned no username; /command@bot will not match"),
            }
        }

        self.inner.tracker.reopen();
        *self.inner.state.lock() = AppState::Initialized;
        info!(bot_username = ?self.bot_username(), "step: application initialized");

        self.run_hook("post_init", self.inner.hooks.post_init.clone()).await
    }

    /// Starts pulling updates from the queue.
    pub async fn start(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            match *state {
                AppState::Initialized | AppState::Stopped => {}
                AppState::Running | AppState::Stopping => return Err(LifecycleError::AlreadyRunning.into()),
                AppState::Created | AppState::ShutDown => return Err(LifecycleError::NotInitialized.into()),
            }
            *state = AppState::Running;
        }

        let Some(rx) = self.inner.receiver.lock().take() else {
            *self.inner.state.lock() = AppState::Stopped;
            return Err(DispatchError::QueueClosed);
        };
        self.inner.tracker.reopen();
        let fetcher = tokio::spawn(dispatch::fetch_updates(self.clone(), rx));
        *self.inner.fetcher.lock() = Some(fetcher);

        info!(concurrent_updates = self.inner.concurrent_updates, "step: application started");
        Ok(())
    }

    /// Stops pulling updates and returns once everything queued before this call has been
    /// dispatched and no tracked task is still running. The state ends at `Stopped` even
    /// when the fetcher is gone.
    ///
    /// Awaiting this from a blocking handler never returns: the fetcher waits for that
    /// handler to finish. Handlers use [`Application::stop_running`] instead.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if *state != AppState::Running {
                return Err(LifecycleError::NotRunning.into());
            }
            *state = AppState::Stopping;
        }
        info!(in_flight = self.in_flight(), "step: application stopping");

        if self.inner.queue.send_stop().is_err() {
            warn!("step: update queue already closed, joining the fetcher anyway");
        }
        let fetcher = self.inner.fetcher.lock().take();
        if let Some(fetcher) = fetcher {
            match fetcher.await {
                Ok(rx) => *self.inner.receiver.lock() = Some(rx),
                Err(err) => error!(
                    error = %err,
                    "step: update fetcher failed, the update queue is gone and start will report QueueClosed"
                ),
            }
        }

        self.inner.tracker.close();
        self.inner.tracker.wait().await;

        *self.inner.state.lock() = AppState::Stopped;
        info!("step: application stopped");

        self.run_hook("post_stop", self.inner.hooks.post_stop.clone()).await
    }

    /// Runs [`Application::stop`] on its own task and returns without waiting, so a
    /// handler can stop the application it is running in.
    pub fn stop_running(&self) -> JoinHandle<Result<()>> {
        let app = self.clone();
        tokio::spawn(async move { app.stop().await })
    }

    /// Releases the application. Must follow `stop`.
    pub async fn shutdown(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            match *state {
                AppState::Running | AppState::Stopping => {
                    return Err(LifecycleError::StillRunning.into())
                }
                AppState::Created | AppState::ShutDown => {
                    debug!("This Application is not initialized, nothing to shut down.");
                    return Ok(());
                }
                AppState::Initialized | AppState::Stopped => *state = AppState::ShutDown,
            }
        }
        info!("step: application shut down");
        self.run_hook("post_shutdown", self.inner.hooks.post_shutdown.clone()).await
    }

    /// `initialize`, `start`, wait for `shutdown_signal`, `stop`, `shutdown`.
    pub async fn run_until<F>(&self, shutdown_signal: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.initialize().await?;
        self.start().await?;
        shutdown_signal.await;
        info!("step: shutdown signal received");
        let stopped = self.stop().await;
        let shut_down = self.shutdown().await;
        stopped.and(shut_down)
    }

    async fn run_hook(&self, name: &'static str, hook: Option<Hook>) -> Result<()> {
        let Some(hook) = hook else {
            return Ok(());
        };
        debug!(hook = name, "step: running hook");
        hook(self.clone())
            .await
            .map_err(|error| DispatchError::Hook { hook: name, error })
    }

    pub fn state(&self) -> AppState {
        *self.inner.state.lock()
    }

    pub fn running(&self) -> bool {
        self.state() == AppState::Running
    }

    // --- registration ---

    /// Appends `handler` to `group` and returns the registered instance, which is what
    /// [`Application::remove_handler`] expects.
    pub fn add_handler(&self, handler: impl Into<Arc<Handler>>, group: i32) -> Result<Arc<Handler>> {
        let handler = handler.into();
        self.inner.handlers.write().add(handler.clone(), group)?;
        debug!(group, handler = handler.name(), "step: handler added");
        Ok(handler)
    }

    /// Adds all handlers to one group, or none of them.
    pub fn add_handlers<I, H>(&self, handlers: I, group: i32) -> Result<Vec<Arc<Handler>>>
    where
        I: IntoIterator<Item = H>,
        H: Into<Arc<Handler>>,
    {
        let handlers: Vec<Arc<Handler>> = handlers.into_iter().map(Into::into).collect();
        self.inner.handlers.write().add_many(handlers.clone(), group)?;
        Ok(handlers)
    }

    /// Adds handlers to several groups at once, or none of them.
    pub fn add_grouped_handlers<I, V, H>(&self, groups: I) -> Result<Vec<(i32, Arc<Handler>)>>
    where
        I: IntoIterator<Item = (i32, V)>,
        V: IntoIterator<Item = H>,
        H: Into<Arc<Handler>>,
    {
        let batch: Vec<(i32, Arc<Handler>)> = groups
            .into_iter()
            .flat_map(|(group, handlers)| handlers.into_iter().map(move |h| (group, h.into())))
            .collect();
        self.inner.handlers.write().add_grouped(batch.clone())?;
        Ok(batch)
    }

    pub fn remove_handler(&self, handler: &Arc<Handler>, group: i32) -> Result<()> {
        self.inner.handlers.write().remove(handler, group)?;
        debug!(group, handler = handler.name(), "step: handler removed");
        Ok(())
    }

    /// Copy of the current group table.
    pub fn handlers(&self) -> HandlerGroups {
        self.inner.handlers.read().clone()
    }

    /// Registers an error callback. Registering the same callback twice is logged and
    /// otherwise ignored; returns whether it was added.
    pub fn add_error_handler(&self, callback: ErrorCallback, block: bool) -> bool {
        let added = self.inner.error_handlers.write().add(callback, block);
        if !added {
            debug!("The callback is already registered as an error handler. Ignoring.");
        }
        added
    }

    pub fn remove_error_handler(&self, callback: &ErrorCallback) -> bool {
        self.inner.error_handlers.write().remove(callback)
    }

    pub fn error_handler_count(&self) -> usize {
        self.inner.error_handlers.read().len()
    }

    pub fn has_error_handlers(&self) -> bool {
        !self.inner.error_handlers.read().is_empty()
    }

    // --- context data ---

    pub fn stores(&self) -> &ContextStores {
        &self.inner.stores
    }

    pub fn user_data(&self, user_id: i64) -> DataHandle {
        self.inner.stores.user_data.get_or_create(user_id)
    }

    pub fn chat_data(&self, chat_id: i64) -> DataHandle {
        self.inner.stores.chat_data.get_or_create(chat_id)
    }

    pub fn bot_data(&self) -> DataHandle {
        self.inner.stores.bot_data.clone()
    }

    /// See [`ContextStores::migrate_chat_data`].
    pub fn migrate_chat_data(
        &self,
        message: Option<&Message>,
        old_chat_id: Option<i64>,
        new_chat_id: Option<i64>,
    ) -> Result<()> {
        Ok(self.inner.stores.migrate_chat_data(message, old_chat_id, new_chat_id)?)
    }

    pub fn drop_chat_data(&self, chat_id: i64) {
        self.inner.stores.drop_chat_data(chat_id);
    }

    pub fn drop_user_data(&self, user_id: i64) {
        self.inner.stores.drop_user_data(user_id);
    }

    // --- accessors ---

    pub fn bot(&self) -> Arc<dyn Bot> {
        self.inner.bot.clone()
    }

    pub fn bot_username(&self) -> Option<String> {
        self.inner.bot_username.read().clone()
    }

    pub fn update_queue(&self) -> UpdateSender {
        self.inner.queue.clone()
    }

    pub fn concurrent_updates(&self) -> usize {
        self.inner.concurrent_updates
    }

    /// Number of tracked tasks (non-blocking handlers, `create_task`, concurrent updates)
    /// still running.
    pub fn in_flight(&self) -> usize {
        self.inner.tracker.len()
    }
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Application")
            .field("state", &self.state())
            .field("bot_username", &self.bot_username())
            .field("concurrent_updates", &self.inner.concurrent_updates)
            .field("handlers", &self.inner.handlers.read().len())
            .field("error_handlers", &self.error_handler_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dbot_core::{Chat, User};

    struct NamedBot(Option<&'static str>);

    #[async_trait]
    impl Bot for NamedBot {
        async fn get_me(&self) -> dbot_core::Result<User> {
            let mut me = User::new(1, "Bot");
            me.is_bot = true;
            me.username = self.0.map(str::to_string);
            Ok(me)
        }
        async fn send_message(&self, _chat: &Chat, _text: &str) -> dbot_core::Result<()> {
            Ok(())
        }
        async fn reply_to(&self, _message: &Message, _text: &str) -> dbot_core::Result<()> {
            Ok(())
        }
        async fn answer_callback_query(&self, _id: &str, _text: Option<&str>) -> dbot_core::Result<()> {
            Ok(())
        }
    }

    fn app(username: Option<&'static str>) -> Application {
        Application::builder()
            .bot(Arc::new(NamedBot(username)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_rejects_zero_concurrency() {
        let result = Application::builder()
            .bot(Arc::new(NamedBot(None)))
            .concurrent_updates(0)
            .build();
        assert!(matches!(result, Err(DispatchError::Config(_))));
        assert!(matches!(
            Application::builder().build(),
            Err(DispatchError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_initialize_resolves_username_once() {
        let app = app(Some("FooBot"));
        assert_eq!(app.bot_username(), None);
        app.initialize().await.unwrap();
        app.initialize().await.unwrap();
        assert_eq!(app.bot_username().as_deref(), Some("FooBot"));
        assert_eq!(app.state(), AppState::Initialized);
    }

    #[tokio::test]
    async fn test_lifecycle_guards() {
        let app = app(None);
        assert!(matches!(
            app.start().await,
            Err(DispatchError::Lifecycle(LifecycleError::NotInitialized))
        ));
        assert!(matches!(
            app.stop().await,
            Err(DispatchError::Lifecycle(LifecycleError::NotRunning))
        ));
        app.shutdown().await.unwrap();

        app.initialize().await.unwrap();
        app.start().await.unwrap();
        assert!(matches!(
            app.start().await,
            Err(DispatchError::Lifecycle(LifecycleError::AlreadyRunning))
        ));
        assert!(matches!(
            app.shutdown().await,
            Err(DispatchError::Lifecycle(LifecycleError::StillRunning))
        ));

        app.stop().await.unwrap();
        app.start().await.unwrap();
        app.stop().await.unwrap();
        app.shutdown().await.unwrap();
        assert_eq!(app.state(), AppState::ShutDown);

        app.initialize().await.unwrap();
        assert_eq!(app.state(), AppState::Initialized);
    }

    #[tokio::test]
    async fn test_hook_failure_is_reported() {
        let app = Application::builder()
            .bot(Arc::new(NamedBot(None)))
            .bot_username("x")
            .post_init(|_| async { Err(anyhow::anyhow!("boom")) })
            .build()
            .unwrap();
        let err = app.initialize().await.unwrap_err();
        assert!(matches!(err, DispatchError::Hook { hook: "post_init", .. }));
    }
}
