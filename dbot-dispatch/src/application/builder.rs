use std::future::Future;
use std::sync::Arc;

use dbot_core::Bot;
use futures::future::BoxFuture;

use super::{Application, Hook};
use crate::error::{DispatchError, Result};

/// Configures and builds an [`Application`].
///
/// ```no_run
/// # use std::sync::Arc;
/// # use dbot_dispatch::Application;
/// # fn demo(bot: Arc<dyn dbot_core::Bot>) -> dbot_dispatch::Result<()> {
/// let app = Application::builder()
///     .bot(bot)
///     .concurrent_updates(8)
///     .post_init(|app| async move {
///         tracing::info!(username = ?app.bot_username(), "ready");
///         Ok(())
///     })
///     .build()?;
/// # Ok(()) }
/// ```
pub struct ApplicationBuilder {
    bot: Option<Arc<dyn Bot>>,
    bot_username: Option<String>,
    concurrent_updates: usize,
    post_init: Option<Hook>,
    post_stop: Option<Hook>,
    post_shutdown: Option<Hook>,
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self {
            bot: None,
            bot_username: None,
            concurrent_updates: 1,
            post_init: None,
            post_stop: None,
            post_shutdown: None,
        }
    }
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bot(mut self, bot: Arc<dyn Bot>) -> Self {
        self.bot = Some(bot);
        self
    }

    /// Username used for `/command@username` matching. When unset, `initialize` asks the
    /// bot via `get_me`.
    pub fn bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    /// Maximum number of updates processed at once. `1` (the default) processes updates
    /// strictly one after another.
    pub fn concurrent_updates(mut self, limit: usize) -> Self {
        self.concurrent_updates = limit;
        self
    }

    /// Runs at the end of `initialize`.
    pub fn post_init<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Application) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.post_init = Some(boxed_hook(hook));
        self
    }

    /// Runs at the end of `stop`, after every in-flight task finished.
    pub fn post_stop<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Application) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.post_stop = Some(boxed_hook(hook));
        self
    }

    /// Runs at the end of `shutdown`.
    pub fn post_shutdown<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn(Application) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.post_shutdown = Some(boxed_hook(hook));
        self
    }

    pub fn build(self) -> Result<Application> {
        let bot = self
            .bot
            .ok_or_else(|| DispatchError::Config("a bot is required".to_string()))?;
        if self.concurrent_updates == 0 {
            return Err(DispatchError::Config(
                "concurrent_updates must be at least 1".to_string(),
            ));
        }
        Ok(Application::from_parts(
            bot,
            self.bot_username,
            self.concurrent_updates,
            super::Hooks {
                post_init: self.post_init,
                post_stop: self.post_stop,
                post_shutdown: self.post_shutdown,
            },
        ))
    }
}

fn boxed_hook<F, Fut>(hook: F) -> Hook
where
    F: Fn(Application) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |app: Application| -> BoxFuture<'static, anyhow::Result<()>> {
        Box::pin(hook(app))
    })
}
