//! Per-update dispatch, the error-handler chain and background tasks.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::queue::Envelope;
use super::Application;
use crate::context::CallbackContext;
use crate::event::Event;
use crate::handlers::{Flow, HandlerResult};

/// How processing of one update ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Every group was visited.
    Completed,
    /// A blocking handler (or an error handler) in `group` stopped processing; `state` is
    /// the payload it stopped with.
    Stopped {
        group: i32,
        state: Option<serde_json::Value>,
    },
}

impl DispatchOutcome {
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped { .. })
    }
}

impl Application {
    /// Runs one event through the group table: lowest group first, at most one handler per
    /// group (the first whose check matches).
    ///
    /// Blocking handlers are awaited before the next group is evaluated; non-blocking ones
    /// are spawned as tracked tasks. A blocking [`Flow::Stop`] ends processing. Handler
    /// errors go to [`Application::process_error`] and never escape.
    pub async fn process_update(&self, event: impl Into<Event>) -> DispatchOutcome {
        let event = event.into();
        let update_id = event.update_id();
        let groups = self.inner.handlers.read().snapshot();
        let bot_username = self.bot_username();

        debug!(update_id = ?update_id, groups = groups.len(), "step: process_update started");

        for (group, handlers) in groups {
            let scan = panic::catch_unwind(AssertUnwindSafe(|| {
                handlers.iter().find_map(|handler| {
                    handler
                        .check_update(&event, bot_username.as_deref())
                        .map(|check| (handler, check))
                })
            }));
            let matched = match scan {
                Ok(matched) => matched,
                Err(payload) => {
                    let err = anyhow::anyhow!("check_update panicked: {}", panic_message(&*payload));
                    if self.process_error(Some(event.clone()), err).await {
                        debug!(update_id = ?update_id, group, "Error handler stopped further handlers");
                        return DispatchOutcome::Stopped { group, state: None };
                    }
                    continue;
                }
            };
            let Some((handler, check)) = matched else {
                continue;
            };

            debug!(
                update_id = ?update_id,
                group,
                handler = handler.name(),
                block = handler.block(),
                "step: handler matched"
            );

            let context = CallbackContext::from_event(&event, self);
            let callback = call_guarded(|| handler.handle_update(event.clone(), check, context));

            if !handler.block() {
                self.create_task(callback, Some(event.clone()));
                continue;
            }

            match catch_panic(callback).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop(state)) => {
                    debug!(update_id = ?update_id, group, "Stopping further handlers due to ApplicationHandlerStop");
                    return DispatchOutcome::Stopped { group, state };
                }
                Err(err) => {
                    if self.process_error(Some(event.clone()), err).await {
                        debug!(update_id = ?update_id, group, "Error handler stopped further handlers");
                        return DispatchOutcome::Stopped { group, state: None };
                    }
                }
            }
        }

        debug!(update_id = ?update_id, "step: process_update finished");
        DispatchOutcome::Completed
    }

    /// Runs every error handler in registration order with `error` set on its context.
    /// Returns `true` when a blocking error handler asked to stop further handlers.
    ///
    /// Failures inside error handlers are logged and never re-routed.
    pub async fn process_error(&self, event: Option<Event>, error: anyhow::Error) -> bool {
        let update_id = event.as_ref().and_then(Event::update_id);
        let handlers = self.inner.error_handlers.read().snapshot();
        if handlers.is_empty() {
            error!(update_id = ?update_id, error = %format!("{error:#}"), "No error handlers are registered, logging exception.");
            return false;
        }

        let error = std::sync::Arc::new(error);
        for registered in handlers {
            let context = CallbackContext::from_error(event.as_ref(), error.clone(), self);
            let callback = call_guarded(|| registered.callback.call(event.clone(), context));

            if !registered.block {
                self.spawn_tracked(error_handler_task(callback, update_id));
                continue;
            }

            match catch_panic(callback).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop(_)) => return true,
                Err(err) => log_uncaught(update_id, &err),
            }
        }
        false
    }

    /// Spawns a tracked background task; `stop` waits for it. An `Err` result goes to the
    /// error-handler chain with `event`, a [`Flow::Stop`] result is only a warning.
    pub fn create_task<F>(&self, future: F, event: Option<Event>) -> JoinHandle<()>
    where
        F: Future<Output = HandlerResult> + Send + 'static,
    {
        let app = self.clone();
        self.spawn_tracked(async move {
            let update_id = event.as_ref().and_then(Event::update_id);
            match catch_panic(future).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Stop(_)) => {
                    warn!(update_id = ?update_id, "ApplicationHandlerStop is not supported with handlers running non-blocking.");
                }
                Err(err) => {
                    app.process_error(event, err).await;
                }
            }
        })
    }

    pub(crate) fn spawn_tracked<F>(&self, future: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.tracker.spawn(future)
    }
}

async fn error_handler_task<F>(callback: F, update_id: Option<i64>)
where
    F: Future<Output = HandlerResult> + Send,
{
    match catch_panic(callback).await {
        Ok(Flow::Continue) => {}
        Ok(Flow::Stop(_)) => {
            warn!(update_id = ?update_id, "ApplicationHandlerStop is not supported with handlers running non-blocking.");
        }
        Err(err) => log_uncaught(update_id, &err),
    }
}

fn log_uncaught(update_id: Option<i64>, err: &anyhow::Error) {
    error!(
        update_id = ?update_id,
        error = %format!("{err:#}"),
        "An error was raised and an uncaught error was raised while handling the error with an error_handler."
    );
}

/// Builds a callback's future, turning a panic raised before the future exists into a
/// future that resolves to the same error `catch_panic` would produce.
fn call_guarded<C>(call: C) -> BoxFuture<'static, HandlerResult>
where
    C: FnOnce() -> BoxFuture<'static, HandlerResult>,
{
    match panic::catch_unwind(AssertUnwindSafe(call)) {
        Ok(future) => future,
        Err(payload) => {
            let err = panicked(&*payload);
            async move { Err(err) }.boxed()
        }
    }
}

fn panicked(payload: &(dyn Any + Send)) -> anyhow::Error {
    anyhow::anyhow!("callback panicked: {}", panic_message(payload))
}

/// Turns a panicking callback into an ordinary error so it takes the error-handler path.
async fn catch_panic<F>(callback: F) -> HandlerResult
where
    F: Future<Output = HandlerResult>,
{
    AssertUnwindSafe(callback)
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(panicked(&*payload)))
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Pulls events off the queue until a stop marker, then hands the receiver back so a later
/// `start` can resume with whatever is still queued.
pub(super) async fn fetch_updates(
    app: Application,
    mut rx: mpsc::UnboundedReceiver<Envelope>,
) -> mpsc::UnboundedReceiver<Envelope> {
    info!(concurrent_updates = app.concurrent_updates(), "step: update fetcher started");
    while let Some(envelope) = rx.recv().await {
        let event = match envelope {
            Envelope::Event(event) => event,
            Envelope::Stop => break,
        };

        match app.inner.limiter.clone() {
            None => {
                dispatch_guarded(&app, event).await;
            }
            Some(limiter) => {
                let Ok(permit) = limiter.acquire_owned().await else {
                    warn!("step: concurrency limiter closed, fetcher exiting");
                    break;
                };
                let worker = app.clone();
                app.spawn_tracked(async move {
                    dispatch_guarded(&worker, event).await;
                    drop(permit);
                });
            }
        }
    }
    info!("step: update fetcher stopped");
    rx
}

/// `process_update` for the fetcher: a panic that escapes dispatch is logged and the
/// fetcher moves on to the next event.
async fn dispatch_guarded(app: &Application, event: Event) {
    let update_id = event.update_id();
    if let Err(payload) = AssertUnwindSafe(app.process_update(event)).catch_unwind().await {
        error!(
            update_id = ?update_id,
            panic = panic_message(&*payload),
            "Dispatch panicked, continuing with the next update"
        );
    }
}
