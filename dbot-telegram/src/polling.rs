//! Long-polling update source feeding an [`Application`]'s update queue.

use std::time::Duration;

use anyhow::Result;
use dbot_dispatch::{Application, UpdateSender};
use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::adapters::to_core_update;

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Calls getUpdates until `cancel` fires, pushing every converted update to `queue`.
///
/// The offset only advances past updates that were handed to the queue, so updates
/// fetched by a request that is cancelled mid-flight are delivered again next time.
#[instrument(skip(bot, queue, cancel))]
pub async fn poll_updates(
    bot: teloxide::Bot,
    queue: UpdateSender,
    timeout_secs: u32,
    cancel: CancellationToken,
) -> Result<()> {
    let mut offset: i32 = 0;
    info!(timeout_secs, "step: polling started");

    loop {
        let request = bot.get_updates().offset(offset).timeout(timeout_secs);
        let updates = tokio::select! {
            _ = cancel.cancelled() => break,
            result = request.send() => result,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "getUpdates failed, retrying");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => continue,
                }
            }
        };

        for update in updates {
            offset = i32::try_from(update.id.0).map_or(i32::MAX, |id| id.saturating_add(1));
            match to_core_update(&update) {
                Ok(core) => {
                    debug!(update_id = core.update_id, "step: update received");
                    queue.send(core)?;
                }
                Err(e) => warn!(error = %e, update_id = update.id.0, "Skipping update that could not be converted"),
            }
        }
    }

    info!("step: polling stopped");
    Ok(())
}

/// Runs `app` against Telegram long polling until Ctrl-C.
///
/// Polling is cancelled before the application stops, so `stop` only drains what was
/// already received. Polling ending on its own also stops the application.
pub async fn run_polling(app: &Application, bot: teloxide::Bot, timeout_secs: u32) -> Result<()> {
    let cancel = CancellationToken::new();
    let poller = tokio::spawn({
        let (queue, cancel) = (app.update_queue(), cancel.clone());
        async move {
            let result = poll_updates(bot, queue, timeout_secs, cancel.clone()).await;
            cancel.cancel();
            result
        }
    });

    let shutdown = {
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!(error = %e, "Failed to listen for Ctrl-C");
                    }
                    info!("step: Ctrl-C received");
                }
                _ = cancel.cancelled() => {}
            }
            cancel.cancel();
        }
    };

    let outcome = app.run_until(shutdown).await;
    cancel.cancel();
    match poller.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Polling ended with an error"),
        Err(e) => error!(error = %e, "Polling task failed"),
    }
    Ok(outcome?)
}
