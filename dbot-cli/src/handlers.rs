//! Demo handler set registered by `dbot run`.
//!
//! | group | handler | behaviour |
//! |---|---|---|
//! | -1 | migration filter | moves chat data to the new supergroup id, stops |
//! | 0 | `/start` | greets, counts starts per user |
//! | 0 | `/help` | lists commands |
//! | 0 | `!echo`, `#echo` | repeats the arguments |
//! | 0 | callback `page:<n>` | answers the query with the page number |
//! | 1 | plain text | counts messages per chat (non-blocking) |

use anyhow::Result;
use dbot_dispatch::{
    Application, Callback, CallbackContext, CallbackQueryHandler, CommandHandler, ErrorCallback,
    Event, Filter, Flow, Handler, HandlerResult, MessageHandler, PrefixHandler,
};
use tracing::{error, info};

const HELP: &str = "/start - greeting\n/help - this text\n!echo <text> - repeat text";

pub fn register_demo_handlers(app: &Application) -> Result<()> {
    app.add_handler(
        Handler::new(MessageHandler::new(Filter::Migrate), Callback::new(migrate)),
        -1,
    )?;

    app.add_handlers(
        vec![
            Handler::new(CommandHandler::new(["start"])?, Callback::new(start)),
            Handler::new(CommandHandler::new(["help"])?, Callback::new(help)),
            Handler::new(PrefixHandler::new(["!", "#"], ["echo"]), Callback::new(echo)),
            Handler::new(CallbackQueryHandler::with_pattern(r"page:(\d+)")?, Callback::new(page)),
        ],
        0,
    )?;

    app.add_handler(
        Handler::new(MessageHandler::new(Filter::Text & !Filter::Command), Callback::new(count))
            .non_blocking(),
        1,
    )?;

    app.add_error_handler(ErrorCallback::new(log_error), true);
    info!(handlers = app.handlers().len(), "step: demo handlers registered");
    Ok(())
}

async fn migrate(event: Event, ctx: CallbackContext) -> HandlerResult {
    if let Some(message) = event.effective_message() {
        ctx.application().migrate_chat_data(Some(message), None, None)?;
    }
    Ok(Flow::stop())
}

async fn start(event: Event, ctx: CallbackContext) -> HandlerResult {
    let Some(message) = event.effective_message() else {
        return Ok(Flow::Continue);
    };
    let starts = match ctx.user_data() {
        Some(data) => {
            let starts = data.get("starts").await.and_then(|v| v.as_u64()).unwrap_or(0) + 1;
            data.insert("starts", starts).await;
            starts
        }
        None => 1,
    };
    let name = event
        .effective_user()
        .map(|u| u.full_name())
        .unwrap_or_else(|| "there".to_string());
    let text = match ctx.args.as_deref() {
        Some([]) | None => format!("Hello, {name}! (start #{starts})"),
        Some(args) => format!("Hello, {name}! You said: {}", args.join(" ")),
    };
    ctx.bot().reply_to(message, &text).await?;
    Ok(Flow::Continue)
}

async fn help(event: Event, ctx: CallbackContext) -> HandlerResult {
    if let Some(message) = event.effective_message() {
        ctx.bot().reply_to(message, HELP).await?;
    }
    Ok(Flow::Continue)
}

async fn echo(event: Event, ctx: CallbackContext) -> HandlerResult {
    let Some(message) = event.effective_message() else {
        return Ok(Flow::Continue);
    };
    match ctx.args.as_deref() {
        Some(args) if !args.is_empty() => ctx.bot().reply_to(message, &args.join(" ")).await?,
        _ => ctx.bot().reply_to(message, "Nothing to echo").await?,
    }
    Ok(Flow::Continue)
}

async fn page(event: Event, ctx: CallbackContext) -> HandlerResult {
    let Some(query) = event.update().and_then(|u| u.callback_query()) else {
        return Ok(Flow::Continue);
    };
    let page = ctx.first_match().and_then(|m| m.get(1)).unwrap_or("?");
    let text = format!("Page {page}");
    ctx.bot().answer_callback_query(&query.id, Some(&text)).await?;
    Ok(Flow::Continue)
}

async fn count(_event: Event, ctx: CallbackContext) -> HandlerResult {
    if let Some(data) = ctx.chat_data() {
        let mut map = data.write().await;
        let seen = map.get("messages").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
        map.insert("messages".to_string(), seen.into());
    }
    Ok(Flow::Continue)
}

async fn log_error(event: Option<Event>, ctx: CallbackContext) -> HandlerResult {
    let update_id = event.as_ref().and_then(Event::update_id);
    if let Some(err) = &ctx.error {
        error!(update_id = ?update_id, error = %format!("{err:#}"), "Handler failed");
    }
    Ok(Flow::Continue)
}
