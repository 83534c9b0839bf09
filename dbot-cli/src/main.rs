//! dbot CLI: run the demo Telegram bot. Config from env and optional CLI args.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dbot_cli::{load_config, register_demo_handlers, Cli, Commands};
use dbot_dispatch::Application;
use dbot_telegram::TelegramBotAdapter;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => {
            let config = load_config(token)?;
            config.validate()?;
            dbot_core::init_tracing(config.log_file.as_deref())?;

            let bot = config.telegram().build_bot()?;
            let app = Application::builder()
                .bot(Arc::new(TelegramBotAdapter::new(bot.clone())))
                .concurrent_updates(config.concurrent_updates)
                .build()?;
            register_demo_handlers(&app)?;

            info!(concurrent_updates = config.concurrent_updates, "step: starting bot");
            dbot_telegram::run_polling(&app, bot, config.poll_timeout_secs).await
        }
    }
}
