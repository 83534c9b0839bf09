//! # dbot-telegram
//!
//! Telegram transport for dbot: a teloxide-backed [`dbot_core::Bot`], conversions from
//! teloxide types, minimal config and a long-polling source for a
//! [`dbot_dispatch::Application`]. No dispatch logic lives here.

mod adapters;
mod bot_adapter;
mod config;
mod polling;

pub use adapters::{to_core_update, to_core_user};
pub use bot_adapter::TelegramBotAdapter;
pub use config::{env_number, TelegramConfig};
pub use polling::{poll_updates, run_polling};
