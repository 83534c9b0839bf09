//! # dbot-cli
//!
//! CLI foundation: argument parsing, config loading and the demo handler set.

pub mod cli;
pub mod config;
pub mod handlers;

pub use cli::{load_config, Cli, Commands};
pub use config::BotConfig;
pub use handlers::register_demo_handlers;
