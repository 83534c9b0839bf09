//! Bot config loaded from env (and `.env` via dotenvy in main).

use anyhow::Result;
use dbot_telegram::{env_number, TelegramConfig};
use std::env;

/// Everything `dbot run` needs.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// BOT_TOKEN, or `--token`
    pub bot_token: String,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// LOG_FILE; empty disables the file sink
    pub log_file: Option<String>,
    /// CONCURRENT_UPDATES
    pub concurrent_updates: usize,
    /// POLL_TIMEOUT_SECS
    pub poll_timeout_secs: u32,
}

impl BotConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(token) => token,
            None => env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?,
        };
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let log_file = match env::var("LOG_FILE") {
            Ok(path) if path.is_empty() => None,
            Ok(path) => Some(path),
            Err(_) => Some("logs/dbot.log".to_string()),
        };
        let concurrent_updates = env_number("CONCURRENT_UPDATES", 1)?;
        let poll_timeout_secs = env_number("POLL_TIMEOUT_SECS", 30)?;

        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
            concurrent_updates,
            poll_timeout_secs,
        })
    }

    /// Validate config (e.g. telegram_api_url must be valid URL if set).
    pub fn validate(&self) -> Result<()> {
        if self.concurrent_updates == 0 {
            anyhow::bail!("CONCURRENT_UPDATES must be at least 1");
        }
        self.telegram().validate()
    }

    /// Transport part of the config.
    pub fn telegram(&self) -> TelegramConfig {
        TelegramConfig {
            bot_token: self.bot_token.clone(),
            telegram_api_url: self.telegram_api_url.clone(),
            poll_timeout_secs: self.poll_timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 6] = [
        "BOT_TOKEN",
        "TELEGRAM_API_URL",
        "TELOXIDE_API_URL",
        "LOG_FILE",
        "CONCURRENT_UPDATES",
        "POLL_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for key in KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_load_config_with_defaults() {
        clear_env();
        env::set_var("BOT_TOKEN", "test_token");

        let config = BotConfig::load(None).unwrap();

        assert_eq!(config.bot_token, "test_token");
        assert!(config.telegram_api_url.is_none());
        assert_eq!(config.log_file.as_deref(), Some("logs/dbot.log"));
        assert_eq!(config.concurrent_updates, 1);
        assert_eq!(config.poll_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_config_with_custom_values() {
        clear_env();
        env::set_var("BOT_TOKEN", "custom_token");
        env::set_var("TELEGRAM_API_URL", "http://localhost:8081");
        env::set_var("LOG_FILE", "");
        env::set_var("CONCURRENT_UPDATES", "4");
        env::set_var("POLL_TIMEOUT_SECS", "10");

        let config = BotConfig::load(None).unwrap();

        assert_eq!(config.telegram_api_url.as_deref(), Some("http://localhost:8081"));
        assert!(config.log_file.is_none());
        assert_eq!(config.concurrent_updates, 4);
        assert_eq!(config.telegram().poll_timeout_secs, 10);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_config_with_override_token() {
        clear_env();
        env::set_var("BOT_TOKEN", "env_token");

        let config = BotConfig::load(Some("override_token".to_string())).unwrap();

        assert_eq!(config.bot_token, "override_token");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_load_config_without_token_fails() {
        clear_env();
        assert!(BotConfig::load(None).is_err());
    }

    #[test]
    #[serial]
    fn test_load_config_rejects_unparsable_numbers() {
        clear_env();
        env::set_var("CONCURRENT_UPDATES", "four");
        let err = BotConfig::load(Some("t".to_string())).unwrap_err();
        assert!(err.to_string().contains("CONCURRENT_UPDATES"));

        clear_env();
        env::set_var("POLL_TIMEOUT_SECS", "-1");
        assert!(BotConfig::load(Some("t".to_string())).is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_validate_rejects_invalid_values() {
        clear_env();
        env::set_var("TELEGRAM_API_URL", "not a url");
        let config = BotConfig::load(Some("t".to_string())).unwrap();
        assert!(config.validate().is_err());

        clear_env();
        env::set_var("CONCURRENT_UPDATES", "0");
        let config = BotConfig::load(Some("t".to_string())).unwrap();
        assert!(config.validate().is_err());
        clear_env();
    }
}
