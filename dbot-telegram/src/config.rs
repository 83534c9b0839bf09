//! Minimal transport config: token, API URL and polling timeout.
//! Loaded from BOT_TOKEN, TELEGRAM_API_URL (or TELOXIDE_API_URL) and POLL_TIMEOUT_SECS.

use anyhow::Result;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

const DEFAULT_POLL_TIMEOUT_SECS: u32 = 30;

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub telegram_api_url: Option<String>,
    /// Long-polling timeout passed to getUpdates.
    pub poll_timeout_secs: u32,
}

impl TelegramConfig {
    /// BOT_TOKEN is required; the rest is optional.
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?;
        Self::with_token(bot_token).with_env_overrides()
    }

    /// Given token, default everything else.
    pub fn with_token(bot_token: String) -> Self {
        Self {
            bot_token,
            telegram_api_url: None,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
        }
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        self.telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        self.poll_timeout_secs = env_number("POLL_TIMEOUT_SECS", DEFAULT_POLL_TIMEOUT_SECS)?;
        Ok(self)
    }

    /// telegram_api_url must be a valid URL if set.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        Ok(())
    }

    /// Builds the teloxide client, pointed at `telegram_api_url` when set.
    pub fn build_bot(&self) -> Result<teloxide::Bot> {
        self.validate()?;
        let bot = teloxide::Bot::new(self.bot_token.clone());
        Ok(match &self.telegram_api_url {
            Some(url_str) => bot.set_api_url(reqwest::Url::parse(url_str)?),
            None => bot,
        })
    }
}

/// Reads `key` as a number; unset means `default`, anything unparsable is an error.
pub fn env_number<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => Ok(value),
            Err(e) => anyhow::bail!("{key} is set but not a valid number: {raw:?} ({e})"),
        },
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in ["BOT_TOKEN", "TELEGRAM_API_URL", "TELOXIDE_API_URL", "POLL_TIMEOUT_SECS"] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_with_token() {
        let config = TelegramConfig::with_token("test_token".to_string());
        assert_eq!(config.bot_token, "test_token");
        assert!(config.telegram_api_url.is_none());
        assert_eq!(config.poll_timeout_secs, 30);
    }

    #[test]
    #[serial]
    fn test_from_env_requires_token() {
        clear_env();
        assert!(TelegramConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_reads_fallback_url_and_timeout() {
        clear_env();
        env::set_var("BOT_TOKEN", "t");
        env::set_var("TELOXIDE_API_URL", "http://127.0.0.1:8081");
        env::set_var("POLL_TIMEOUT_SECS", "5");

        let config = TelegramConfig::from_env().unwrap();

        assert_eq!(config.telegram_api_url.as_deref(), Some("http://127.0.0.1:8081"));
        assert_eq!(config.poll_timeout_secs, 5);
        assert!(config.validate().is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_unparsable_timeout() {
        clear_env();
        env::set_var("BOT_TOKEN", "t");
        env::set_var("POLL_TIMEOUT_SECS", "thirty");

        let err = TelegramConfig::from_env().unwrap_err();

        assert!(err.to_string().contains("POLL_TIMEOUT_SECS"));
        clear_env();
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = TelegramConfig::with_token("t".to_string());
        config.telegram_api_url = Some("not a url".to_string());
        assert!(config.validate().is_err());
        assert!(config.build_bot().is_err());
    }
}
