use anyhow::{Context, Result};
use chrono::{FixedOffset, NaiveDate, Utc};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub server_addr: String,
    /// Back-office database: users, brigades, tasks, finished works.
    pub database_url: String,
    /// Telegram bot database: days, attendance, bot users.
    pub bot_database_url: String,
    /// Shared secret the bot and back office send as a bearer token.
    pub api_token: String,
    pub telegram_bot_token: String,

    // Rate limiting
    pub rate_api_per_min: u32,

    pub api_prefix: String,
    /// Offset of the business time zone, Asia/Tashkent by default.
    pub utc_offset_hours: i32,
    pub log_dir: String,
    /// Root for uploaded document photos.
    pub media_dir: String,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn optional<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{key} is not valid"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let config = Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            bot_database_url: required("BOT_DATABASE_URL")?,
            api_token: required("API_TOKEN")?,
            telegram_bot_token: required("TELEGRAM_BOT_TOKEN")?,

            rate_api_per_min: optional("RATE_API_PER_MIN", "600")?,

            api_prefix: optional("API_PREFIX", "/api")?,
            utc_offset_hours: optional("UTC_OFFSET_HOURS", "5")?,
            log_dir: optional("LOG_DIR", "logs")?,
            media_dir: optional("MEDIA_DIR", "media")?,
        };
        config.time_zone()?;
        Ok(config)
    }

    pub fn time_zone(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .with_context(|| format!("UTC_OFFSET_HOURS out of range: {}", self.utc_offset_hours))
    }

    /// Calendar date in the business time zone.
    pub fn today(&self) -> NaiveDate {
        match self.time_zone() {
            Ok(offset) => Utc::now().with_timezone(&offset).date_naive(),
            Err(_) => Utc::now().date_naive(),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".into(),
        database_url: "mysql://localhost/crewdesk".into(),
        bot_database_url: "mysql://localhost/bot".into(),
        api_token: "secret-token".into(),
        telegram_bot_token: "123:abc".into(),
        rate_api_per_min: 600,
        api_prefix: "/api".into(),
        utc_offset_hours: 5,
        log_dir: "logs".into(),
        media_dir: "media".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_zone_uses_configured_offset() {
        let config = test_config();
        assert_eq!(config.time_zone().unwrap().local_minus_utc(), 5 * 3600);
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let mut config = test_config();
        config.utc_offset_hours = 30;
        assert!(config.time_zone().is_err());
    }
}
