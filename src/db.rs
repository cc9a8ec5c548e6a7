use anyhow::{Context, Result};
use sqlx::MySqlPool;

use crate::config::Config;

/// Both databases the service talks to. Handlers pick the pool explicitly:
/// `bot` for days, attendance and bot users, `main` for everything else.
#[derive(Clone)]
pub struct Databases {
    pub main: MySqlPool,
    pub bot: MySqlPool,
}

pub async fn init_db(config: &Config) -> Result<Databases> {
    let main = MySqlPool::connect(&config.database_url)
        .await
        .context("Failed to connect to main database")?;
    let bot = MySqlPool::connect(&config.bot_database_url)
        .await
        .context("Failed to connect to bot database")?;

    Ok(Databases { main, bot })
}
