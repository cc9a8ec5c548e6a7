use anyhow::Result;
use futures_util::StreamExt;
use moka::future::Cache;
use once_cell::sync::Lazy;
use sqlx::MySqlPool;
use std::time::Duration;

use crate::model::bot_user::BotUser;

/// telegram_id => bot interface language
pub static BOT_LANG_CACHE: Lazy<Cache<String, String>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(50_000)
        .time_to_live(Duration::from_secs(6 * 3600)) // users can switch language in the bot
        .build()
});

pub async fn remember(telegram_id: &str, lang: &str) {
    BOT_LANG_CACHE
        .insert(telegram_id.to_string(), lang.to_string())
        .await;
}

pub async fn cached(telegram_id: &str) -> Option<String> {
    BOT_LANG_CACHE.get(telegram_id).await
}

pub async fn forget(telegram_id: &str) {
    BOT_LANG_CACHE.invalidate(telegram_id).await;
}

/// Load every bot user's language into the cache, in batches.
pub async fn warmup_lang_cache(pool: &MySqlPool, batch_size: usize) -> Result<()> {
    let mut stream =
        sqlx::query_as::<_, BotUser>("SELECT telegram_id, lang FROM botuser").fetch(pool);

    let mut batch = Vec::with_capacity(batch_size);
    let mut total = 0usize;

    while let Some(row) = stream.next().await {
        batch.push(row?);
        total += 1;

        if batch.len() >= batch_size {
            insert_batch(&batch).await;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        insert_batch(&batch).await;
    }

    tracing::info!(total, "Bot language cache warmup complete");
    Ok(())
}

async fn insert_batch(rows: &[BotUser]) {
    let futures: Vec<_> = rows
        .iter()
        .map(|u| BOT_LANG_CACHE.insert(u.telegram_id.clone(), u.lang.clone()))
        .collect();

    futures::future::join_all(futures).await;
}
