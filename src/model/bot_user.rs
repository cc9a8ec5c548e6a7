use serde::{Deserialize, Serialize};

/// Bot-side profile; only the chosen interface language is used here.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BotUser {
    pub telegram_id: String,
    pub lang: String,
}
