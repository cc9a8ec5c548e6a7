use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::FromRow;
use strum_macros::Display;

use crate::db::Databases;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RecipientKind {
    Foreman,
    Worker,
}

#[derive(Debug, Clone, FromRow)]
pub struct Recipient {
    pub telegram_id: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone)]
pub struct BrigadeRecipients {
    pub brigade_id: i64,
    pub foreman: Option<Recipient>,
    pub workers: Vec<Recipient>,
}

#[derive(Debug, Clone, FromRow)]
pub struct TaskNotice {
    pub name: String,
    pub description: String,
    pub deadline: NaiveDate,
}

/// Data the dispatcher needs; SQL-backed in production.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn task_notice(&self, task_id: i64) -> Result<Option<TaskNotice>>;
    async fn brigade_recipients(&self, brigade_ids: &[i64]) -> Result<Vec<BrigadeRecipients>>;
    async fn bot_lang(&self, telegram_id: &str) -> Result<Option<String>>;
    async fn delete_bot_user(&self, telegram_id: &str) -> Result<u64>;
}

pub struct SqlNotificationStore {
    dbs: Databases,
}

impl SqlNotificationStore {
    pub fn new(dbs: Databases) -> Self {
        Self { dbs }
    }
}

#[async_trait]
impl NotificationStore for SqlNotificationStore {
    async fn task_notice(&self, task_id: i64) -> Result<Option<TaskNotice>> {
        let notice = sqlx::query_as::<_, TaskNotice>(
            "SELECT name, description, deadline FROM api_task WHERE id = ?",
        )
        .bind(task_id)
        .fetch_optional(&self.dbs.main)
        .await?;
        Ok(notice)
    }

    async fn brigade_recipients(&self, brigade_ids: &[i64]) -> Result<Vec<BrigadeRecipients>> {
        let mut out = Vec::with_capacity(brigade_ids.len());

        for &brigade_id in brigade_ids {
            let foreman = sqlx::query_as::<_, Recipient>(
                r#"
                SELECT u.telegram_id, u.first_name, u.last_name
                FROM api_brigade b
                JOIN api_user u ON u.id = b.foreman_id
                WHERE b.id = ?
                "#,
            )
            .bind(brigade_id)
            .fetch_optional(&self.dbs.main)
            .await?;

            let workers = sqlx::query_as::<_, Recipient>(
                r#"
                SELECT u.telegram_id, u.first_name, u.last_name
                FROM api_brigade_workers bw
                JOIN api_user u ON u.id = bw.worker_id
                WHERE bw.brigade_id = ?
                ORDER BY u.id
                "#,
            )
            .bind(brigade_id)
            .fetch_all(&self.dbs.main)
            .await?;

            out.push(BrigadeRecipients {
                brigade_id,
                foreman,
                workers,
            });
        }

        Ok(out)
    }

    async fn bot_lang(&self, telegram_id: &str) -> Result<Option<String>> {
        let lang = sqlx::query_scalar::<_, String>("SELECT lang FROM botuser WHERE telegram_id = ?")
            .bind(telegram_id)
            .fetch_optional(&self.dbs.bot)
            .await?;
        Ok(lang)
    }

    async fn delete_bot_user(&self, telegram_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM botuser WHERE telegram_id = ?")
            .bind(telegram_id)
            .execute(&self.dbs.bot)
            .await?;
        Ok(result.rows_affected())
    }
}
