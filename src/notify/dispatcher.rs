use anyhow::Result;
use futures::future::join_all;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info, warn};

use crate::notify::events::DomainEvent;
use crate::notify::store::{NotificationStore, Recipient, RecipientKind, TaskNotice};
use crate::notify::telegram::MessageSender;
use crate::notify::translations::{Lang, build_task_message};
use crate::utils::bot_lang_cache;

/// Consumes domain events and performs their side effects.
pub struct Dispatcher<St, Se> {
    store: St,
    sender: Se,
}

impl<St: NotificationStore, Se: MessageSender> Dispatcher<St, Se> {
    pub fn new(store: St, sender: Se) -> Self {
        Self { store, sender }
    }

    pub async fn run(self, mut rx: UnboundedReceiver<DomainEvent>) {
        while let Some(event) = rx.recv().await {
            if let Err(e) = self.handle(&event).await {
                error!(error = %e, ?event, "Event handling failed");
            }
        }
        info!("Event dispatcher stopped");
    }

    /// Returns the number of messages delivered.
    pub async fn handle(&self, event: &DomainEvent) -> Result<usize> {
        match event {
            DomainEvent::BrigadesAssigned {
                task_id,
                brigade_ids,
            } => self.notify_brigades(*task_id, brigade_ids).await,
            DomainEvent::WorkerDeleted { telegram_id } => {
                let removed = self.store.delete_bot_user(telegram_id).await?;
                bot_lang_cache::forget(telegram_id).await;
                info!(telegram_id = %telegram_id, removed, "Bot user removed after worker deletion");
                Ok(0)
            }
        }
    }

    async fn notify_brigades(&self, task_id: i64, brigade_ids: &[i64]) -> Result<usize> {
        let Some(notice) = self.store.task_notice(task_id).await? else {
            warn!(task_id, "Task vanished before notifications were sent");
            return Ok(0);
        };

        let brigades = self.store.brigade_recipients(brigade_ids).await?;
        let mut recipients = Vec::new();
        for brigade in &brigades {
            match &brigade.foreman {
                Some(foreman) => recipients.push((RecipientKind::Foreman, foreman)),
                None => warn!(brigade_id = brigade.brigade_id, "Brigade has no foreman"),
            }
            recipients.extend(brigade.workers.iter().map(|w| (RecipientKind::Worker, w)));
        }

        let sent = join_all(
            recipients
                .into_iter()
                .map(|(kind, recipient)| self.notify_one(kind, recipient, &notice)),
        )
        .await;

        Ok(sent.into_iter().filter(|ok| *ok).count())
    }

    async fn notify_one(&self, kind: RecipientKind, recipient: &Recipient, notice: &TaskNotice) -> bool {
        let lang = match self.lang_for(&recipient.telegram_id).await {
            Ok(Some(code)) => Lang::from_code(&code),
            Ok(None) => {
                warn!(
                    %kind,
                    telegram_id = %recipient.telegram_id,
                    "No bot user for {} {}, message skipped",
                    recipient.first_name,
                    recipient.last_name
                );
                return false;
            }
            Err(e) => {
                error!(%kind, error = %e, "Failed to resolve language for {}", recipient.first_name);
                return false;
            }
        };

        let text = build_task_message(lang, &notice.name, &notice.description, notice.deadline);
        match self.sender.send_message(&recipient.telegram_id, &text).await {
            Ok(()) => {
                info!(%kind, "Message sent to {} {}", recipient.first_name, recipient.last_name);
                true
            }
            Err(e) => {
                error!(%kind, error = %e, "Error sending message to {}", recipient.first_name);
                false
            }
        }
    }

    async fn lang_for(&self, telegram_id: &str) -> Result<Option<String>> {
        if let Some(lang) = bot_lang_cache::cached(telegram_id).await {
            return Ok(Some(lang));
        }
        let lang = self.store.bot_lang(telegram_id).await?;
        if let Some(lang) = &lang {
            bot_lang_cache::remember(telegram_id, lang).await;
        }
        Ok(lang)
    }
}
