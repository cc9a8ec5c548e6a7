//! Post-commit side effects: Telegram notifications and bot-side cleanup.

pub mod dispatcher;
pub mod events;
pub mod store;
pub mod telegram;
pub mod translations;

pub use events::{DomainEvent, EventBus};
