pub mod bot_lang_cache;
pub mod media;
