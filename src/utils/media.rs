use std::path::Path;

use chrono::Utc;
use strum_macros::{AsRefStr, EnumString};
use tracing::error;

use crate::models::ApiError;

/// Document photo slots of a user. The name is both the form field and the `api_user` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumString)]
pub enum PhotoField {
    #[strum(serialize = "passport_photo")]
    Passport,
    #[strum(serialize = "id_card_photo1")]
    IdCardFront,
    #[strum(serialize = "id_card_photo2")]
    IdCardBack,
}

/// Directory under the media root that photos land in.
pub const PHOTO_DIR: &str = "photos";

/// Last path component of an uploaded name, limited to `[A-Za-z0-9._-]`.
pub fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Path stored in the database, relative to the media root.
pub fn stored_path(field: PhotoField, file_name: &str, stamp_millis: i64) -> String {
    format!(
        "{PHOTO_DIR}/{}_{stamp_millis}_{}",
        field.as_ref(),
        sanitize_file_name(file_name)
    )
}

pub async fn save_photo(
    media_dir: &str,
    field: PhotoField,
    file_name: &str,
    bytes: &[u8],
) -> Result<String, ApiError> {
    let relative = stored_path(field, file_name, Utc::now().timestamp_millis());
    let target = Path::new(media_dir).join(&relative);

    let write = async {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await
    };
    write.await.map_err(|e| {
        error!(error = %e, path = %target.display(), "Failed to store photo");
        ApiError::Internal
    })?;

    Ok(relative)
}
