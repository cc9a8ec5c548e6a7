use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Name fields of a row in `api_user`; enough to label a timesheet row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "first_name": "Алишер",
        "last_name": "Каримов",
        "middle_name": "Бахтиёрович"
    })
)]
pub struct Worker {
    #[schema(example = 7)]
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
}

impl Worker {
    /// "last first middle", with an empty string for each missing part.
    pub fn full_name(&self) -> String {
        format!(
            "{} {} {}",
            self.last_name.as_deref().unwrap_or(""),
            self.first_name.as_deref().unwrap_or(""),
            self.middle_name.as_deref().unwrap_or(""),
        )
    }
}

/// User as exposed to the bot (`/tasks`, nested in brigades).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct UserSummary {
    #[serde(skip_serializing)]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    #[schema(example = "123456789")]
    pub telegram_id: String,
    #[schema(example = "998901234567")]
    pub phone_number: String,
    #[serde(skip_serializing)]
    pub specialization_id: Option<i64>,
    #[schema(example = "worker")]
    pub role: String,
}
