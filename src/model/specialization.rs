use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Specialization {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "Электрик")]
    pub name: String,
    #[schema(example = "2025-05-01T09:00:00", format = "date-time", value_type = String)]
    pub created: NaiveDateTime,
    #[schema(example = "2025-05-01T09:00:00", format = "date-time", value_type = String)]
    pub updated: NaiveDateTime,
}
