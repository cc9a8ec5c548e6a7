use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::brigade::BrigadeView;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub deadline: NaiveDate,
    pub is_done: bool,
    pub created: NaiveDateTime,
    pub updated: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TaskView {
    #[schema(example = 12)]
    pub id: i64,
    #[schema(example = "Монтаж освещения")]
    pub name: String,
    pub description: String,
    #[schema(example = "2025-05-31", format = "date", value_type = String)]
    pub deadline: NaiveDate,
    pub is_done: bool,
    #[schema(format = "date-time", value_type = String)]
    pub created: NaiveDateTime,
    #[schema(format = "date-time", value_type = String)]
    pub updated: NaiveDateTime,
    pub brigades: Vec<BrigadeView>,
}

impl TaskView {
    pub fn new(row: TaskRow, brigades: Vec<BrigadeView>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            deadline: row.deadline,
            is_done: row.is_done,
            created: row.created,
            updated: row.updated,
            brigades,
        }
    }
}
