use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{specialization::Specialization, worker::UserSummary};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrigadeRow {
    pub id: i64,
    pub name: String,
    pub foreman_id: i64,
}

/// Brigade member with the specialization resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MemberView {
    #[serde(flatten)]
    pub user: UserSummary,
    pub specialization: Option<Specialization>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BrigadeView {
    pub id: i64,
    pub name: String,
    pub foreman: MemberView,
    pub workers: Vec<MemberView>,
}
