use actix_web::{HttpResponse, web};

use crate::db::Databases;
use crate::model::specialization::Specialization;
use crate::models::ApiError;

/// List specializations, newest first
#[utoipa::path(
    get,
    path = "/api/specializations",
    responses(
        (status = 200, description = "All specializations", body = [Specialization]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Specialization"
)]
pub async fn get_specializations(dbs: web::Data<Databases>) -> Result<HttpResponse, ApiError> {
    let data = sqlx::query_as::<_, Specialization>(
        "SELECT id, name, created, updated FROM api_specialization ORDER BY created DESC",
    )
    .fetch_all(&dbs.main)
    .await?;

    Ok(HttpResponse::Ok().json(data))
}
