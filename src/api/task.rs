use std::collections::BTreeSet;

use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::db::Databases;
use crate::model::{
    brigade::{BrigadeRow, BrigadeView, MemberView},
    specialization::Specialization,
    task::{TaskRow, TaskView},
    worker::UserSummary,
};
use crate::models::ApiError;
use crate::notify::{DomainEvent, EventBus, translations::Lang};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskQuery {
    /// Telegram id of the foreman or worker asking
    #[param(example = "123456789")]
    pub telegram_id: String,
    /// `ru` (default) or `uz`
    #[param(example = "uz")]
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignBrigades {
    #[schema(example = json!([1, 2]))]
    pub brigade_ids: Vec<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssignBrigadesResponse {
    /// Brigades that were not yet attached to the task
    pub added: Vec<i64>,
}

/// Translated column with fallback to the base column.
fn translated(column: &str, lang: Lang) -> String {
    format!(
        "COALESCE(NULLIF(t.{column}_{}, ''), t.{column}) AS {column}",
        lang.as_ref()
    )
}

fn open_tasks_sql(lang: Lang) -> String {
    format!(
        r#"
        SELECT DISTINCT t.id, {}, {}, t.deadline, t.is_done, t.created, t.updated
        FROM api_task t
        JOIN api_task_brigades tb ON tb.task_id = t.id
        JOIN api_brigade b ON b.id = tb.brigade_id
        LEFT JOIN api_brigade_workers bw ON bw.brigade_id = b.id
        WHERE t.is_done = FALSE
          AND (b.foreman_id = ? OR bw.worker_id = ?)
        ORDER BY t.deadline, t.id
        "#,
        translated("name", lang),
        translated("description", lang),
    )
}

/// Requested ids not yet attached, deduplicated, in ascending order.
fn newly_added(requested: &[i64], existing: &[i64]) -> Vec<i64> {
    let existing: BTreeSet<_> = existing.iter().copied().collect();
    requested
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|id| !existing.contains(id))
        .collect()
}

const USER_SUMMARY_COLUMNS: &str =
    "u.id, u.first_name, u.last_name, u.middle_name, u.telegram_id, u.phone_number, u.specialization_id, u.role";

async fn member_view(pool: &MySqlPool, user: UserSummary) -> Result<MemberView, sqlx::Error> {
    let specialization = match user.specialization_id {
        Some(id) => {
            sqlx::query_as::<_, Specialization>(
                "SELECT id, name, created, updated FROM api_specialization WHERE id = ?",
            )
            .bind(id)
            .fetch_optional(pool)
            .await?
        }
        None => None,
    };
    Ok(MemberView {
        user,
        specialization,
    })
}

async fn brigade_view(pool: &MySqlPool, brigade: BrigadeRow) -> Result<BrigadeView, sqlx::Error> {
    let foreman = sqlx::query_as::<_, UserSummary>(&format!(
        "SELECT {USER_SUMMARY_COLUMNS} FROM api_user u WHERE u.id = ?"
    ))
    .bind(brigade.foreman_id)
    .fetch_one(pool)
    .await?;

    let workers = sqlx::query_as::<_, UserSummary>(&format!(
        r#"
        SELECT {USER_SUMMARY_COLUMNS}
        FROM api_brigade_workers bw
        JOIN api_user u ON u.id = bw.worker_id
        WHERE bw.brigade_id = ?
        ORDER BY u.first_name
        "#
    ))
    .bind(brigade.id)
    .fetch_all(pool)
    .await?;

    let mut worker_views = Vec::with_capacity(workers.len());
    for worker in workers {
        worker_views.push(member_view(pool, worker).await?);
    }

    Ok(BrigadeView {
        id: brigade.id,
        name: brigade.name,
        foreman: member_view(pool, foreman).await?,
        workers: worker_views,
    })
}

/// Open tasks of the brigades a user leads or belongs to
#[utoipa::path(
    get,
    path = "/api/tasks",
    params(TaskQuery),
    responses(
        (status = 200, description = "Open tasks with their brigades", body = [TaskView]),
        (status = 404, description = "User not found", body = Object, example = json!({
            "message": "User not found"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn get_tasks(
    dbs: web::Data<Databases>,
    query: web::Query<TaskQuery>,
) -> Result<HttpResponse, ApiError> {
    let pool = &dbs.main;
    let lang = Lang::from_code(query.lang.as_deref().unwrap_or_default());

    let user_id = sqlx::query_scalar::<_, i64>("SELECT id FROM api_user WHERE telegram_id = ?")
        .bind(&query.telegram_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let tasks = sqlx::query_as::<_, TaskRow>(&open_tasks_sql(lang))
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    let mut views = Vec::with_capacity(tasks.len());
    for task in tasks {
        let brigades = sqlx::query_as::<_, BrigadeRow>(
            r#"
            SELECT b.id, b.name, b.foreman_id
            FROM api_brigade b
            JOIN api_task_brigades tb ON tb.brigade_id = b.id
            WHERE tb.task_id = ?
            ORDER BY b.id
            "#,
        )
        .bind(task.id)
        .fetch_all(pool)
        .await?;

        let mut brigade_views = Vec::with_capacity(brigades.len());
        for brigade in brigades {
            brigade_views.push(brigade_view(pool, brigade).await?);
        }
        views.push(TaskView::new(task, brigade_views));
    }

    Ok(HttpResponse::Ok().json(views))
}

/// Attach brigades to a task and notify their members
#[utoipa::path(
    post,
    path = "/api/tasks/{task_id}/brigades",
    request_body = AssignBrigades,
    params(("task_id", description = "Task ID")),
    responses(
        (status = 200, description = "Brigades attached", body = AssignBrigadesResponse),
        (status = 400, description = "Unknown brigade"),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn assign_brigades(
    dbs: web::Data<Databases>,
    events: web::Data<EventBus>,
    path: web::Path<i64>,
    payload: web::Json<AssignBrigades>,
) -> Result<HttpResponse, ApiError> {
    let task_id = path.into_inner();
    let mut tx = dbs.main.begin().await?;

    sqlx::query_scalar::<_, i64>("SELECT id FROM api_task WHERE id = ? FOR UPDATE")
        .bind(task_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".into()))?;

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT brigade_id FROM api_task_brigades WHERE task_id = ?",
    )
    .bind(task_id)
    .fetch_all(&mut *tx)
    .await?;

    let added = newly_added(&payload.brigade_ids, &existing);
    for &brigade_id in &added {
        let known = sqlx::query_scalar::<_, i64>("SELECT id FROM api_brigade WHERE id = ?")
            .bind(brigade_id)
            .fetch_optional(&mut *tx)
            .await?;
        if known.is_none() {
            return Err(ApiError::BadRequest(format!("Brigade {brigade_id} does not exist")));
        }

        sqlx::query("INSERT INTO api_task_brigades (task_id, brigade_id) VALUES (?, ?)")
            .bind(task_id)
            .bind(brigade_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    if added.is_empty() {
        info!(task_id, "No new brigades to attach");
    } else {
        info!(task_id, brigades = ?added, "Brigades attached to task");
        events.publish(DomainEvent::BrigadesAssigned {
            task_id,
            brigade_ids: added.clone(),
        });
    }

    Ok(HttpResponse::Ok().json(AssignBrigadesResponse { added }))
}

/// Delete a task, keeping its name on finished works
#[utoipa::path(
    delete,
    path = "/api/tasks/{task_id}",
    params(("task_id", description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted", body = Object, example = json!({
            "message": "Task deleted"
        })),
        (status = 404, description = "Task not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Task"
)]
pub async fn delete_task(
    dbs: web::Data<Databases>,
    path: web::Path<i64>,
) -> Result<impl Responder, ApiError> {
    let task_id = path.into_inner();
    let mut tx = dbs.main.begin().await?;

    let name = sqlx::query_scalar::<_, String>("SELECT name FROM api_task WHERE id = ? FOR UPDATE")
        .bind(task_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".into()))?;

    let kept = sqlx::query(
        "UPDATE api_finishedwork SET task_name = ?, task_id = NULL WHERE task_id = ?",
    )
    .bind(&name)
    .bind(task_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    sqlx::query("DELETE FROM api_task_brigades WHERE task_id = ?")
        .bind(task_id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM api_task WHERE id = ?")
        .bind(task_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        warn!(task_id, "Task disappeared during delete");
    }

    tx.commit().await?;
    info!(task_id, finished_works = kept, "Task deleted");

    Ok(HttpResponse::Ok().json(json!({ "message": "Task deleted" })))
}
