use std::collections::HashMap;

use actix_web::{HttpResponse, http::header, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::IntoParams;

use crate::config::Config;
use crate::db::Databases;
use crate::model::{attendance::Attendance, role::Role, worker::Worker};
use crate::models::ApiError;
use crate::report::{
    YearMonth, ReportPeriod, build_report,
    calendar::month_days,
    xlsx::{self, XLSX_MIME},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// `current_month` (default) or `prev_month`
    #[param(example = "prev_month")]
    pub period: Option<String>,
}

/// Workers in timesheet row order.
pub async fn fetch_workers(pool: &MySqlPool) -> Result<Vec<Worker>, sqlx::Error> {
    sqlx::query_as::<_, Worker>(
        r#"
        SELECT id, first_name, last_name, middle_name
        FROM api_user
        WHERE role = ?
        ORDER BY first_name
        "#,
    )
    .bind(Role::Worker.as_ref())
    .fetch_all(pool)
    .await
}

/// Attendance of every worker for the month, from the bot database.
pub async fn fetch_month_attendance(
    pool: &MySqlPool,
    period: YearMonth,
) -> Result<HashMap<i64, Vec<Attendance>>, sqlx::Error> {
    let days = month_days(period);
    let (Some(first), Some(last)) = (days.first(), days.last()) else {
        return Ok(HashMap::new());
    };

    let rows = sqlx::query_as::<_, Attendance>(
        r#"
        SELECT a.worker_id, d.date, a.start_time, a.end_time, a.is_absent
        FROM attendance a
        JOIN day d ON d.id = a.day_id
        WHERE d.date BETWEEN ? AND ?
        ORDER BY a.id
        "#,
    )
    .bind(first)
    .bind(last)
    .fetch_all(pool)
    .await?;

    Ok(group_by_worker(rows))
}

pub fn group_by_worker(rows: Vec<Attendance>) -> HashMap<i64, Vec<Attendance>> {
    let mut grouped: HashMap<i64, Vec<Attendance>> = HashMap::new();
    for row in rows {
        grouped.entry(row.worker_id).or_default().push(row);
    }
    grouped
}

/// Download the monthly attendance timesheet
#[utoipa::path(
    get,
    path = "/api/download-attendance-report",
    params(ReportQuery),
    responses(
        (status = 200, description = "Timesheet workbook (xlsx attachment)"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn download_attendance_report(
    dbs: web::Data<Databases>,
    config: web::Data<Config>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, ApiError> {
    let today = config.today();
    let period = YearMonth::resolve(ReportPeriod::from_token(query.period.as_deref()), today);

    let workers = fetch_workers(&dbs.main).await?;
    let records = fetch_month_attendance(&dbs.bot, period).await?;

    let worker_count = workers.len();
    let bytes = web::block(move || {
        let table = build_report(period, today, &workers, &records);
        xlsx::render(&table)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "Report worker thread failed");
        ApiError::Internal
    })?
    .map_err(|e| {
        error!(error = %e, "Failed to render attendance workbook");
        ApiError::Internal
    })?;

    info!(
        year = period.year,
        month = period.month,
        workers = worker_count,
        "Attendance report generated"
    );

    let file_name = xlsx::report_file_name(period);
    Ok(HttpResponse::Ok()
        .content_type(XLSX_MIME)
        .insert_header((header::CONTENT_DISPOSITION, xlsx::content_disposition(&file_name)))
        .body(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(worker_id: i64, day: u32) -> Attendance {
        Attendance {
            worker_id,
            date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
            start_time: None,
            end_time: None,
            is_absent: true,
        }
    }

    #[test]
    fn rows_are_grouped_per_worker_in_input_order() {
        let grouped = group_by_worker(vec![row(1, 2), row(2, 2), row(1, 3)]);
        assert_eq!(grouped.len(), 2);
        let days: Vec<_> = grouped[&1].iter().map(|r| r.date).collect();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2025, 5, 2).unwrap(),
                NaiveDate::from_ymd_opt(2025, 5, 3).unwrap()
            ]
        );
        assert_eq!(grouped[&2].len(), 1);
    }

    #[test]
    fn query_period_is_optional() {
        let q: web::Query<ReportQuery> = web::Query::from_query("").unwrap();
        assert_eq!(ReportPeriod::from_token(q.period.as_deref()), ReportPeriod::CurrentMonth);

        let q: web::Query<ReportQuery> = web::Query::from_query("period=prev_month").unwrap();
        assert_eq!(ReportPeriod::from_token(q.period.as_deref()), ReportPeriod::PrevMonth);
    }
}
