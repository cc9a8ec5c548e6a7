use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One row of `attendance` joined with its `day`, as read from the bot database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub worker_id: i64,
    pub date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    // Written by the bot; the timesheet works from start_time only.
    pub is_absent: bool,
}
