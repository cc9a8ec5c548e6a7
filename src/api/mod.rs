pub mod attendance_report;
pub mod specialization;
pub mod task;
pub mod worker;
