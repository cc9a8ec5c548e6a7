//! Monthly attendance timesheet: period resolution, day-by-day aggregation
//! and xlsx rendering.

pub mod builder;
pub mod calendar;
pub mod period;
pub mod xlsx;

pub use builder::build_report;
pub use period::{ReportPeriod, YearMonth};
