use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Which month the timesheet covers, as chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportPeriod {
    #[default]
    CurrentMonth,
    PrevMonth,
}

impl ReportPeriod {
    /// Anything other than `prev_month` (including no token) means the current month.
    pub fn from_token(token: Option<&str>) -> Self {
        match token {
            Some("prev_month") => ReportPeriod::PrevMonth,
            _ => ReportPeriod::CurrentMonth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Resolve a period relative to `today`.
    pub fn resolve(period: ReportPeriod, today: NaiveDate) -> Self {
        let current = Self::of(today);
        match period {
            ReportPeriod::CurrentMonth => current,
            ReportPeriod::PrevMonth => current.previous(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn unknown_tokens_fall_back_to_current_month() {
        assert_eq!(ReportPeriod::from_token(None), ReportPeriod::CurrentMonth);
        assert_eq!(ReportPeriod::from_token(Some("current_month")), ReportPeriod::CurrentMonth);
        assert_eq!(ReportPeriod::from_token(Some("last_year")), ReportPeriod::CurrentMonth);
        assert_eq!(ReportPeriod::from_token(Some("PREV_MONTH")), ReportPeriod::CurrentMonth);
        assert_eq!(ReportPeriod::from_token(Some("prev_month")), ReportPeriod::PrevMonth);
    }

    #[test]
    fn current_month_is_today_month() {
        let ym = YearMonth::resolve(ReportPeriod::CurrentMonth, date(2025, 5, 15));
        assert_eq!(ym, YearMonth { year: 2025, month: 5 });
    }

    #[test]
    fn prev_month_within_year() {
        let ym = YearMonth::resolve(ReportPeriod::PrevMonth, date(2025, 5, 15));
        assert_eq!(ym, YearMonth { year: 2025, month: 4 });
    }

    #[test]
    fn prev_month_wraps_january_to_december() {
        let ym = YearMonth::resolve(ReportPeriod::PrevMonth, date(2025, 1, 3));
        assert_eq!(ym, YearMonth { year: 2024, month: 12 });
    }

    #[test]
    fn new_rejects_invalid_month() {
        assert!(YearMonth::new(2025, 0).is_none());
        assert!(YearMonth::new(2025, 13).is_none());
        assert!(YearMonth::new(2025, 12).is_some());
    }
}
