use chrono::{Datelike, NaiveDate, Weekday};

use crate::report::period::YearMonth;

/// Every date of the month, first to last.
pub fn month_days(ym: YearMonth) -> Vec<NaiveDate> {
    (1..=days_in_month(ym))
        .filter_map(|day| NaiveDate::from_ymd_opt(ym.year, ym.month, day))
        .collect()
}

pub fn days_in_month(ym: YearMonth) -> u32 {
    let next = ym_after(ym);
    match (
        NaiveDate::from_ymd_opt(ym.year, ym.month, 1),
        NaiveDate::from_ymd_opt(next.year, next.month, 1),
    ) {
        (Some(start), Some(end)) => (end - start).num_days() as u32,
        _ => 0,
    }
}

pub fn is_sunday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Sun
}

fn ym_after(ym: YearMonth) -> YearMonth {
    if ym.month == 12 {
        YearMonth {
            year: ym.year + 1,
            month: 1,
        }
    } else {
        YearMonth {
            year: ym.year,
            month: ym.month + 1,
        }
    }
}
