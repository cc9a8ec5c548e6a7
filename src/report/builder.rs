use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::model::{attendance::Attendance, worker::Worker};
use crate::report::calendar::{is_sunday, month_days};
use crate::report::period::YearMonth;

pub const NAME_HEADER: &str = "ФИО";
pub const TOTAL_HEADER: &str = "Итого за месяц";
pub const WORKED_DAYS_HEADER: &str = "Отработано дней";
pub const MISSED_DAYS_HEADER: &str = "Пропущено дней";

pub const IN_PROGRESS: &str = "в процессе";
pub const NO_RECORD: &str = "-";

/// Fixed lunch hour taken off each worker's monthly total.
pub const LUNCH_BREAK_SECONDS: i64 = 3600;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellStyle {
    Sunday,
    Missed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub text: String,
    pub style: Option<CellStyle>,
}

/// Result of looking at one worker on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayEvaluation {
    pub cell: DayCell,
    pub worked_seconds: i64,
    pub worked: bool,
    pub missed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub full_name: String,
    pub days: Vec<DayCell>,
    pub total: String,
    pub worked_days: u32,
    pub missed_days: u32,
}

impl ReportRow {
    pub fn to_strings(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.days.len() + 4);
        out.push(self.full_name.clone());
        out.extend(self.days.iter().map(|c| c.text.clone()));
        out.push(self.total.clone());
        out.push(self.worked_days.to_string());
        out.push(self.missed_days.to_string());
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceTable {
    pub period: YearMonth,
    pub header: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl AttendanceTable {
    /// Header followed by every worker row, as plain cell text.
    pub fn to_strings(&self) -> Vec<Vec<String>> {
        std::iter::once(self.header.clone())
            .chain(self.rows.iter().map(ReportRow::to_strings))
            .collect()
    }
}

/// Per-worker lookup of attendance by date.
///
/// Records dated outside the month are dropped. If two records share a date
/// the one that comes later in the input wins.
pub struct AttendanceIndex<'a> {
    by_date: HashMap<NaiveDate, &'a Attendance>,
}

impl<'a> AttendanceIndex<'a> {
    pub fn for_month(records: &'a [Attendance], ym: YearMonth) -> Self {
        let by_date = records
            .iter()
            .filter(|r| YearMonth::of(r.date) == ym)
            .map(|r| (r.date, r))
            .collect();
        Self { by_date }
    }

    pub fn get(&self, date: NaiveDate) -> Option<&'a Attendance> {
        self.by_date.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }
}

/// "<H> ч. <M> мин." using floor division, so negative totals stay readable.
pub fn format_duration(seconds: i64) -> String {
    let hours = seconds.div_euclid(3600);
    let minutes = seconds.rem_euclid(3600) / 60;
    format!("{hours} ч. {minutes} мин.")
}

/// Seconds from `start` to `end` on one calendar day. An end before the start
/// wraps around midnight instead of going negative.
pub fn same_day_seconds(start: NaiveTime, end: NaiveTime) -> i64 {
    (end - start).num_seconds().rem_euclid(SECONDS_PER_DAY)
}

pub fn evaluate_day(record: Option<&Attendance>, date: NaiveDate, today: NaiveDate) -> DayEvaluation {
    let sunday = is_sunday(date);
    let elapsed = date <= today;

    let started = record.and_then(|r| r.start_time.map(|start| (start, r.end_time)));
    let (text, worked_seconds, worked, missed) = match started {
        Some((_, None)) => (IN_PROGRESS.to_string(), 0, true, false),
        Some((start, Some(end))) => {
            let seconds = same_day_seconds(start, end);
            (format_duration(seconds), seconds, true, false)
        }
        None => (NO_RECORD.to_string(), 0, false, !sunday && elapsed),
    };

    let style = if !elapsed {
        None
    } else if sunday {
        Some(CellStyle::Sunday)
    } else if text == NO_RECORD {
        Some(CellStyle::Missed)
    } else {
        None
    };

    DayEvaluation {
        cell: DayCell { text, style },
        worked_seconds,
        worked,
        missed,
    }
}

pub fn build_row(worker: &Worker, records: &[Attendance], days: &[NaiveDate], today: NaiveDate) -> ReportRow {
    let mut cells = Vec::with_capacity(days.len());
    let mut total_seconds = 0i64;
    let mut worked_days = 0u32;
    let mut missed_days = 0u32;

    let index = match days.first() {
        Some(first) => AttendanceIndex::for_month(records, YearMonth::of(*first)),
        None => AttendanceIndex::for_month(&[], YearMonth::of(today)),
    };

    for &date in days {
        let day = evaluate_day(index.get(date), date, today);
        total_seconds += day.worked_seconds;
        if day.worked {
            worked_days += 1;
        }
        if day.missed {
            missed_days += 1;
        }
        cells.push(day.cell);
    }

    // One lunch hour per worker comes off the month total, not one per worked day.
    total_seconds -= LUNCH_BREAK_SECONDS;

    ReportRow {
        full_name: worker.full_name(),
        days: cells,
        total: format_duration(total_seconds),
        worked_days,
        missed_days,
    }
}

pub fn header_row(days: &[NaiveDate]) -> Vec<String> {
    let mut header = Vec::with_capacity(days.len() + 4);
    header.push(NAME_HEADER.to_string());
    header.extend(days.iter().map(|d| d.format("%d").to_string()));
    header.push(TOTAL_HEADER.to_string());
    header.push(WORKED_DAYS_HEADER.to_string());
    header.push(MISSED_DAYS_HEADER.to_string());
    header
}

/// Builds the monthly timesheet. Rows follow the order of `workers`; a worker
/// without an entry in `records` gets an all-empty row.
pub fn build_report(
    period: YearMonth,
    today: NaiveDate,
    workers: &[Worker],
    records: &HashMap<i64, Vec<Attendance>>,
) -> AttendanceTable {
    let days = month_days(period);
    let rows = workers
        .iter()
        .map(|w| {
            let worker_records = records.get(&w.id).map(Vec::as_slice).unwrap_or(&[]);
            build_row(w, worker_records, &days, today)
        })
        .collect();

    AttendanceTable {
        period,
        header: header_row(&days),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn may() -> YearMonth {
        YearMonth::new(2025, 5).unwrap()
    }

    fn worker(id: i64, first: &str) -> Worker {
        Worker {
            id,
            first_name: Some(first.to_string()),
            last_name: Some("Каримов".to_string()),
            middle_name: None,
        }
    }

    fn record(day: u32, start: Option<NaiveTime>, end: Option<NaiveTime>) -> Attendance {
        Attendance {
            worker_id: 1,
            date: date(day),
            start_time: start,
            end_time: end,
            is_absent: false,
        }
    }

    fn single(records: Vec<Attendance>) -> AttendanceTable {
        let mut map = HashMap::new();
        map.insert(1, records);
        build_report(may(), date(15), &[worker(1, "Алишер")], &map)
    }

    #[test]
    fn header_has_name_days_and_summary() {
        let table = build_report(may(), date(15), &[], &HashMap::new());
        assert_eq!(table.header.len(), 1 + 31 + 3);
        assert_eq!(table.header[0], NAME_HEADER);
        assert_eq!(table.header[1], "01");
        assert_eq!(table.header[9], "09");
        assert_eq!(table.header[31], "31");
        assert_eq!(&table.header[32..], &[TOTAL_HEADER, WORKED_DAYS_HEADER, MISSED_DAYS_HEADER]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn worker_without_records_misses_elapsed_weekdays() {
        let table = single(Vec::new());
        let row = &table.rows[0];

        assert_eq!(row.days.len(), 31);
        assert!(row.days.iter().all(|c| c.text == NO_RECORD));
        // May 1..15 minus Sundays 4 and 11
        assert_eq!(row.missed_days, 13);
        assert_eq!(row.worked_days, 0);
        assert_eq!(row.total, "-1 ч. 0 мин.");
    }

    #[test]
    fn styles_only_apply_up_to_today() {
        let table = single(Vec::new());
        let days = &table.rows[0].days;

        assert_eq!(days[0].style, Some(CellStyle::Missed));
        assert_eq!(days[3].style, Some(CellStyle::Sunday));
        assert_eq!(days[10].style, Some(CellStyle::Sunday));
        assert_eq!(days[14].style, Some(CellStyle::Missed));
        // 16th onwards, Sundays included, stay plain
        assert!(days[15..].iter().all(|c| c.style.is_none()));
    }

    #[test]
    fn completed_day_shows_duration_and_counts_as_worked() {
        let table = single(vec![record(5, Some(time(8, 0, 0)), Some(time(17, 30, 15)))]);
        let row = &table.rows[0];

        assert_eq!(row.days[4].text, "9 ч. 30 мин.");
        assert_eq!(row.days[4].style, None);
        assert_eq!(row.worked_days, 1);
        assert_eq!(row.missed_days, 12);
        // 34215 s worked minus the lunch hour
        assert_eq!(row.total, "8 ч. 30 мин.");
    }

    #[test]
    fn open_day_is_in_progress_and_adds_nothing() {
        let table = single(vec![
            record(5, Some(time(8, 0, 0)), Some(time(12, 0, 0))),
            record(15, Some(time(8, 0, 0)), None),
        ]);
        let row = &table.rows[0];

        assert_eq!(row.days[14].text, IN_PROGRESS);
        assert_eq!(row.days[14].style, None);
        assert_eq!(row.worked_days, 2);
        assert_eq!(row.missed_days, 11);
        assert_eq!(row.total, "3 ч. 0 мин.");
    }

    #[test]
    fn lunch_is_deducted_once_per_worker() {
        let records = (5..=9)
            .map(|d| record(d, Some(time(9, 0, 0)), Some(time(18, 0, 0))))
            .collect();
        let row = &single(records).rows[0];

        assert_eq!(row.worked_days, 5);
        assert_eq!(row.total, "44 ч. 0 мин.");
    }

    #[test]
    fn end_without_start_is_a_missing_day() {
        let row = &single(vec![record(6, None, Some(time(17, 0, 0)))]).rows[0];
        assert_eq!(row.days[5].text, NO_RECORD);
        assert_eq!(row.days[5].style, Some(CellStyle::Missed));
        assert_eq!(row.missed_days, 13);
    }

    #[test]
    fn sunday_work_keeps_sunday_style() {
        let row = &single(vec![record(11, Some(time(10, 0, 0)), Some(time(12, 15, 0)))]).rows[0];
        assert_eq!(row.days[10].text, "2 ч. 15 мин.");
        assert_eq!(row.days[10].style, Some(CellStyle::Sunday));
        assert_eq!(row.worked_days, 1);
        assert_eq!(row.missed_days, 13);
    }

    #[test]
    fn absent_flag_does_not_change_the_outcome() {
        let mut r = record(5, Some(time(8, 0, 0)), Some(time(9, 0, 0)));
        r.is_absent = true;
        let row = &single(vec![r]).rows[0];
        assert_eq!(row.days[4].text, "1 ч. 0 мин.");
        assert_eq!(row.worked_days, 1);

        let mut r = record(6, None, None);
        r.is_absent = false;
        let row = &single(vec![r]).rows[0];
        assert_eq!(row.days[5].text, NO_RECORD);
        assert_eq!(row.missed_days, 13);
    }

    #[test]
    fn future_records_are_still_shown() {
        let row = &single(vec![record(20, Some(time(8, 0, 0)), Some(time(10, 0, 0)))]).rows[0];
        assert_eq!(row.days[19].text, "2 ч. 0 мин.");
        assert_eq!(row.days[19].style, None);
        assert_eq!(row.worked_days, 1);
    }

    #[test]
    fn end_before_start_wraps_past_midnight() {
        assert_eq!(same_day_seconds(time(22, 0, 0), time(6, 0, 0)), 8 * 3600);
        let row = &single(vec![record(7, Some(time(22, 0, 0)), Some(time(6, 0, 0)))]).rows[0];
        assert_eq!(row.days[6].text, "8 ч. 0 мин.");
    }

    #[test]
    fn duplicate_dates_keep_the_later_record() {
        let records = vec![
            record(5, Some(time(8, 0, 0)), Some(time(9, 0, 0))),
            record(5, Some(time(8, 0, 0)), Some(time(12, 0, 0))),
        ];
        let index = AttendanceIndex::for_month(&records, may());
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(date(5)).and_then(|r| r.end_time), Some(time(12, 0, 0)));
    }

    #[test]
    fn records_outside_month_are_ignored() {
        let mut april = record(5, Some(time(8, 0, 0)), Some(time(9, 0, 0)));
        april.date = NaiveDate::from_ymd_opt(2025, 4, 5).unwrap();
        let index = AttendanceIndex::for_month(std::slice::from_ref(&april), may());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn past_month_counts_every_weekday() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let table = build_report(may(), today, &[worker(1, "А")], &HashMap::new());
        // 31 days minus 4 Sundays
        assert_eq!(table.rows[0].missed_days, 27);
    }

    #[test]
    fn future_month_counts_nothing() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 30).unwrap();
        let table = build_report(may(), today, &[worker(1, "А")], &HashMap::new());
        assert_eq!(table.rows[0].missed_days, 0);
        assert!(table.rows[0].days.iter().all(|c| c.style.is_none()));
    }

    #[test]
    fn rows_follow_worker_order() {
        let workers = vec![worker(2, "Бобур"), worker(1, "Алишер")];
        let mut map = HashMap::new();
        map.insert(1, vec![record(5, Some(time(8, 0, 0)), None)]);
        let table = build_report(may(), date(15), &workers, &map);

        assert_eq!(table.rows[0].full_name, "Каримов Бобур ");
        assert_eq!(table.rows[0].worked_days, 0);
        assert_eq!(table.rows[1].full_name, "Каримов Алишер ");
        assert_eq!(table.rows[1].worked_days, 1);
    }

    #[test]
    fn to_strings_matches_header_width() {
        let table = single(vec![record(5, Some(time(8, 0, 0)), None)]);
        let grid = table.to_strings();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[1].len(), grid[0].len());
        assert_eq!(grid[1][5], IN_PROGRESS);
        assert_eq!(grid[1][33], "1");
        assert_eq!(grid[1][34], "12");
    }

    #[test]
    fn format_duration_floors() {
        assert_eq!(format_duration(0), "0 ч. 0 мин.");
        assert_eq!(format_duration(3599), "0 ч. 59 мин.");
        assert_eq!(format_duration(-3000), "-1 ч. 10 мин.");
    }
}
