//! Spreadsheet rendering of the monthly timesheet.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, XlsxError};

use crate::report::builder::{AttendanceTable, CellStyle};
use crate::report::period::YearMonth;

pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const SHEET_NAME: &str = "Табель";

const SUNDAY_FILL: u32 = 0xFFF2CC;
const MISSED_FILL: u32 = 0xFFC7CE;

/// RFC 5987 attr-char: everything else gets percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

pub fn report_file_name(period: YearMonth) -> String {
    format!("Табель посещаемости за {:02}.{}.xlsx", period.month, period.year)
}

pub fn content_disposition(file_name: &str) -> String {
    format!(
        "attachment; filename*=UTF-8''{}",
        utf8_percent_encode(file_name, ATTR_CHAR)
    )
}

/// Renders the table into an in-memory xlsx workbook.
pub fn render(table: &AttendanceTable) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold().set_align(FormatAlign::Center);
    let plain = Format::new().set_align(FormatAlign::Center);
    let sunday = Format::new()
        .set_align(FormatAlign::Center)
        .set_background_color(Color::RGB(SUNDAY_FILL));
    let missed = Format::new()
        .set_align(FormatAlign::Center)
        .set_background_color(Color::RGB(MISSED_FILL));

    for (col, title) in table.header.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, title, &header_format)?;
    }

    for (idx, row) in table.rows.iter().enumerate() {
        let r = (idx + 1) as u32;
        worksheet.write_string_with_format(r, 0, &row.full_name, &plain)?;

        for (day_idx, cell) in row.days.iter().enumerate() {
            let format = match cell.style {
                Some(CellStyle::Sunday) => &sunday,
                Some(CellStyle::Missed) => &missed,
                None => &plain,
            };
            worksheet.write_string_with_format(r, (day_idx + 1) as u16, &cell.text, format)?;
        }

        let summary = (row.days.len() + 1) as u16;
        worksheet.write_string_with_format(r, summary, &row.total, &plain)?;
        worksheet.write_number_with_format(r, summary + 1, row.worked_days, &plain)?;
        worksheet.write_number_with_format(r, summary + 2, row.missed_days, &plain)?;
    }

    worksheet.autofit();

    workbook.save_to_buffer()
}
