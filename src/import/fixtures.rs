#![allow(clippy::unwrap_used)]

//! Spreadsheet fixtures built in memory.

use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

pub(crate) enum XCell<'a> {
    Text(&'a str),
    Number(f64),
    Date(u16, u8, u8),
    Blank,
}

/// One worksheet; `rows[0]` lands on the sheet's first row.
pub(crate) fn xlsx_bytes(rows: &[Vec<XCell<'_>>]) -> Vec<u8> {
    let mut wb = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let ws = wb.add_worksheet();
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let (r, c) = (r as u32, c as u16);
            match cell {
                XCell::Text(s) => {
                    ws.write_string(r, c, *s).unwrap();
                }
                XCell::Number(n) => {
                    ws.write_number(r, c, *n).unwrap();
                }
                XCell::Date(y, m, d) => {
                    let dt = ExcelDateTime::from_ymd(*y, *m, *d).unwrap();
                    ws.write_datetime_with_format(r, c, &dt, &date_format).unwrap();
                }
                XCell::Blank => {}
            }
        }
    }
    wb.save_to_buffer().unwrap()
}

pub(crate) fn standard_header() -> Vec<XCell<'static>> {
    ["date", "description", "category", "amount", "type"]
        .into_iter()
        .map(XCell::Text)
        .collect()
}
