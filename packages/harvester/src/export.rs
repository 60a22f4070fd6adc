//! Spreadsheet export of snapshot items.
//!
//! One worksheet with a header row, then one row per item. Columns are the
//! items' top-level fields in first-seen order; nested values are written as
//! compact JSON and missing fields stay blank.

use rust_xlsxwriter::Workbook;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::Result;

/// Longest text a single worksheet cell accepts.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Render `items` as an `.xlsx` workbook.
pub fn workbook_bytes<T: Serialize>(items: &[T]) -> Result<Vec<u8>> {
    let rows = items
        .iter()
        .map(|item| serde_json::to_value(item).map(into_row))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let columns = columns(&rows);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in columns.iter().enumerate() {
        worksheet.write_string(0, col as u16, name.as_str())?;
    }

    for (index, row) in rows.iter().enumerate() {
        let row_num = (index + 1) as u32;
        for (col, name) in columns.iter().enumerate() {
            let col = col as u16;
            match row.get(name) {
                None | Some(Value::Null) => {}
                Some(Value::Bool(flag)) => {
                    worksheet.write_boolean(row_num, col, *flag)?;
                }
                Some(Value::Number(number)) => match number.as_f64() {
                    Some(n) => {
                        worksheet.write_number(row_num, col, n)?;
                    }
                    None => {
                        worksheet.write_string(row_num, col, number.to_string())?;
                    }
                },
                Some(Value::String(text)) => {
                    worksheet.write_string(row_num, col, clip(text))?;
                }
                Some(nested) => {
                    worksheet.write_string(row_num, col, clip(&nested.to_string()))?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn into_row(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

fn columns(rows: &[Map<String, Value>]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for row in rows {
        for name in row.keys() {
            if seen.insert(name.as_str()) {
                columns.push(name.clone());
            }
        }
    }
    columns
}

fn clip(text: &str) -> String {
    text.chars().take(MAX_CELL_CHARS).collect()
}
