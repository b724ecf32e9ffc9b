//! Загрузка таблицы из .csv или .xlsx

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDateTime;

use super::Format;
use crate::error::{PipelineError, Result};
use crate::types::{Cell, Table};

/// Строки, которые считаются пропущенным значением
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-NaN", "-nan", "<NA>", "N/A", "NA", "NULL", "NaN", "None",
    "n/a", "nan", "null",
];

pub fn read_table(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(PipelineError::InputNotFound(path.to_path_buf()));
    }

    let table = match Format::from_path(path)? {
        Format::Csv => read_csv(path)?,
        Format::Xlsx => read_workbook(path)?,
    };

    tracing::debug!(
        "Read {} rows x {} columns from {}",
        table.n_rows(),
        table.n_columns(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| PipelineError::read(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::read(path, e))?
        .iter()
        .enumerate()
        .map(|(i, h)| header_name(h.trim(), i))
        .collect();

    let mut table = Table::new(headers);
    for (row_no, record) in reader.records().enumerate() {
        let record = record.map_err(|e| PipelineError::read(path, format!("row {row_no}: {e}")))?;
        table.push_row(record.iter().map(parse_text_cell).collect());
    }

    Ok(table)
}

/// Вывод типа ячейки из текста CSV
pub(crate) fn parse_text_cell(raw: &str) -> Cell {
    let s = raw.trim();
    if NA_VALUES.contains(&s) {
        return Cell::Empty;
    }
    match s {
        "True" | "TRUE" | "true" => return Cell::Bool(true),
        "False" | "FALSE" | "false" => return Cell::Bool(false),
        _ => {}
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Cell::Number(v),
        _ => Cell::Text(raw.to_string()),
    }
}

fn header_name(raw: &str, idx: usize) -> String {
    if raw.is_empty() {
        format!("Unnamed: {idx}")
    } else {
        raw.to_string()
    }
}

// ---------------------------------------------------------------------------
// Excel
// ---------------------------------------------------------------------------

/// Читается только первый лист книги; первая строка - заголовок
fn read_workbook(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).map_err(|e| PipelineError::read(path, e))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PipelineError::read(path, "workbook has no sheets"))?
        .map_err(|e| PipelineError::read(path, e))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .enumerate()
            .map(|(i, cell)| header_name(cell.to_string().trim(), i))
            .collect(),
        None => return Ok(Table::default()),
    };

    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row.iter().map(convert_cell).collect());
    }

    Ok(table)
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) if f.is_finite() => Cell::Number(*f),
        Data::Float(f) => Cell::Text(f.to_string()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => Cell::DateTime(value),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(Cell::DateTime)
            .unwrap_or_else(|_| Cell::Text(s.clone())),
        // ошибки формул (#DIV/0! и т.п.) и длительности остаются текстом
        other => Cell::Text(other.to_string()),
    }
}
