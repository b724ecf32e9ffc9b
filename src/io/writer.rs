//! Сохранение таблицы в .csv или .xlsx

use std::path::Path;

use rust_xlsxwriter::{Format as CellFormat, Workbook};

use super::Format;
use crate::error::{PipelineError, Result};
use crate::types::{Cell, Table};

pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    match Format::from_path(path)? {
        Format::Csv => write_csv(table, path)?,
        Format::Xlsx => write_workbook(table, path)?,
    }
    tracing::debug!("Wrote {} rows to {}", table.n_rows(), path.display());
    Ok(())
}

fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| PipelineError::write(path, e))?;

    writer
        .write_record(table.columns())
        .map_err(|e| PipelineError::write(path, e))?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(Cell::render))
            .map_err(|e| PipelineError::write(path, e))?;
    }

    writer.flush().map_err(|e| PipelineError::write(path, e))?;
    Ok(())
}

fn write_workbook(table: &Table, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = CellFormat::new().set_bold();
    let date_format = CellFormat::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let worksheet = workbook.add_worksheet();
    let err = |e: rust_xlsxwriter::XlsxError| PipelineError::write(path, e);

    for (col, name) in table.columns().iter().enumerate() {
        let col = column_number(col, path)?;
        worksheet
            .write_string_with_format(0, col, name.as_str(), &header_format)
            .map_err(err)?;
    }

    for (i, row) in table.rows().iter().enumerate() {
        let row_num = u32::try_from(i + 1)
            .map_err(|_| PipelineError::write(path, "too many rows for a worksheet"))?;
        for (col, cell) in row.iter().enumerate() {
            let col = column_number(col, path)?;
            match cell {
                Cell::Empty => {}
                Cell::Number(v) => {
                    worksheet.write_number(row_num, col, *v).map_err(err)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(row_num, col, *b).map_err(err)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(row_num, col, s.as_str()).map_err(err)?;
                }
                Cell::DateTime(dt) => {
                    worksheet
                        .write_datetime_with_format(row_num, col, dt, &date_format)
                        .map_err(err)?;
                }
            }
        }
    }

    workbook.save(path).map_err(err)?;
    Ok(())
}

fn column_number(col: usize, path: &Path) -> Result<u16> {
    u16::try_from(col).map_err(|_| PipelineError::write(path, "too many columns for a worksheet"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_table;

    fn sample() -> Table {
        let mut table = Table::new(vec!["Metal".into(), "Valor".into()]);
        table.push_row(vec![Cell::Text("Ni".into()), Cell::Number(1.25)]);
        table.push_row(vec![Cell::Text("Co".into()), Cell::Empty]);
        table
    }

    #[test]
    fn csv_output_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_table(&sample(), &path).unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table, sample());
    }

    #[test]
    fn xlsx_output_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        write_table(&sample(), &path).unwrap();

        let table = read_table(&path).unwrap();
        assert_eq!(table.columns(), sample().columns());
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.rows()[0][1], Cell::Number(1.25));
    }

    #[test]
    fn xlsx_keeps_dates_as_dates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dates.xlsx");
        let moment = chrono::NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        let mut table = Table::new(vec!["Data".into()]);
        table.push_row(vec![Cell::DateTime(moment)]);
        write_table(&table, &path).unwrap();

        let read = read_table(&path).unwrap();
        assert_eq!(read.rows()[0][0], Cell::DateTime(moment));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_table(&sample(), &dir.path().join("out.json")).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat(_)));
    }
}
