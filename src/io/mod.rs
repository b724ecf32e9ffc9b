/// Чтение и запись таблиц (.xlsx / .csv)

pub mod reader;
pub mod writer;

pub use reader::read_table;
pub use writer::write_table;

use std::path::Path;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Xlsx,
}

impl Format {
    /// Формат определяется только по расширению файла
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(Format::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(Format::Xlsx),
            other => Err(PipelineError::UnsupportedFormat(other.to_string())),
        }
    }
}
