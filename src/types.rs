/// Типы данных для ML конвейера

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Значение одной ячейки таблицы
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Число или флаг как 1.0 / 0.0
    pub fn as_number_or_flag(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Текстовое представление ячейки (как его видит очистка и one-hot)
    pub fn render(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(v) => format_number(*v),
            Cell::Text(s) => s.clone(),
            Cell::Bool(b) => if *b { "True".to_string() } else { "False".to_string() },
            Cell::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Целые числа без дробной части: 3.0 -> "3"
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

/// Вещественное с обязательной дробной частью: 2.0 -> "2.0", 12.3 -> "12.3"
pub fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

/// Таблица в памяти: имена колонок + строки
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Строки короче заголовка дополняются пустыми ячейками, длинные обрезаются
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Колонка числовая, если все ячейки - числа
    pub fn is_numeric_column(&self, idx: usize) -> bool {
        self.column(idx).all(|cell| matches!(cell, Cell::Number(_)))
    }

    /// То же, но флаги True/False тоже считаются числами
    pub fn is_numeric_or_flag_column(&self, idx: usize) -> bool {
        self.column(idx)
            .all(|cell| matches!(cell, Cell::Number(_) | Cell::Bool(_)))
    }

    pub fn map_column<F>(&mut self, idx: usize, mut f: F)
    where
        F: FnMut(&Cell) -> Cell,
    {
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> + '_ {
        self.rows.iter_mut().flat_map(|row| row.iter_mut())
    }

    pub fn remove_column(&mut self, idx: usize) -> (String, Vec<Cell>) {
        let name = self.columns.remove(idx);
        let values = self.rows.iter_mut().map(|row| row.remove(idx)).collect();
        (name, values)
    }

    /// Добавляет колонку в конец. Длина `values` должна совпадать с числом строк
    pub fn append_column(&mut self, name: String, values: Vec<Cell>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.columns.push(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

impl FeatureImportance {
    pub fn percent(&self) -> f64 {
        (self.importance * 100.0 * 100.0).round() / 100.0
    }
}

/// Итог одного запуска конвейера
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub n_rows: usize,
    pub n_features: usize,
    pub binary_table_path: Option<String>,
    pub result_path: String,
    pub importances: Vec<FeatureImportance>, // по убыванию
    pub r2: f64,
    pub mae: f64,
}
