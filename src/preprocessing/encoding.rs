//! One-hot кодирование и разделение на признаки / целевую переменную

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use linfa::DatasetBase;
use ndarray::{Array1, Array2};

use crate::error::{PipelineError, Result};
use crate::types::{format_float, Cell, Table};

/// Матрица признаков + целевой вектор + имена признаков
pub type FeatureDataset = DatasetBase<Array2<f64>, Array1<f64>>;

/// Ключ категории: тип ячейки + значение, так что текст "2" и число 2.0 не сливаются.
/// Порядок: флаги, числа (по величине), даты, текст
#[derive(Debug, Clone)]
enum CategoryKey {
    Bool(bool),
    Number(f64),
    DateTime(NaiveDateTime),
    Text(String),
}

impl CategoryKey {
    fn of(cell: &Cell) -> Self {
        match cell {
            Cell::Empty => CategoryKey::Text(String::new()),
            Cell::Number(v) => CategoryKey::Number(*v),
            Cell::Text(s) => CategoryKey::Text(s.clone()),
            Cell::Bool(b) => CategoryKey::Bool(*b),
            Cell::DateTime(dt) => CategoryKey::DateTime(*dt),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CategoryKey::Bool(_) => 0,
            CategoryKey::Number(_) => 1,
            CategoryKey::DateTime(_) => 2,
            CategoryKey::Text(_) => 3,
        }
    }

    /// Суффикс имени индикатора; целые вещественные пишутся как "2.0"
    fn label(&self) -> String {
        match self {
            CategoryKey::Bool(b) => if *b { "True".to_string() } else { "False".to_string() },
            CategoryKey::Number(v) => format_float(*v),
            CategoryKey::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            CategoryKey::Text(s) => s.clone(),
        }
    }
}

impl Ord for CategoryKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (CategoryKey::Bool(a), CategoryKey::Bool(b)) => a.cmp(b),
            (CategoryKey::Number(a), CategoryKey::Number(b)) => a.total_cmp(b),
            (CategoryKey::DateTime(a), CategoryKey::DateTime(b)) => a.cmp(b),
            (CategoryKey::Text(a), CategoryKey::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for CategoryKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CategoryKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for CategoryKey {}

/// Заменяет категориальные колонки индикаторами `<колонка>_<категория>`.
/// Индикаторы добавляются в конец таблицы в порядке `columns`,
/// категории отсортированы. Возвращает имена новых колонок
pub fn one_hot_encode(table: &mut Table, columns: &[String]) -> Vec<String> {
    let mut created = Vec::new();
    let mut encoded: Vec<(String, Vec<Cell>)> = Vec::new();

    for name in columns {
        let Some(idx) = table.column_index(name) else {
            continue;
        };
        let (name, values) = table.remove_column(idx);
        let keys: Vec<CategoryKey> = values.iter().map(CategoryKey::of).collect();
        let categories: BTreeSet<&CategoryKey> = keys.iter().collect();

        for category in categories {
            let indicator: Vec<Cell> = keys
                .iter()
                .map(|k| Cell::Number(if k == category { 1.0 } else { 0.0 }))
                .collect();
            encoded.push((format!("{}_{}", name, category.label()), indicator));
        }
    }

    for (name, values) in encoded {
        created.push(name.clone());
        table.append_column(name, values);
    }

    created
}

/// Убирает целевую и игнорируемые колонки, оставляет только числовые.
/// При `flags_as_numbers` колонки из True/False (в т.ч. вперемешку с числами)
/// тоже идут в признаки как 1.0 / 0.0
pub fn split_features(
    table: &Table,
    target: &str,
    ignore: &[String],
    flags_as_numbers: bool,
) -> Result<FeatureDataset> {
    let is_numeric = |idx: usize| {
        if flags_as_numbers {
            table.is_numeric_or_flag_column(idx)
        } else {
            table.is_numeric_column(idx)
        }
    };
    let value = |cell: &Cell| -> f64 {
        let number = if flags_as_numbers {
            cell.as_number_or_flag()
        } else {
            cell.as_number()
        };
        number.unwrap_or(0.0)
    };

    let target_idx = table
        .column_index(target)
        .ok_or_else(|| PipelineError::MissingTarget(target.to_string()))?;
    if !is_numeric(target_idx) {
        return Err(PipelineError::NonNumericTarget(target.to_string()));
    }

    let mut feature_idx = Vec::new();
    for (idx, name) in table.columns().iter().enumerate() {
        if idx == target_idx || ignore.contains(name) {
            continue;
        }
        if is_numeric(idx) {
            feature_idx.push(idx);
        } else {
            tracing::debug!("Column '{}' is not numeric, excluded from features", name);
        }
    }

    if feature_idx.is_empty() {
        return Err(PipelineError::NoFeatures);
    }

    let n_samples = table.n_rows();
    let mut records = Array2::zeros((n_samples, feature_idx.len()));
    let mut targets = Array1::zeros(n_samples);

    for (i, row) in table.rows().iter().enumerate() {
        for (j, &idx) in feature_idx.iter().enumerate() {
            records[[i, j]] = value(&row[idx]);
        }
        targets[i] = value(&row[target_idx]);
    }

    let names: Vec<String> = feature_idx
        .iter()
        .map(|&idx| table.columns()[idx].clone())
        .collect();

    Ok(DatasetBase::new(records, targets).with_feature_names(names))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn experiments() -> Table {
        let mut table = Table::new(vec![
            "Metal".into(),
            "Formula_MOF".into(),
            "Area".into(),
            "Densidade".into(),
        ]);
        table.push_row(vec![
            Cell::Text("Ni".into()),
            Cell::Text("Ni-BDC".into()),
            Cell::Number(120.0),
            Cell::Number(3.2),
        ]);
        table.push_row(vec![
            Cell::Text("Co".into()),
            Cell::Text("Co-BDC".into()),
            Cell::Number(80.0),
            Cell::Number(1.5),
        ]);
        table.push_row(vec![
            Cell::Text("Ni".into()),
            Cell::Text("Ni-BTC".into()),
            Cell::Number(95.0),
            Cell::Number(2.7),
        ]);
        table
    }

    #[test]
    fn one_hot_appends_sorted_indicators() {
        let mut table = experiments();
        let created = one_hot_encode(&mut table, &["Metal".to_string(), "Missing".to_string()]);

        assert_eq!(created, vec!["Metal_Co", "Metal_Ni"]);
        assert_eq!(
            table.columns(),
            &["Formula_MOF", "Area", "Densidade", "Metal_Co", "Metal_Ni"]
        );
        assert_eq!(table.rows()[0][3], Cell::Number(0.0));
        assert_eq!(table.rows()[0][4], Cell::Number(1.0));
        assert_eq!(table.rows()[1][3], Cell::Number(1.0));
        assert_eq!(table.n_rows(), 3);
    }

    #[test]
    fn zero_filled_category_gets_its_own_indicator() {
        let mut table = Table::new(vec!["Metal".into()]);
        table.push_row(vec![Cell::Text("Ni".into())]);
        table.push_row(vec![Cell::Number(0.0)]);

        let created = one_hot_encode(&mut table, &["Metal".to_string()]);
        assert_eq!(created, vec!["Metal_0.0", "Metal_Ni"]);
    }

    #[test]
    fn text_and_number_categories_stay_apart() {
        let mut table = Table::new(vec!["Lote".into()]);
        table.push_row(vec![Cell::Text("2".into())]);
        table.push_row(vec![Cell::Number(2.0)]);
        table.push_row(vec![Cell::Number(10.0)]);
        table.push_row(vec![Cell::Number(2.5)]);

        let created = one_hot_encode(&mut table, &["Lote".to_string()]);
        assert_eq!(created, vec!["Lote_2.0", "Lote_2.5", "Lote_10.0", "Lote_2"]);
        // текст "2" попадает только в свой индикатор
        assert_eq!(
            table.rows()[0],
            vec![Cell::Number(0.0), Cell::Number(0.0), Cell::Number(0.0), Cell::Number(1.0)]
        );
        assert_eq!(table.rows()[1][0], Cell::Number(1.0));
    }

    #[test]
    fn split_keeps_numeric_non_ignored_columns() {
        let mut table = experiments();
        one_hot_encode(&mut table, &["Metal".to_string()]);

        let dataset = split_features(&table, "Densidade", &["Formula_MOF".to_string()], false).unwrap();
        let names: Vec<String> = dataset.feature_names().iter().cloned().collect();
        assert_eq!(names, vec!["Area", "Metal_Co", "Metal_Ni"]);
        assert_eq!(dataset.records().dim(), (3, 3));
        assert_eq!(dataset.targets()[1], 1.5);
        assert_eq!(dataset.records()[[2, 0]], 95.0);
    }

    #[test]
    fn text_columns_are_dropped_even_when_not_ignored() {
        let dataset = split_features(&experiments(), "Densidade", &[], false).unwrap();
        let names: Vec<String> = dataset.feature_names().iter().cloned().collect();
        assert_eq!(names, vec!["Area"]);
    }

    #[test]
    fn missing_target_is_an_error() {
        let err = split_features(&experiments(), "Nope", &[], false).unwrap_err();
        assert!(matches!(err, PipelineError::MissingTarget(name) if name == "Nope"));
    }

    #[test]
    fn text_target_is_an_error() {
        let err = split_features(&experiments(), "Metal", &[], false).unwrap_err();
        assert!(matches!(err, PipelineError::NonNumericTarget(_)));
    }

    #[test]
    fn no_numeric_features_is_an_error() {
        let mut table = Table::new(vec!["Metal".into(), "y".into()]);
        table.push_row(vec![Cell::Text("Ni".into()), Cell::Number(1.0)]);
        let err = split_features(&table, "y", &[], false).unwrap_err();
        assert!(matches!(err, PipelineError::NoFeatures));
    }

    fn flag_table() -> Table {
        let mut table = Table::new(vec!["Metal_Ni".into(), "Metal_Co".into(), "y".into()]);
        table.push_row(vec![Cell::Bool(true), Cell::Bool(false), Cell::Number(3.0)]);
        table.push_row(vec![Cell::Bool(false), Cell::Number(1.0), Cell::Number(1.0)]);
        table
    }

    #[test]
    fn flag_columns_become_features_when_allowed() {
        let dataset = split_features(&flag_table(), "y", &[], true).unwrap();
        let names: Vec<String> = dataset.feature_names().iter().cloned().collect();
        assert_eq!(names, vec!["Metal_Ni", "Metal_Co"]);
        assert_eq!(dataset.records()[[0, 0]], 1.0);
        assert_eq!(dataset.records()[[0, 1]], 0.0);
        assert_eq!(dataset.records()[[1, 0]], 0.0);
        assert_eq!(dataset.records()[[1, 1]], 1.0);
    }

    #[test]
    fn flag_columns_are_dropped_otherwise() {
        let err = split_features(&flag_table(), "y", &[], false).unwrap_err();
        assert!(matches!(err, PipelineError::NoFeatures));
    }
}
