//! Конвейер: загрузка -> очистка -> кодирование -> обучение -> прогноз -> экспорт

use linfa::traits::{Fit, Predict};
use ndarray::Array1;

use crate::config::{Mode, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::io::{read_table, write_table};
use crate::models::RandomForestParams;
use crate::preprocessing::{fill_empty, one_hot_encode, split_features, NumericCleaner};
use crate::report::{format_ranking, mean_absolute_error, r2_score, rank_importances};
use crate::types::{Cell, PipelineReport};

pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    config.validate()?;

    // 1. Загрузка
    tracing::info!("Reading {}", config.input.display());
    let mut table = read_table(&config.input)?;
    tracing::info!("Loaded {} rows", table.n_rows());

    // 2. Очистка числовых колонок и заполнение пропусков
    let cleaner = NumericCleaner::new(config.coercion, config.date_sentinels.clone());
    let cleaned = cleaner.clean_columns(&mut table, &config.clean_columns);
    let filled = fill_empty(&mut table);
    tracing::debug!("Cleaned {} columns, filled {} empty cells", cleaned, filled);

    // Проверка целевой колонки до записи любых файлов
    if !table.has_column(&config.target) {
        return Err(PipelineError::MissingTarget(config.target.clone()));
    }

    // 3. One-hot кодирование
    let mut encoded = table.clone();
    let indicators = one_hot_encode(&mut encoded, &config.categorical_columns);
    if !indicators.is_empty() {
        tracing::info!("One-hot encoding added {} indicator columns", indicators.len());
    }

    // готовая бинарная таблица может хранить индикаторы как TRUE/FALSE
    let flags_as_numbers = config.mode == Mode::Binary;
    let dataset = split_features(
        &encoded,
        &config.target,
        &config.ignore_columns,
        flags_as_numbers,
    )?;
    let feature_names: Vec<String> = dataset.feature_names().iter().cloned().collect();

    if let Some(path) = &config.binary_table_output {
        write_table(&encoded, path)?;
        tracing::info!("Binary table saved to {}", path.display());
    }

    // 4. Обучение
    tracing::info!(
        "Training random forest: {} trees, {} samples, {} features",
        config.forest.n_trees,
        dataset.records().nrows(),
        feature_names.len()
    );
    let forest = RandomForestParams::from(&config.forest).fit(&dataset)?;
    let predictions: Array1<f64> = forest.predict(dataset.records());

    let r2 = r2_score(dataset.targets(), &predictions);
    let mae = mean_absolute_error(dataset.targets(), &predictions);
    tracing::info!("Training fit: R2 = {:.4}, MAE = {:.4}", r2, mae);

    // 5. Экспорт: очищенная таблица (до кодирования) + колонка прогноза
    let mut result = table;
    result.append_column(
        config.prediction_column.clone(),
        predictions.iter().map(|&p| Cell::Number(p)).collect(),
    );
    write_table(&result, &config.result_output)?;
    tracing::info!("Result saved to {}", config.result_output.display());

    let importances = rank_importances(&feature_names, forest.feature_importances());

    Ok(PipelineReport {
        n_rows: result.n_rows(),
        n_features: feature_names.len(),
        binary_table_path: config
            .binary_table_output
            .as_ref()
            .map(|p| p.display().to_string()),
        result_path: config.result_output.display().to_string(),
        importances,
        r2,
        mae,
    })
}

/// Отчёт для консоли
pub fn render_report(report: &PipelineReport, config: &PipelineConfig) -> String {
    let title = match config.mode {
        Mode::Encode => "RANKING DE IMPORTÂNCIA ( EM % ):",
        Mode::Binary => " RESULTADO: O QUE É MAIS IMPORTANTE? ",
    };

    let mut out = String::new();
    out.push_str(&"=".repeat(50));
    out.push('\n');
    out.push_str(title);
    out.push('\n');
    out.push_str(&"-".repeat(50));
    out.push('\n');
    out.push_str(&format_ranking(&report.importances, config.top_n, config.mode));
    out
}
