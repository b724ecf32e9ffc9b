/// Ранжирование важности признаков и метрики качества на обучающей выборке

use ndarray::Array1;

use crate::config::Mode;
use crate::types::{format_float, FeatureImportance};

/// Признаки по убыванию важности (стабильно для равных значений)
pub fn rank_importances(names: &[String], importances: &Array1<f64>) -> Vec<FeatureImportance> {
    let mut ranking: Vec<FeatureImportance> = names
        .iter()
        .zip(importances.iter())
        .map(|(name, &importance)| FeatureImportance {
            feature: name.clone(),
            importance,
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranking
}

/// Текстовая таблица топ-N признаков
pub fn format_ranking(ranking: &[FeatureImportance], top_n: usize, mode: Mode) -> String {
    let header_name = "Característica";
    let header_value = "Importância (%)";

    let rows: Vec<(String, String)> = ranking
        .iter()
        .take(top_n)
        .map(|fi| {
            let value = match mode {
                Mode::Encode => format!("{}%", format_float(fi.percent())),
                Mode::Binary => format!("{:.2}", fi.importance * 100.0),
            };
            (fi.feature.clone(), value)
        })
        .collect();

    let name_width = rows
        .iter()
        .map(|(n, _)| n.chars().count())
        .chain(std::iter::once(header_name.chars().count()))
        .max()
        .unwrap_or(0);
    let value_width = rows
        .iter()
        .map(|(_, v)| v.chars().count())
        .chain(std::iter::once(header_value.chars().count()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!(
        "{:>nw$} {:>vw$}\n",
        header_name,
        header_value,
        nw = name_width,
        vw = value_width
    ));
    for (name, value) in rows {
        out.push_str(&format!(
            "{:>nw$} {:>vw$}\n",
            name,
            value,
            nw = name_width,
            vw = value_width
        ));
    }
    out
}

/// Коэффициент детерминации
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let n = y_true.len();
    if n == 0 {
        return 0.0;
    }
    let mean = y_true.sum() / n as f64;
    let ss_tot: f64 = y_true.iter().map(|y| (y - mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        // постоянная цель: идеальное совпадение -> 1, иначе 0
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    (y_true - y_pred).mapv(|x| x.abs()).mean().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names() -> Vec<String> {
        vec!["Área".into(), "Metal_Ni".into(), "Metal_Co".into()]
    }

    #[test]
    fn ranking_is_descending() {
        let ranking = rank_importances(&names(), &array![0.2, 0.5, 0.3]);
        let order: Vec<&str> = ranking.iter().map(|fi| fi.feature.as_str()).collect();
        assert_eq!(order, vec!["Metal_Ni", "Metal_Co", "Área"]);
    }

    #[test]
    fn encode_ranking_uses_percent_suffix() {
        let ranking = rank_importances(&names(), &array![0.123456, 0.5, 0.376544]);
        let text = format_ranking(&ranking, 2, Mode::Encode);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Característica"));
        assert!(lines[1].trim_start().starts_with("Metal_Ni"));
        assert!(lines[1].ends_with(" 50.0%"));
        assert!(lines[2].ends_with(" 37.65%"));
    }

    #[test]
    fn encode_ranking_drops_trailing_zeros() {
        let ranking = rank_importances(&names(), &array![0.123, 0.5, 0.377]);
        let text = format_ranking(&ranking, 3, Mode::Encode);
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[2].ends_with(" 37.7%"));
        assert!(lines[3].trim_start().starts_with("Área"));
        assert!(lines[3].ends_with(" 12.3%"));
        assert!(!text.contains("12.30%"));
    }

    #[test]
    fn binary_ranking_is_plain_percent() {
        let ranking = rank_importances(&names(), &array![0.25, 0.5, 0.25]);
        let text = format_ranking(&ranking, 10, Mode::Binary);
        assert_eq!(text.lines().count(), 4);
        assert!(text.lines().nth(1).unwrap().ends_with("50.00"));
    }

    #[test]
    fn metrics() {
        let y = array![1.0, 2.0, 3.0];
        assert_eq!(r2_score(&y, &y), 1.0);
        assert_eq!(mean_absolute_error(&y, &y), 0.0);

        let pred = array![2.0, 2.0, 2.0];
        assert_eq!(r2_score(&y, &pred), 0.0);
        assert!((mean_absolute_error(&y, &pred) - 2.0 / 3.0).abs() < 1e-12);
    }
}
