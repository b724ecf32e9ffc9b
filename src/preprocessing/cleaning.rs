//! Очистка числовых колонок

use regex::Regex;

use crate::config::CoercionRule;
use crate::types::{Cell, Table};

/// Первое похожее на число вхождение в строке
const NUMBER_PATTERN: &str = r"[-+]?\d*\.\d+|\d+";

pub struct NumericCleaner {
    rule: CoercionRule,
    sentinels: Vec<String>,
    number_re: Regex,
}

impl NumericCleaner {
    pub fn new(rule: CoercionRule, sentinels: Vec<String>) -> Self {
        Self {
            rule,
            sentinels,
            number_re: Regex::new(NUMBER_PATTERN).expect("number pattern is valid"),
        }
    }

    pub fn lenient(sentinels: Vec<String>) -> Self {
        Self::new(CoercionRule::Lenient, sentinels)
    }

    pub fn strict() -> Self {
        Self::new(CoercionRule::Strict, Vec::new())
    }

    /// Приведение ячейки к числу. Никогда не падает, результат всегда конечный
    pub fn coerce(&self, cell: &Cell) -> f64 {
        match self.rule {
            CoercionRule::Lenient => self.coerce_lenient(cell),
            CoercionRule::Strict => coerce_strict(cell),
        }
    }

    fn coerce_lenient(&self, cell: &Cell) -> f64 {
        let text = cell.render();
        let text = text.trim();
        if text.is_empty() {
            return 0.0;
        }

        // Битые даты из Excel (3,2 -> 2025-02-03 и т.п.)
        if self.sentinels.iter().any(|s| !s.is_empty() && text.contains(s.as_str())) {
            return 0.0;
        }

        let normalized = text.replace(',', ".");
        if let Ok(v) = normalized.parse::<f64>() {
            if v.is_finite() {
                return v;
            }
        }

        self.number_re
            .find(&normalized)
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// Чистит перечисленные колонки, отсутствующие пропускаются.
    /// Возвращает число обработанных колонок
    pub fn clean_columns(&self, table: &mut Table, columns: &[String]) -> usize {
        let mut cleaned = 0;
        for name in columns {
            match table.column_index(name) {
                Some(idx) => {
                    table.map_column(idx, |cell| match cell {
                        // пустые ячейки заполняет fill_empty
                        Cell::Empty => Cell::Empty,
                        other => Cell::Number(self.coerce(other)),
                    });
                    cleaned += 1;
                }
                None => tracing::debug!("Column '{}' not found, skipping cleanup", name),
            }
        }
        cleaned
    }
}

fn coerce_strict(cell: &Cell) -> f64 {
    match cell {
        Cell::Number(v) if v.is_finite() => *v,
        Cell::Bool(b) => if *b { 1.0 } else { 0.0 },
        other => other
            .render()
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
    }
}

/// Все оставшиеся пустые ячейки -> 0
pub fn fill_empty(table: &mut Table) -> usize {
    let mut filled = 0;
    for cell in table.cells_mut() {
        if cell.is_empty() {
            *cell = Cell::Number(0.0);
            filled += 1;
        }
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn lenient() -> NumericCleaner {
        NumericCleaner::lenient(vec!["2025-".to_string(), "4324-".to_string()])
    }

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn comma_decimal() {
        assert_eq!(lenient().coerce(&text("3,2")), 3.2);
        assert_eq!(lenient().coerce(&text(" 0,75 ")), 0.75);
    }

    #[test]
    fn sentinel_dates_become_zero() {
        let cleaner = lenient();
        assert_eq!(cleaner.coerce(&text("2025-02-03")), 0.0);
        assert_eq!(cleaner.coerce(&text("4324-01-01 00:00:00")), 0.0);

        let date = NaiveDate::from_ymd_opt(2025, 2, 3)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(cleaner.coerce(&Cell::DateTime(date)), 0.0);
    }

    #[test]
    fn other_dates_yield_leading_number() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(lenient().coerce(&Cell::DateTime(date)), 2024.0);
    }

    #[test]
    fn embedded_number_is_extracted() {
        let cleaner = lenient();
        assert_eq!(cleaner.coerce(&text("abc12.5xyz")), 12.5);
        assert_eq!(cleaner.coerce(&text("~ 45 mA/cm²")), 45.0);
        assert_eq!(cleaner.coerce(&text("1,234.5")), 1.234);
        assert_eq!(cleaner.coerce(&text(".5V")), 0.5);
    }

    #[test]
    fn unparseable_values_become_zero() {
        let cleaner = lenient();
        assert_eq!(cleaner.coerce(&text("n/d")), 0.0);
        assert_eq!(cleaner.coerce(&text("inf")), 0.0);
        assert_eq!(cleaner.coerce(&text("")), 0.0);
        assert_eq!(cleaner.coerce(&Cell::Empty), 0.0);
        assert_eq!(cleaner.coerce(&Cell::Bool(true)), 0.0);
    }

    #[test]
    fn lenient_result_is_always_finite() {
        let cleaner = lenient();
        let mut inputs: Vec<String> = [
            "NaN", "-inf", "1e400", "--", "+", ".", "12.5.6", "−3", "٣", "1e-400", "0x1F", "   ",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        inputs.push("9".repeat(400));

        for input in &inputs {
            let v = cleaner.coerce(&text(input));
            assert!(v.is_finite(), "{input:?} -> {v}");
        }
    }

    #[test]
    fn strict_rule() {
        let cleaner = NumericCleaner::strict();
        assert_eq!(cleaner.coerce(&Cell::Number(4.5)), 4.5);
        assert_eq!(cleaner.coerce(&text("4.5")), 4.5);
        assert_eq!(cleaner.coerce(&text("3,2")), 0.0);
        assert_eq!(cleaner.coerce(&text("abc12.5xyz")), 0.0);
        assert_eq!(cleaner.coerce(&text("nan")), 0.0);
        assert_eq!(cleaner.coerce(&Cell::Bool(true)), 1.0);
    }

    #[test]
    fn clean_and_fill() {
        let mut table = Table::new(vec!["a".into(), "b".into(), "c".into()]);
        table.push_row(vec![text("3,2"), text("x"), Cell::Empty]);
        table.push_row(vec![Cell::Empty, text("y"), Cell::Number(1.0)]);

        let cleaned = lenient().clean_columns(&mut table, &["a".to_string(), "zzz".to_string()]);
        assert_eq!(cleaned, 1);
        assert_eq!(table.rows()[0][0], Cell::Number(3.2));
        assert_eq!(table.rows()[1][0], Cell::Empty);

        assert_eq!(fill_empty(&mut table), 2);
        assert!(table.is_numeric_column(0));
        assert!(!table.is_numeric_column(1));
        assert!(table.is_numeric_column(2));
    }
}
