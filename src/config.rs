/// Конфигурация конвейера и пресеты для двух режимов анализа

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

pub const TARGET_CURRENT_DENSITY: &str = "Densidade de Corrente (mA/cm²)";
pub const PREDICTION_COLUMN: &str = "Predição_IA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Исходная таблица экспериментов: очистка, one-hot, бинарная таблица
    Encode,
    /// Уже закодированная бинарная таблица
    Binary,
}

/// Правило приведения ячеек к числу
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionRule {
    /// Запятая, маркеры битых дат, извлечение первого числа регуляркой
    Lenient,
    /// Только прямой разбор, иначе 0
    Strict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    #[serde(default = "default_n_trees")]
    pub n_trees: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    #[serde(default = "default_min_samples_leaf")]
    pub min_samples_leaf: usize,
    #[serde(default = "default_bootstrap")]
    pub bootstrap: bool,
}

fn default_n_trees() -> usize { 100 }
fn default_seed() -> u64 { 42 }
fn default_min_samples_split() -> usize { 2 }
fn default_min_samples_leaf() -> usize { 1 }
fn default_bootstrap() -> bool { true }

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: default_n_trees(),
            seed: default_seed(),
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            min_samples_leaf: default_min_samples_leaf(),
            bootstrap: default_bootstrap(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub mode: Mode,
    pub input: PathBuf,
    #[serde(default = "default_target")]
    pub target: String,
    #[serde(default)]
    pub clean_columns: Vec<String>,
    #[serde(default = "default_coercion")]
    pub coercion: CoercionRule,
    #[serde(default = "default_sentinels")]
    pub date_sentinels: Vec<String>,
    #[serde(default)]
    pub categorical_columns: Vec<String>,
    #[serde(default)]
    pub ignore_columns: Vec<String>,
    #[serde(default)]
    pub binary_table_output: Option<PathBuf>,
    pub result_output: PathBuf,
    #[serde(default = "default_prediction_column")]
    pub prediction_column: String,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub forest: ForestParams,
}

fn default_target() -> String { TARGET_CURRENT_DENSITY.to_string() }
fn default_coercion() -> CoercionRule { CoercionRule::Lenient }
fn default_sentinels() -> Vec<String> { vec!["2025-".to_string(), "4324-".to_string()] }
fn default_prediction_column() -> String { PREDICTION_COLUMN.to_string() }
fn default_top_n() -> usize { 5 }

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl PipelineConfig {
    /// Пресет для исходной таблицы экспериментов
    pub fn encode() -> Self {
        Self {
            mode: Mode::Encode,
            input: PathBuf::from("planilha.xlsx"),
            target: default_target(),
            clean_columns: strings(&[
                TARGET_CURRENT_DENSITY,
                "Potencial de Oxidação (Ep, V vs Hg/HgO)",
                "Área Superficial (m²/g)",
                "Concentração_Etanol",
            ]),
            coercion: CoercionRule::Lenient,
            date_sentinels: default_sentinels(),
            categorical_columns: strings(&[
                "Metal",
                "Ligante",
                "Metodo_Sintese",
                "Tipo_Eletrolito",
                "Eletrodo Catalítico",
            ]),
            ignore_columns: strings(&[
                "Formula_MOF",
                "Condicoes_Sintese",
                "Durabilidade",
                "Tendência de Desempenho",
            ]),
            binary_table_output: Some(PathBuf::from("tabela_binaria_completa.xlsx")),
            result_output: PathBuf::from("resultado_completo_20_linhas.xlsx"),
            prediction_column: default_prediction_column(),
            top_n: 5,
            forest: ForestParams::default(),
        }
    }

    /// Пресет для готовой бинарной таблицы
    pub fn binary() -> Self {
        Self {
            mode: Mode::Binary,
            input: PathBuf::from("tabela_binaria_mof.xlsx"),
            target: default_target(),
            clean_columns: strings(&[
                TARGET_CURRENT_DENSITY,
                "Coef. de Difusão (cm²/s)",
                "Constante Cinética (kₒ, M⁻¹s⁻¹)",
            ]),
            coercion: CoercionRule::Strict,
            date_sentinels: Vec::new(),
            categorical_columns: Vec::new(),
            ignore_columns: Vec::new(),
            binary_table_output: None,
            result_output: PathBuf::from("resultado_final_com_predicao.xlsx"),
            prediction_column: default_prediction_column(),
            top_n: 10,
            forest: ForestParams::default(),
        }
    }

    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Encode => Self::encode(),
            Mode::Binary => Self::binary(),
        }
    }

    /// Загрузка полной конфигурации из JSON файла
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PipelineError::read(path, e))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| PipelineError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.forest.n_trees == 0 {
            return Err(PipelineError::Config("forest.n_trees must be positive".to_string()));
        }
        if self.forest.min_samples_split < 2 {
            return Err(PipelineError::Config("forest.min_samples_split must be at least 2".to_string()));
        }
        if self.forest.min_samples_leaf == 0 {
            return Err(PipelineError::Config("forest.min_samples_leaf must be positive".to_string()));
        }
        if self.prediction_column.is_empty() {
            return Err(PipelineError::Config("prediction_column must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::encode()
    }
}
