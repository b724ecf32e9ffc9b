/// Пакетный запуск анализа таблицы

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mof_ml::{pipeline, Mode, PipelineConfig};

#[derive(Debug, Parser)]
#[command(name = "mof-ml", version, about = "Random forest analysis of MOF electrocatalyst spreadsheets")]
struct Cli {
    /// Input spreadsheet (.xlsx or .csv); defaults to the mode's file name
    input: Option<PathBuf>,

    /// Analysis mode
    #[arg(long, value_enum, default_value_t = Mode::Encode)]
    mode: Mode,

    /// Load the whole pipeline config from a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Target column to predict
    #[arg(long)]
    target: Option<String>,

    /// Result spreadsheet with the prediction column
    #[arg(long)]
    output: Option<PathBuf>,

    /// Where to save the one-hot encoded table
    #[arg(long)]
    binary_output: Option<PathBuf>,

    /// Number of features shown in the importance ranking
    #[arg(long)]
    top: Option<usize>,

    /// Number of trees in the forest
    #[arg(long)]
    trees: Option<usize>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => PipelineConfig::for_mode(self.mode),
        };

        if let Some(input) = self.input {
            config.input = input;
        }
        if let Some(target) = self.target {
            config.target = target;
        }
        if let Some(output) = self.output {
            config.result_output = output;
        }
        if let Some(binary_output) = self.binary_output {
            config.binary_table_output = Some(binary_output);
        }
        if let Some(top) = self.top {
            config.top_n = top;
        }
        if let Some(trees) = self.trees {
            config.forest.n_trees = trees;
        }
        if let Some(seed) = self.seed {
            config.forest.seed = seed;
        }

        Ok(config)
    }
}

fn main() -> ExitCode {
    // Инициализация логирования
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run_cli(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let config = cli.into_config()?;
    tracing::info!("Mode: {:?}, input: {}", config.mode, config.input.display());

    let report = pipeline::run(&config)?;
    println!("{}", pipeline::render_report(&report, &config));

    Ok(())
}
