//! MOF ML - анализ таблиц электрокатализаторов на основе MOF

pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod types;

pub use config::{CoercionRule, ForestParams, Mode, PipelineConfig};
pub use error::{PipelineError, Result};
pub use models::{RandomForest, RandomForestParams};
pub use pipeline::{render_report, run};
pub use types::*;
