/// Модуль предобработки данных

pub mod cleaning;
pub mod encoding;

pub use cleaning::{fill_empty, NumericCleaner};
pub use encoding::{one_hot_encode, split_features, FeatureDataset};
