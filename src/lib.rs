pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::storage::LocalStorage;
pub use adapters::summary::GeminiSummarizer;
pub use app::pipelines::ReplenishmentPipeline;
pub use config::{toml_config::TomlConfig, CliConfig};
pub use core::{aggregate::filter_and_sort_stock, etl::EtlEngine};
pub use domain::model::{ColumnMapping, MappingSelection, StockItem};
pub use utils::error::{Result, StockSyncError};
