pub mod toml_config;

use crate::adapters::summary::{
    DEFAULT_SUMMARY_ENDPOINT, DEFAULT_SUMMARY_LANGUAGE, DEFAULT_SUMMARY_MODEL, DEFAULT_TOP_ITEMS,
};
use crate::core::aggregate::{DEFAULT_ALLOW_PATTERNS, DEFAULT_TOTALS_MARKER};
use crate::core::ConfigProvider;
use crate::domain::model::MappingSelection;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_output_formats, validate_path,
    validate_patterns, validate_positive_number, validate_url, Validate, SPREADSHEET_EXTENSIONS,
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[cfg(feature = "cli")]
use clap::Parser;

pub const DEFAULT_OUTPUT_PATH: &str = "./output";

pub(crate) static DEFAULT_ALLOW: LazyLock<Vec<String>> =
    LazyLock::new(|| DEFAULT_ALLOW_PATTERNS.iter().map(|p| p.to_string()).collect());

pub(crate) static DEFAULT_FORMATS: LazyLock<Vec<String>> =
    LazyLock::new(|| vec!["xlsx".to_string()]);

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(Parser))]
#[cfg_attr(feature = "cli", command(name = "stocksync"))]
#[cfg_attr(
    feature = "cli",
    command(about = "Lists products with distribution-center stock but no web stock")
)]
pub struct CliConfig {
    /// Spreadsheet export to analyse (xlsx, xlsm, xlsb, xls, ods or csv)
    pub input: Option<String>,

    /// TOML configuration file; command-line flags override its values
    #[cfg_attr(feature = "cli", arg(short, long))]
    pub config: Option<String>,

    /// Directory the report is written to [default: ./output]
    #[cfg_attr(feature = "cli", arg(long))]
    pub output_path: Option<String>,

    /// Header holding the product code [default: column E]
    #[cfg_attr(feature = "cli", arg(long))]
    pub id_column: Option<String>,

    /// Header holding the product name [default: the code column]
    #[cfg_attr(feature = "cli", arg(long))]
    pub name_column: Option<String>,

    #[cfg_attr(feature = "cli", arg(long))]
    pub cd_stock_column: Option<String>,

    #[cfg_attr(feature = "cli", arg(long))]
    pub web_stock_column: Option<String>,

    /// Header holding the trailing 30-day sales amount
    #[cfg_attr(feature = "cli", arg(long))]
    pub sales_column: Option<String>,

    /// Identifier text marking footer/total rows [default: totales]
    #[cfg_attr(feature = "cli", arg(long))]
    pub totals_marker: Option<String>,

    /// Case-insensitive patterns admitting rows that do not start with a digit [default: pardo]
    #[cfg_attr(feature = "cli", arg(long = "allow-pattern", value_delimiter = ','))]
    pub allow_patterns: Option<Vec<String>>,

    /// Report formats: xlsx, csv, json [default: xlsx]
    #[cfg_attr(feature = "cli", arg(long = "format", value_delimiter = ','))]
    pub formats: Option<Vec<String>>,

    /// Print the detected headers with their column letters and exit
    #[cfg_attr(feature = "cli", arg(long))]
    pub list_headers: bool,

    /// Request an executive summary from the text generation service
    #[cfg_attr(feature = "cli", arg(long))]
    pub summary: bool,

    #[cfg_attr(feature = "cli", arg(long))]
    pub summary_endpoint: Option<String>,

    #[cfg_attr(feature = "cli", arg(long))]
    pub summary_model: Option<String>,

    #[cfg_attr(feature = "cli", arg(long))]
    pub summary_language: Option<String>,

    #[cfg_attr(feature = "cli", arg(long))]
    pub summary_top_items: Option<usize>,

    #[cfg_attr(feature = "cli", arg(short, long, help = "Enable verbose output"))]
    pub verbose: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Log CPU and memory usage per phase"))]
    pub monitor: bool,

    #[cfg_attr(feature = "cli", arg(long, help = "Emit logs as JSON lines"))]
    pub log_json: bool,
}

impl CliConfig {
    pub fn summary_settings(&self) -> SummarySettings {
        SummarySettings {
            enabled: self.summary,
            endpoint: self
                .summary_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_SUMMARY_ENDPOINT.to_string()),
            model: self
                .summary_model
                .clone()
                .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
            language: self
                .summary_language
                .clone()
                .unwrap_or_else(|| DEFAULT_SUMMARY_LANGUAGE.to_string()),
            top_items: self.summary_top_items.unwrap_or(DEFAULT_TOP_ITEMS),
            api_key: api_key_from_env(),
        }
    }
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        self.input.as_deref().unwrap_or("")
    }

    fn output_path(&self) -> &str {
        self.output_path.as_deref().unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn mapping(&self) -> MappingSelection {
        MappingSelection {
            identifier: self.id_column.clone(),
            display_name: self.name_column.clone(),
            cd_stock: self.cd_stock_column.clone(),
            web_stock: self.web_stock_column.clone(),
            sales_amount: self.sales_column.clone(),
        }
    }

    fn totals_marker(&self) -> &str {
        self.totals_marker.as_deref().unwrap_or(DEFAULT_TOTALS_MARKER)
    }

    fn allow_patterns(&self) -> &[String] {
        self.allow_patterns.as_deref().unwrap_or(DEFAULT_ALLOW.as_slice())
    }

    fn output_formats(&self) -> &[String] {
        self.formats.as_deref().unwrap_or(DEFAULT_FORMATS.as_slice())
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)?;
        self.summary_settings().validate()
    }
}

/// Checks shared by every configuration source.
pub fn validate_provider<C: ConfigProvider>(config: &C) -> Result<()> {
    validate_non_empty_string("input", config.input_path())?;
    validate_file_extensions("input", &[config.input_path()], SPREADSHEET_EXTENSIONS)?;
    validate_path("output.path", config.output_path())?;
    validate_output_formats("output.formats", config.output_formats())?;
    validate_patterns("rows.allow_patterns", config.allow_patterns())?;
    Ok(())
}

/// Resolved settings for the advisory summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarySettings {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub language: String,
    pub top_items: usize,
    pub api_key: Option<String>,
}

impl Validate for SummarySettings {
    fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        validate_url("summary.endpoint", &self.endpoint)?;
        validate_non_empty_string("summary.model", &self.model)?;
        validate_positive_number("summary.top_items", self.top_items, 1)?;
        Ok(())
    }
}

/// `GEMINI_API_KEY`, then `API_KEY`.
pub fn api_key_from_env() -> Option<String> {
    ["GEMINI_API_KEY", "API_KEY"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}
