use crate::adapters::summary::{
    DEFAULT_SUMMARY_ENDPOINT, DEFAULT_SUMMARY_LANGUAGE, DEFAULT_SUMMARY_MODEL, DEFAULT_TOP_ITEMS,
};
use crate::config::{
    api_key_from_env, validate_provider, CliConfig, SummarySettings, DEFAULT_ALLOW,
    DEFAULT_FORMATS, DEFAULT_OUTPUT_PATH,
};
use crate::core::aggregate::DEFAULT_TOTALS_MARKER;
use crate::core::ConfigProvider;
use crate::domain::model::MappingSelection;
use crate::utils::error::{Result, StockSyncError};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub mapping: MappingSelection,
    #[serde(default)]
    pub rows: RowsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub summary: Option<SummaryConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowsConfig {
    #[serde(default = "default_totals_marker")]
    pub totals_marker: String,
    #[serde(default = "default_allow_patterns")]
    pub allow_patterns: Vec<String>,
}

impl Default for RowsConfig {
    fn default() -> Self {
        Self {
            totals_marker: default_totals_marker(),
            allow_patterns: default_allow_patterns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_formats")]
    pub formats: Vec<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            formats: default_formats(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SummaryConfig {
    #[serde(default)]
    pub enabled: bool,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub language: Option<String>,
    pub api_key: Option<String>,
    pub top_items: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

fn default_totals_marker() -> String {
    DEFAULT_TOTALS_MARKER.to_string()
}

fn default_allow_patterns() -> Vec<String> {
    DEFAULT_ALLOW.clone()
}

fn default_output_path() -> String {
    DEFAULT_OUTPUT_PATH.to_string()
}

fn default_formats() -> Vec<String> {
    DEFAULT_FORMATS.clone()
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| StockSyncError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEMINI_API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// Command-line values win over the file.
    pub fn apply_cli_overrides(&mut self, cli: &CliConfig) {
        if let Some(input) = &cli.input {
            self.input.path = input.clone();
        }
        if let Some(output_path) = &cli.output_path {
            self.output.path = output_path.clone();
        }

        let overrides = [
            (&mut self.mapping.identifier, &cli.id_column),
            (&mut self.mapping.display_name, &cli.name_column),
            (&mut self.mapping.cd_stock, &cli.cd_stock_column),
            (&mut self.mapping.web_stock, &cli.web_stock_column),
            (&mut self.mapping.sales_amount, &cli.sales_column),
        ];
        for (target, value) in overrides {
            if value.is_some() {
                *target = value.clone();
            }
        }

        if let Some(marker) = &cli.totals_marker {
            self.rows.totals_marker = marker.clone();
        }
        if let Some(patterns) = &cli.allow_patterns {
            self.rows.allow_patterns = patterns.clone();
        }
        if let Some(formats) = &cli.formats {
            self.output.formats = formats.clone();
        }

        let cli_touches_summary = cli.summary
            || cli.summary_endpoint.is_some()
            || cli.summary_model.is_some()
            || cli.summary_language.is_some()
            || cli.summary_top_items.is_some();
        if cli_touches_summary {
            let summary = self.summary.get_or_insert_with(SummaryConfig::default);
            summary.enabled |= cli.summary;
            if cli.summary_endpoint.is_some() {
                summary.endpoint = cli.summary_endpoint.clone();
            }
            if cli.summary_model.is_some() {
                summary.model = cli.summary_model.clone();
            }
            if cli.summary_language.is_some() {
                summary.language = cli.summary_language.clone();
            }
            if cli.summary_top_items.is_some() {
                summary.top_items = cli.summary_top_items;
            }
        }

        if cli.monitor {
            self.monitoring = Some(MonitoringConfig { enabled: true });
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn summary_settings(&self) -> SummarySettings {
        let summary = self.summary.clone().unwrap_or_default();
        // Unset `${VAR}` placeholders survive substitution; treat them as absent.
        let api_key = summary
            .api_key
            .filter(|key| !key.trim().is_empty() && !key.contains("${"))
            .or_else(api_key_from_env);

        SummarySettings {
            enabled: summary.enabled,
            endpoint: summary
                .endpoint
                .unwrap_or_else(|| DEFAULT_SUMMARY_ENDPOINT.to_string()),
            model: summary
                .model
                .unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
            language: summary
                .language
                .unwrap_or_else(|| DEFAULT_SUMMARY_LANGUAGE.to_string()),
            top_items: summary.top_items.unwrap_or(DEFAULT_TOP_ITEMS),
            api_key,
        }
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn mapping(&self) -> MappingSelection {
        self.mapping.clone()
    }

    fn totals_marker(&self) -> &str {
        &self.rows.totals_marker
    }

    fn allow_patterns(&self) -> &[String] {
        &self.rows.allow_patterns
    }

    fn output_formats(&self) -> &[String] {
        &self.output.formats
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_provider(self)?;
        self.summary_settings().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[input]
path = "stock.xlsx"

[mapping]
identifier = "Artículo"
cd_stock = "Stock CD"
web_stock = "Stock Web"
sales_amount = "Ventas 30d"

[rows]
totals_marker = "total general"
allow_patterns = ["pardo", "^acme"]

[output]
path = "./reports"
formats = ["xlsx", "csv"]

[summary]
enabled = true
language = "English"
top_items = 5

[monitoring]
enabled = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.input_path(), "stock.xlsx");
        assert_eq!(config.mapping().identifier.as_deref(), Some("Artículo"));
        assert!(config.mapping().display_name.is_none());
        assert_eq!(config.totals_marker(), "total general");
        assert_eq!(config.allow_patterns().len(), 2);
        assert_eq!(config.output_path(), "./reports");
        assert!(config.monitoring_enabled());

        let summary = config.summary_settings();
        assert!(summary.enabled);
        assert_eq!(summary.language, "English");
        assert_eq!(summary.top_items, 5);
        assert_eq!(summary.model, DEFAULT_SUMMARY_MODEL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("[input]\npath = \"export.csv\"\n").unwrap();

        assert_eq!(config.totals_marker(), "totales");
        assert_eq!(config.allow_patterns(), &["pardo".to_string()]);
        assert_eq!(config.output_formats(), &["xlsx".to_string()]);
        assert_eq!(config.output_path(), DEFAULT_OUTPUT_PATH);
        assert!(!config.summary_settings().enabled);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("STOCKSYNC_TEST_INPUT", "from-env.xlsx");

        let config =
            TomlConfig::from_toml_str("[input]\npath = \"${STOCKSYNC_TEST_INPUT}\"\n").unwrap();
        assert_eq!(config.input_path(), "from-env.xlsx");

        std::env::remove_var("STOCKSYNC_TEST_INPUT");
    }

    #[test]
    fn test_unset_api_key_placeholder_is_ignored() {
        let config = TomlConfig::from_toml_str(
            "[summary]\nenabled = true\napi_key = \"${STOCKSYNC_TEST_UNSET_KEY}\"\n",
        )
        .unwrap();
        assert_ne!(
            config.summary_settings().api_key.as_deref(),
            Some("${STOCKSYNC_TEST_UNSET_KEY}")
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = TomlConfig::from_toml_str(
            "[input]\npath = \"stock.xlsx\"\n[output]\nformats = [\"pdf\"]\n",
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str(
            "[input]\npath = \"stock.xlsx\"\n[rows]\nallow_patterns = [\"(\"]\n",
        )
        .unwrap();
        assert!(config.validate().is_err());

        assert!(TomlConfig::from_toml_str("[input\n").is_err());
    }

    #[test]
    fn test_cli_overrides_file_values() {
        let mut config = TomlConfig::from_toml_str(
            "[input]\npath = \"a.xlsx\"\n[mapping]\ncd_stock = \"CD\"\nweb_stock = \"Web\"\n",
        )
        .unwrap();
        let cli = CliConfig {
            input: Some("b.xlsx".to_string()),
            web_stock_column: Some("Stock Web".to_string()),
            formats: Some(vec!["json".to_string()]),
            summary: true,
            ..Default::default()
        };

        config.apply_cli_overrides(&cli);

        assert_eq!(config.input_path(), "b.xlsx");
        assert_eq!(config.mapping().cd_stock.as_deref(), Some("CD"));
        assert_eq!(config.mapping().web_stock.as_deref(), Some("Stock Web"));
        assert_eq!(config.output_formats(), &["json".to_string()]);
        assert!(config.summary_settings().enabled);
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[input]\npath = \"file.ods\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input_path(), "file.ods");
    }
}
