use crate::adapters::exporter::{
    report_file_name, write_csv_report, write_json_report, write_xlsx_report,
};
use crate::adapters::loader::load_spreadsheet;
use crate::adapters::summary::advisory_summary;
use crate::core::aggregate::{filter_and_sort_stock, RowRules};
use crate::core::{ConfigProvider, Pipeline, Sheet, Storage, Summarizer, TransformResult};
use crate::domain::model::ReportTotals;
use crate::utils::error::{Result, StockSyncError};
use std::sync::Arc;

pub const SUMMARY_FILE_NAME: &str = "summary.md";

/// Spreadsheet in, replenishment report out.
pub struct ReplenishmentPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    rules: RowRules,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl<S: Storage, C: ConfigProvider> ReplenishmentPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let rules = RowRules::new(config.totals_marker(), config.allow_patterns())?;
        Ok(Self {
            storage,
            config,
            rules,
            summarizer: None,
        })
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    fn output_file(&self, file_name: &str) -> String {
        format!(
            "{}/{}",
            self.config.output_path().trim_end_matches('/'),
            file_name
        )
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ReplenishmentPipeline<S, C> {
    async fn extract(&self) -> Result<Sheet> {
        let input = self.config.input_path();
        tracing::debug!("Reading spreadsheet: {}", input);

        let data = self.storage.read_file(input).await?;
        let sheet = load_spreadsheet(input, data)?;

        if sheet.headers.is_empty() {
            return Err(StockSyncError::ProcessingError {
                message: format!("'{}' has no header row", input),
            });
        }
        Ok(sheet)
    }

    async fn transform(&self, sheet: Sheet) -> Result<TransformResult> {
        let mapping = self.config.mapping().resolve(&sheet.headers)?;
        tracing::debug!("Column mapping: {:?}", mapping);

        for column in [
            &mapping.identifier,
            &mapping.display_name,
            &mapping.cd_stock,
            &mapping.web_stock,
            &mapping.sales_amount,
        ] {
            if !sheet.headers.contains(column) {
                tracing::warn!("⚠️ Column '{}' not found in the spreadsheet", column);
            }
        }

        let items = filter_and_sort_stock(&sheet.rows, &mapping, &self.rules);
        let totals = ReportTotals::from_items(&items);

        let summary = match &self.summarizer {
            Some(summarizer) if !items.is_empty() => {
                tracing::info!("Requesting advisory summary...");
                Some(advisory_summary(summarizer.as_ref(), &items).await)
            }
            _ => None,
        };

        Ok(TransformResult {
            items,
            totals,
            rows_read: sheet.rows.len(),
            summary,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let mut written = Vec::new();

        for format in self.config.output_formats() {
            let data = match format.as_str() {
                "xlsx" => write_xlsx_report(&result.items)?,
                "csv" => write_csv_report(&result.items)?,
                "json" => write_json_report(&result.items, &result.totals)?,
                other => {
                    return Err(StockSyncError::InvalidConfigValueError {
                        field: "output.formats".to_string(),
                        value: other.to_string(),
                        reason: "Unsupported format".to_string(),
                    })
                }
            };

            let path = self.output_file(&report_file_name(format));
            tracing::debug!("Writing {} report ({} bytes) to {}", format, data.len(), path);
            self.storage.write_file(&path, &data).await?;
            written.push(path);
        }

        if let Some(summary) = &result.summary {
            let path = self.output_file(SUMMARY_FILE_NAME);
            self.storage.write_file(&path, summary.as_bytes()).await?;
            tracing::debug!("Summary saved to {}", path);
        }

        written
            .into_iter()
            .next()
            .ok_or_else(|| StockSyncError::ConfigError {
                message: "No output format configured".to_string(),
            })
    }
}
