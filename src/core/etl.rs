use crate::core::Pipeline;
use crate::domain::model::ReportTotals;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub output_path: String,
    pub totals: ReportTotals,
    pub summary: Option<String>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        tracing::info!("Starting stock report");

        tracing::info!("Loading spreadsheet...");
        let sheet = self.pipeline.extract().await?;
        tracing::info!(
            "Loaded {} rows with {} columns",
            sheet.rows.len(),
            sheet.headers.len()
        );
        self.monitor.log_stats("Extract");

        tracing::info!("Aggregating stock...");
        let result = self.pipeline.transform(sheet).await?;
        tracing::info!(
            "{} items have CD stock but no web stock (CD stock {}, sales {:.2})",
            result.totals.item_count,
            result.totals.total_cd_stock,
            result.totals.total_sales_amount
        );
        self.monitor.log_stats("Transform");
        let totals = result.totals.clone();
        let summary = result.summary.clone();

        tracing::info!("Writing report...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Report saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(RunOutcome {
            output_path,
            totals,
            summary,
        })
    }
}
