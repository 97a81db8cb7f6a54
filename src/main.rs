use clap::Parser;
use stocksync::adapters::loader::load_spreadsheet;
use stocksync::config::SummarySettings;
use stocksync::core::{ConfigProvider, Storage, Summarizer};
use stocksync::utils::error::ErrorSeverity;
use stocksync::utils::{logger, validation::Validate};
use stocksync::{
    CliConfig, EtlEngine, GeminiSummarizer, LocalStorage, ReplenishmentPipeline, StockSyncError,
    TomlConfig,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting stocksync");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let exit_code = match cli.config.clone() {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match TomlConfig::from_file(&path) {
                Ok(mut config) => {
                    config.apply_cli_overrides(&cli);
                    let summary = config.summary_settings();
                    let monitor = config.monitoring_enabled();
                    run(config, summary, cli.list_headers, monitor).await
                }
                Err(e) => {
                    eprintln!("❌ Failed to load config file '{}': {}", path, e);
                    eprintln!("💡 Make sure the file exists and is valid TOML format");
                    1
                }
            }
        }
        None => {
            let summary = cli.summary_settings();
            let monitor = cli.monitor;
            let list_headers = cli.list_headers;
            run(cli, summary, list_headers, monitor).await
        }
    };

    if exit_code > 0 {
        std::process::exit(exit_code);
    }
}

async fn run<C>(config: C, summary: SummarySettings, list_headers: bool, monitor: bool) -> i32
where
    C: ConfigProvider + Validate,
{
    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        return 1;
    }

    let storage = LocalStorage::default();

    if list_headers {
        return match print_headers(&storage, config.input_path()).await {
            Ok(()) => 0,
            Err(e) => report_error(&e),
        };
    }

    let pipeline = match ReplenishmentPipeline::new(storage, config) {
        Ok(pipeline) => pipeline,
        Err(e) => return report_error(&e),
    };
    let pipeline = match build_summarizer(&summary) {
        Some(summarizer) => pipeline.with_summarizer(summarizer),
        None => pipeline,
    };

    if monitor {
        tracing::info!("🔍 System monitoring enabled");
    }
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor);

    match engine.run().await {
        Ok(outcome) => {
            tracing::info!("✅ Report completed successfully!");
            println!("✅ Report completed successfully!");
            println!("📦 Items detected: {}", outcome.totals.item_count);
            println!("💰 Lost sales (30d): {:.2}", outcome.totals.total_sales_amount);
            println!("🏭 Total CD stock: {}", outcome.totals.total_cd_stock);
            println!("📁 Output saved to: {}", outcome.output_path);
            if let Some(summary) = outcome.summary {
                println!("\n{}", summary);
            }
            0
        }
        Err(e) => report_error(&e),
    }
}

fn build_summarizer(settings: &SummarySettings) -> Option<Arc<dyn Summarizer>> {
    if !settings.enabled {
        return None;
    }
    let Some(api_key) = settings.api_key.as_deref() else {
        tracing::warn!("⚠️ No API key found (GEMINI_API_KEY / API_KEY); summary disabled");
        return None;
    };

    let summarizer = GeminiSummarizer::new(&settings.endpoint, &settings.model, api_key)
        .with_language(&settings.language)
        .with_top_items(settings.top_items);
    Some(Arc::new(summarizer))
}

async fn print_headers(storage: &LocalStorage, input: &str) -> Result<(), StockSyncError> {
    let data = storage.read_file(input).await?;
    let sheet = load_spreadsheet(input, data)?;
    for label in sheet.column_labels() {
        println!("{}", label);
    }
    Ok(())
}

fn report_error(e: &StockSyncError) -> i32 {
    tracing::error!(
        "❌ Report failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
