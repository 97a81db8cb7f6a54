use crate::domain::model::{MappingSelection, Sheet, StockItem, TransformResult};
use crate::utils::error::{Result, ServiceError};
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn mapping(&self) -> MappingSelection;
    fn totals_marker(&self) -> &str;
    fn allow_patterns(&self) -> &[String];
    fn output_formats(&self) -> &[String];
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Sheet>;
    async fn transform(&self, sheet: Sheet) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}

/// Optional advisory text about a finished report.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, items: &[StockItem]) -> std::result::Result<String, ServiceError>;
}
