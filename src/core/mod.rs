pub mod aggregate;
pub mod etl;
pub mod normalize;

pub use crate::domain::model::{RawRow, Sheet, StockItem, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, Summarizer};
pub use crate::utils::error::Result;
