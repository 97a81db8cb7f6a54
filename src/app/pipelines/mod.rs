pub mod replenishment;

pub use replenishment::ReplenishmentPipeline;
