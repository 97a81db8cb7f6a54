// Adapters layer: concrete implementations for external systems
// (spreadsheet files, report files, filesystem, summary service).

pub mod exporter;
pub mod loader;
pub mod storage;
pub mod summary;
