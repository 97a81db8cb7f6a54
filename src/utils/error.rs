use thiserror::Error;

#[derive(Error, Debug)]
pub enum StockSyncError {
    #[error("Spreadsheet could not be read: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("Report workbook could not be written: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Missing column mapping for: {}", fields.join(", "))]
    MissingColumnMapping { fields: Vec<String> },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

pub type Result<T> = std::result::Result<T, StockSyncError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Output,
    Network,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl StockSyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SpreadsheetError(_) | Self::CsvError(_) => ErrorCategory::Input,
            Self::XlsxError(_) | Self::IoError(_) | Self::SerializationError(_) => {
                ErrorCategory::Output
            }
            Self::ApiError(_) => ErrorCategory::Network,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::MissingColumnMapping { .. } => ErrorCategory::Configuration,
            Self::ProcessingError { .. } | Self::ValidationError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ApiError(_) => ErrorSeverity::Medium,
            Self::IoError(_) | Self::XlsxError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::SpreadsheetError(_) | Self::CsvError(_) => {
                "Check that the file is a valid, uncorrupted spreadsheet export"
            }
            Self::XlsxError(_) | Self::IoError(_) => {
                "Check that the output directory exists and is writable"
            }
            Self::ApiError(_) => "Check network connectivity and retry",
            Self::SerializationError(_) => "Report this as a bug with the input file attached",
            Self::MissingColumnMapping { .. } => {
                "Run with --list-headers and pass --cd-stock-column, --web-stock-column and --sales-column"
            }
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Review the command-line flags or the TOML file",
            Self::ProcessingError { .. } | Self::ValidationError { .. } => {
                "Inspect the input rows with --verbose"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::SpreadsheetError(_) | Self::CsvError(_) => {
                "Error while processing the spreadsheet file.".to_string()
            }
            Self::MissingColumnMapping { .. } => {
                "Please select the CD stock, web stock and sales columns.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Failure of the advisory summary service. Never escapes the summary step.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("summary request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("summary service returned {status}: {body}")]
    Status { status: u16, body: String },
}
