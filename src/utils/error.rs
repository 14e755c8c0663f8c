use crate::domain::model::Stage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("Catalog source not found: {path}")]
    SourceNotFound { path: String },

    #[error("Malformed catalog source {path}: {message}")]
    MalformedSource { path: String, message: String },

    #[error("No options available at the {stage} stage")]
    EmptyOptionSet { stage: Stage },

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Source,
    Selection,
    Output,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl FinderError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FinderError::SourceNotFound { .. }
            | FinderError::MalformedSource { .. } => ErrorCategory::Source,
            FinderError::EmptyOptionSet { .. } => ErrorCategory::Selection,
            FinderError::ZipError(_)
            | FinderError::IoError(_)
            | FinderError::SerializationError(_) => ErrorCategory::Output,
            FinderError::ConfigError { .. }
            | FinderError::InvalidConfigValueError { .. }
            | FinderError::ValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 「沒有資料」是可恢復的狀態，不是系統錯誤
            FinderError::EmptyOptionSet { .. } => ErrorSeverity::Low,
            FinderError::ValidationError { .. } => ErrorSeverity::Medium,
            FinderError::ConfigError { .. }
            | FinderError::InvalidConfigValueError { .. }
            | FinderError::ZipError(_)
            | FinderError::IoError(_)
            | FinderError::SerializationError(_) => ErrorSeverity::High,
            FinderError::SourceNotFound { .. } | FinderError::MalformedSource { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    /// 載入期的錯誤：不產生任何 Catalog，必須在篩選之前中止
    pub fn is_fatal_load_error(&self) -> bool {
        self.category() == ErrorCategory::Source
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FinderError::SourceNotFound { path } => {
                format!("The template catalog '{}' does not exist.", path)
            }
            FinderError::MalformedSource { path, message } => {
                format!("The template catalog '{}' could not be read: {}", path, message)
            }
            FinderError::EmptyOptionSet { stage } => {
                format!("No data available for {}.", stage.label())
            }
            FinderError::ZipError(e) => format!("Could not build the download archive: {}", e),
            FinderError::IoError(e) => format!("A file operation failed: {}", e),
            FinderError::SerializationError(e) => format!("Could not render output: {}", e),
            FinderError::ConfigError { message } | FinderError::ValidationError { message } => {
                message.clone()
            }
            FinderError::InvalidConfigValueError {
                field,
                value,
                reason,
            } => format!("Setting '{}' has an invalid value '{}': {}", field, value, reason),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            FinderError::SourceNotFound { .. } => {
                "Check the --source path or the [source] path in the config file"
            }
            FinderError::MalformedSource { .. } => {
                "Make sure the file has a header row with the expected columns, then reload"
            }
            FinderError::EmptyOptionSet { .. } => {
                "Choose a different upstream selection or add rows for this combination"
            }
            FinderError::ZipError(_) | FinderError::IoError(_) => {
                "Check that the output directory exists and is writable"
            }
            FinderError::SerializationError(_) => "Retry without --json",
            FinderError::ConfigError { .. }
            | FinderError::InvalidConfigValueError { .. }
            | FinderError::ValidationError { .. } => "Fix the configuration and run again",
        }
    }
}

pub type Result<T> = std::result::Result<T, FinderError>;
