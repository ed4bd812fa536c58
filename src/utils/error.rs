use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SheetError {
    #[error("No artwork found for '{key}': {reason}")]
    NotFound { key: String, reason: String },

    #[error("Catalog lookup failed for '{key}': {message}")]
    LookupError { key: String, message: String },

    #[error("Artwork fetch failed for '{key}': {message}")]
    FetchError { key: String, message: String },

    #[error("No input: {message}")]
    MissingInput { message: String },

    #[error("No cards provided")]
    EmptyInput,

    #[error("None of the {requested} requested cards could be resolved")]
    NoResolutions { requested: usize },

    #[error("Document rendering failed: {message}")]
    SinkFailure { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type Result<T> = std::result::Result<T, SheetError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Lookup,
    Fetch,
    Render,
    Config,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// 對外回傳的錯誤內容，永遠是結構化資料而不是二進位
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub error: &'static str,
    pub message: String,
}

impl SheetError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SheetError::MissingInput { .. }
            | SheetError::EmptyInput
            | SheetError::NoResolutions { .. } => ErrorCategory::Input,
            SheetError::NotFound { .. } | SheetError::LookupError { .. } => ErrorCategory::Lookup,
            SheetError::FetchError { .. } => ErrorCategory::Fetch,
            SheetError::SinkFailure { .. } => ErrorCategory::Render,
            SheetError::ConfigError { .. } | SheetError::InvalidConfigValue { .. } => {
                ErrorCategory::Config
            }
            SheetError::IoError(_)
            | SheetError::SerializationError(_)
            | SheetError::HttpClientError(_)
            | SheetError::Internal { .. } => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 單張卡片失敗只會被略過
            ErrorCategory::Lookup | ErrorCategory::Fetch => ErrorSeverity::Low,
            ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Config => ErrorSeverity::High,
            ErrorCategory::Render | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Stable machine-readable code for the failure egress.
    pub fn code(&self) -> &'static str {
        match self {
            SheetError::MissingInput { .. } => "no_input",
            SheetError::EmptyInput => "no_cards",
            SheetError::NoResolutions { .. } => "no_resolutions",
            SheetError::ConfigError { .. } | SheetError::InvalidConfigValue { .. } => "config",
            _ => "internal",
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: self.code(),
            message: self.user_friendly_message(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            SheetError::MissingInput { .. } => "No request body was provided".to_string(),
            SheetError::EmptyInput => "No cards were provided".to_string(),
            SheetError::NoResolutions { requested } => format!(
                "None of the {} requested cards could be found in the catalog",
                requested
            ),
            SheetError::NotFound { key, .. } => format!("Card '{}' was not found", key),
            SheetError::LookupError { key, .. } => {
                format!("The catalog could not be reached for '{}'", key)
            }
            SheetError::FetchError { key, .. } => {
                format!("The artwork for '{}' could not be downloaded", key)
            }
            SheetError::ConfigError { .. } | SheetError::InvalidConfigValue { .. } => {
                format!("Invalid configuration: {}", self)
            }
            SheetError::SinkFailure { .. } => "The PDF document could not be generated".to_string(),
            _ => "An internal error occurred".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SheetError::MissingInput { .. } => {
                "Send a JSON body such as {\"cards\": [{\"name\": \"...\", \"count\": 1}]}"
            }
            SheetError::EmptyInput => "Add at least one entry to the 'cards' list",
            SheetError::NoResolutions { .. } => {
                "Check the card names and that the catalog base URL is correct"
            }
            SheetError::NotFound { .. } => "Check the spelling of the card name",
            SheetError::LookupError { .. } | SheetError::FetchError { .. } => {
                "Check network connectivity or raise the timeout"
            }
            SheetError::ConfigError { .. } | SheetError::InvalidConfigValue { .. } => {
                "Fix the configuration file and run again"
            }
            SheetError::IoError(_) => "Check file paths and permissions",
            _ => "Run again with --verbose and report the log output",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_errors_have_stable_codes() {
        assert_eq!(SheetError::EmptyInput.code(), "no_cards");
        assert_eq!(
            SheetError::MissingInput {
                message: "empty body".to_string()
            }
            .code(),
            "no_input"
        );
        assert_eq!(SheetError::NoResolutions { requested: 3 }.code(), "no_resolutions");
        assert_eq!(
            SheetError::SinkFailure {
                message: "boom".to_string()
            }
            .code(),
            "internal"
        );
    }

    #[test]
    fn test_payload_serializes_code_and_message() {
        let payload = SheetError::NoResolutions { requested: 2 }.payload();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["error"], "no_resolutions");
        assert!(json["message"].as_str().unwrap().contains('2'));
    }

    #[test]
    fn test_per_key_failures_are_low_severity() {
        let not_found = SheetError::NotFound {
            key: "a".to_string(),
            reason: "404".to_string(),
        };
        let sink = SheetError::SinkFailure {
            message: "oom".to_string(),
        };

        assert_eq!(not_found.severity(), ErrorSeverity::Low);
        assert_eq!(sink.severity(), ErrorSeverity::Critical);
        assert_eq!(SheetError::EmptyInput.category(), ErrorCategory::Input);
    }
}
