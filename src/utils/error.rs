use thiserror::Error;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Point set for layer '{layer}' is not in a recognized reference system")]
    UnrecognizedSystem { layer: String },

    #[error("Reprojection failed: {message}")]
    Projection { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Classification,
    Projection,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl MapError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        MapError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn projection(message: impl Into<String>) -> Self {
        MapError::Projection {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            MapError::CsvError(_) | MapError::InvalidInput { .. } => ErrorCategory::Input,
            MapError::UnrecognizedSystem { .. } => ErrorCategory::Classification,
            MapError::Projection { .. } => ErrorCategory::Projection,
            MapError::ConfigError { .. }
            | MapError::ConfigValidationError { .. }
            | MapError::InvalidConfigValueError { .. }
            | MapError::MissingConfigError { .. } => ErrorCategory::Configuration,
            MapError::IoError(_) | MapError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 只有 reject 策略會產生分類錯誤，使用者明確要求失敗
            ErrorCategory::Classification | ErrorCategory::Input => ErrorSeverity::Medium,
            ErrorCategory::Projection | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            MapError::CsvError(_) => {
                "Check that the file is plain delimited text (space, comma, semicolon or tab)"
            }
            MapError::InvalidInput { .. } => {
                "Make sure every row holds numeric coordinates and the points format matches the file"
            }
            MapError::UnrecognizedSystem { .. } => {
                "Provide coordinates in GGRS87 / Greek Grid or use --on-unrecognized local"
            }
            MapError::Projection { .. } => {
                "Check that the coordinates lie inside the valid area of the source system"
            }
            MapError::ConfigError { .. }
            | MapError::ConfigValidationError { .. }
            | MapError::InvalidConfigValueError { .. }
            | MapError::MissingConfigError { .. } => {
                "Review the configuration file and command line arguments"
            }
            MapError::IoError(_) => "Check that the path exists and is readable/writable",
            MapError::SerializationError(_) => "Report this as a bug; the map snapshot could not be encoded",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("The point file could not be read: {}", self),
            ErrorCategory::Classification => format!("Nothing to draw: {}", self),
            ErrorCategory::Projection => format!("The points could not be placed on the map: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_follows_category() {
        let err = MapError::UnrecognizedSystem {
            layer: "reference_points".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Classification);
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        let err = MapError::invalid_input("row 3: 'abc' is not a number");
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().contains("row 3"));

        let err = MapError::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
